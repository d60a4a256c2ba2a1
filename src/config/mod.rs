//! Configuration management
//!
//! Loads the TOML configuration, validates it, and applies CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod types;

pub use types::{AuthConfig, BackendKind, DesktopConfig, EnvVar, SessionConfig};

/// Default configuration location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/lamco-login/config.toml";

/// Login manager configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginConfig {
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Desktop catalog configuration
    #[serde(default)]
    pub desktop: DesktopConfig,
}

impl LoginConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.auth.pam_service.trim().is_empty() {
            anyhow::bail!("Invalid config: auth.pam_service must not be empty");
        }

        if self.auth.autologin_pam_service.trim().is_empty() {
            anyhow::bail!("Invalid config: auth.autologin_pam_service must not be empty");
        }

        if self.auth.autologin && self.auth.autologin_user().is_none() {
            anyhow::bail!("Invalid config: auth.autologin requires auth.default_user");
        }

        if matches!(self.auth.autologin_session.as_deref(), Some(s) if s.trim().is_empty()) {
            anyhow::bail!("Invalid config: auth.autologin_session must not be empty when set");
        }

        if self.session.tty == Some(0) {
            anyhow::bail!("Invalid config: session.tty must be greater than 0");
        }

        for script in [
            &self.session.display_start_script,
            &self.session.display_stop_script,
        ]
        .into_iter()
        .flatten()
        {
            if !script.exists() {
                tracing::warn!("Display script not found: {:?}", script);
            }
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(
        mut self,
        tty: Option<u32>,
        backend: Option<BackendKind>,
        no_autologin: bool,
    ) -> Self {
        if tty.is_some() {
            self.session.tty = tty;
        }

        if let Some(backend) = backend {
            self.auth.backend = backend;
        }

        if no_autologin {
            self.auth.autologin = false;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_defaults() {
        let config = LoginConfig::default();
        assert_eq!(config.auth.backend, BackendKind::Pam);
        assert_eq!(config.auth.autologin_max_retry, 2);
        assert_eq!(config.auth.shadow_path, PathBuf::from("/etc/shadow"));
        assert!(config.desktop.tty_shell);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_file() {
        let config = LoginConfig::from_toml(
            r#"
            [auth]
            backend = "shadow"
            default_user = "alice"
            autologin = true
            autologin_session = "sway"
            autologin_max_retry = -1

            [session]
            tty = 3
            environment = [{ name = "QT_QPA_PLATFORMTHEME", value = "gtk3" }]

            [desktop]
            exclude = ["gnome-classic"]
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.backend, BackendKind::Shadow);
        assert_eq!(config.auth.autologin_user(), Some("alice"));
        assert_eq!(config.auth.autologin_session(), Some("sway"));
        assert_eq!(config.auth.autologin_max_retry, -1);
        assert_eq!(config.auth.pam_service, "lamco-login");
        assert_eq!(config.session.tty, Some(3));
        assert_eq!(config.session.environment[0].value, "gtk3");
        assert_eq!(config.desktop.exclude, vec!["gnome-classic".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_autologin_requires_user() {
        let mut config = LoginConfig::default();
        config.auth.autologin = true;
        assert!(config.validate().is_err());

        config.auth.default_user = Some("alice".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_backend() {
        assert!(LoginConfig::from_toml("[auth]\nbackend = \"ldap\"\n").is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = LoginConfig::default();
        config.auth.autologin = true;
        config.auth.default_user = Some("alice".to_string());

        let config = config.with_overrides(Some(4), Some(BackendKind::Shadow), true);
        assert_eq!(config.session.tty, Some(4));
        assert_eq!(config.auth.backend, BackendKind::Shadow);
        assert_eq!(config.auth.autologin_user(), None);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\nlang = \"de_DE.UTF-8\"\n").unwrap();

        let config = LoginConfig::load(&path).unwrap();
        assert_eq!(config.session.lang.as_deref(), Some("de_DE.UTF-8"));

        assert!(LoginConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
