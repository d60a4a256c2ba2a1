//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which credential backend to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// System PAM stack
    Pam,
    /// Direct shadow database verification
    Shadow,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pam => write!(f, "pam"),
            Self::Shadow => write!(f, "shadow"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pam" => Ok(Self::Pam),
            "shadow" => Ok(Self::Shadow),
            other => Err(format!("unknown auth backend '{other}' (expected pam or shadow)")),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Credential backend
    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    /// PAM service for interactive logins
    #[serde(default = "default_pam_service")]
    pub pam_service: String,

    /// PAM service for password-less auto-login
    #[serde(default = "default_autologin_pam_service")]
    pub autologin_pam_service: String,

    /// Principal announced at the prompt, and the auto-login account
    #[serde(default)]
    pub default_user: Option<String>,

    /// Log `default_user` in without a password
    #[serde(default)]
    pub autologin: bool,

    /// Desktop entry name launched on auto-login
    #[serde(default)]
    pub autologin_session: Option<String>,

    /// Auto-login attempts allowed inside the retry window (negative = unlimited)
    #[serde(default = "default_autologin_max_retry")]
    pub autologin_max_retry: i32,

    /// Shadow database read by the shadow backend
    #[serde(default = "default_shadow_path")]
    pub shadow_path: PathBuf,

    /// Failed-login audit file
    #[serde(default = "default_audit_log")]
    pub audit_log: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            pam_service: default_pam_service(),
            autologin_pam_service: default_autologin_pam_service(),
            default_user: None,
            autologin: false,
            autologin_session: None,
            autologin_max_retry: default_autologin_max_retry(),
            shadow_path: default_shadow_path(),
            audit_log: default_audit_log(),
        }
    }
}

impl AuthConfig {
    /// Auto-login user, when auto-login is switched on
    pub fn autologin_user(&self) -> Option<&str> {
        if self.autologin {
            self.default_user.as_deref().filter(|u| !u.is_empty())
        } else {
            None
        }
    }

    /// Configured auto-login session, ignoring empty names
    pub fn autologin_session(&self) -> Option<&str> {
        self.autologin_session.as_deref().filter(|s| !s.is_empty())
    }
}

fn default_backend() -> BackendKind {
    BackendKind::Pam
}

fn default_pam_service() -> String {
    "lamco-login".to_string()
}

fn default_autologin_pam_service() -> String {
    "lamco-login-autologin".to_string()
}

fn default_autologin_max_retry() -> i32 {
    2
}

fn default_shadow_path() -> PathBuf {
    PathBuf::from("/etc/shadow")
}

fn default_audit_log() -> Option<PathBuf> {
    Some(PathBuf::from("/var/log/lamco-login/failed-logins.log"))
}

/// Session configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Virtual terminal number; detected from stdin when unset
    #[serde(default)]
    pub tty: Option<u32>,

    /// Value for LANG in the session
    #[serde(default)]
    pub lang: Option<String>,

    /// Script run before the session context opens
    #[serde(default)]
    pub display_start_script: Option<PathBuf>,

    /// Script run after the session context closes
    #[serde(default)]
    pub display_stop_script: Option<PathBuf>,

    /// Extra session environment
    #[serde(default)]
    pub environment: Vec<EnvVar>,
}

/// Environment variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name
    pub name: String,
    /// Variable value
    pub value: String,
}

/// Desktop catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesktopConfig {
    /// X11 session entries
    #[serde(default = "default_x11_sessions_dir")]
    pub x11_sessions_dir: PathBuf,

    /// Wayland session entries
    #[serde(default = "default_wayland_sessions_dir")]
    pub wayland_sessions_dir: PathBuf,

    /// Entry names hidden from the menu
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Offer a plain login shell
    #[serde(default = "default_true")]
    pub tty_shell: bool,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            x11_sessions_dir: default_x11_sessions_dir(),
            wayland_sessions_dir: default_wayland_sessions_dir(),
            exclude: Vec::new(),
            tty_shell: default_true(),
        }
    }
}

fn default_x11_sessions_dir() -> PathBuf {
    PathBuf::from("/usr/share/xsessions")
}

fn default_wayland_sessions_dir() -> PathBuf {
    PathBuf::from("/usr/share/wayland-sessions")
}

fn default_true() -> bool {
    true
}
