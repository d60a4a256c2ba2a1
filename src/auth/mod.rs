//! Authentication
//!
//! The [`AuthBackend`] trait is the seam between the login lifecycle and the
//! credential store. Two implementations exist:
//!
//! - [`PamBackend`]: the system PAM stack (feature `pam-auth`)
//! - [`ShadowBackend`]: direct verification against the shadow database
//!
//! Which one runs is decided once at startup by [`create_backend`].

use std::fmt;

use zeroize::Zeroizing;

use crate::config::{AuthConfig, BackendKind, LoginConfig};
use crate::desktop::SessionType;
use crate::error::{LoginError, Result};
use crate::session::SessionEnv;

pub mod audit;
pub mod context;
pub mod identity;
#[cfg(feature = "pam-auth")]
pub mod pam;
pub mod prompt;
pub mod shadow;

pub use audit::{audit_log_from_config, AuditLog, FailedLogin, FileAuditLog, NullAuditLog};
pub use context::AuthContext;
pub use identity::Identity;
#[cfg(feature = "pam-auth")]
pub use pam::PamBackend;
pub use prompt::{CredentialPrompt, TerminalPrompt};
pub use shadow::ShadowBackend;

/// Credential verification and privileged session context
#[cfg_attr(test, mockall::automock)]
pub trait AuthBackend {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Verify credentials (or take the auto-login shortcut) and resolve the identity
    fn authenticate(&mut self, config: &AuthConfig) -> Result<Identity>;

    /// Establish the privileged session context; needs a prior successful
    /// [`authenticate`](Self::authenticate) on this instance
    fn open_session(&mut self, session_type: SessionType) -> Result<()>;

    /// Release the privileged context. Idempotent, and safe without a prior
    /// [`open_session`](Self::open_session).
    fn close_session(&mut self);

    /// Add variables exported by the backend to the session environment
    fn inject_environment(&self, identity: &Identity, env: &mut SessionEnv);
}

/// Principal and secret for one attempt. The secret is wiped on drop.
pub struct Credentials {
    principal: String,
    secret: Zeroizing<Vec<u8>>,
}

impl Credentials {
    /// Bundle a principal and secret
    pub fn new(principal: impl Into<String>, secret: Zeroizing<Vec<u8>>) -> Self {
        Self {
            principal: principal.into(),
            secret,
        }
    }

    /// Login name
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Raw secret bytes
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// Secret as UTF-8, when it is valid UTF-8
    pub fn secret_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.secret).ok()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("principal", &self.principal)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Collect principal and secret through `prompt`.
///
/// A configured `default_user` is announced instead of asked for.
pub fn gather_credentials(
    config: &AuthConfig,
    prompt: &mut dyn CredentialPrompt,
) -> Result<Credentials> {
    let principal = match config.default_user.as_deref().filter(|u| !u.is_empty()) {
        Some(user) => {
            prompt.announce_principal(user).map_err(prompt_failure)?;
            user.to_string()
        }
        None => prompt.read_principal().map_err(prompt_failure)?,
    };

    let principal = principal.trim().to_string();
    if principal.is_empty() {
        return Err(LoginError::AuthFailure {
            reason: "empty principal".to_string(),
        });
    }

    let secret = prompt.read_secret().map_err(prompt_failure)?;

    Ok(Credentials::new(principal, secret))
}

fn prompt_failure(e: std::io::Error) -> LoginError {
    LoginError::PromptClosed {
        reason: format!("prompt failed: {e}"),
    }
}

/// Build the backend named by `auth.backend`
pub fn create_backend(
    config: &LoginConfig,
    prompt: Box<dyn CredentialPrompt>,
    audit: Box<dyn AuditLog>,
    tty: &str,
) -> anyhow::Result<Box<dyn AuthBackend>> {
    match config.auth.backend {
        #[cfg(feature = "pam-auth")]
        BackendKind::Pam => Ok(Box::new(PamBackend::new(
            &config.auth.pam_service,
            &config.auth.autologin_pam_service,
            prompt,
            audit,
            tty,
        ))),
        #[cfg(not(feature = "pam-auth"))]
        BackendKind::Pam => {
            drop((prompt, audit));
            anyhow::bail!(
                "PAM auth backend requested but PAM support is not compiled in \
                 (rebuild with --features pam-auth or set auth.backend = \"shadow\" in config)"
            )
        }
        BackendKind::Shadow => Ok(Box::new(ShadowBackend::new(
            &config.auth.shadow_path,
            prompt,
            audit,
            tty,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    struct Scripted {
        principals: VecDeque<String>,
        secret: &'static str,
        announced: Vec<String>,
    }

    impl CredentialPrompt for Scripted {
        fn announce_principal(&mut self, principal: &str) -> io::Result<()> {
            self.announced.push(principal.to_string());
            Ok(())
        }

        fn read_principal(&mut self) -> io::Result<String> {
            self.principals
                .pop_front()
                .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
        }

        fn read_secret(&mut self) -> io::Result<Zeroizing<Vec<u8>>> {
            Ok(Zeroizing::new(self.secret.as_bytes().to_vec()))
        }
    }

    fn scripted(principals: &[&str]) -> Scripted {
        Scripted {
            principals: principals.iter().map(|p| p.to_string()).collect(),
            secret: "hunter2",
            announced: Vec::new(),
        }
    }

    #[test]
    fn test_gather_reads_principal() {
        let mut prompt = scripted(&["  alice "]);
        let creds = gather_credentials(&AuthConfig::default(), &mut prompt).unwrap();
        assert_eq!(creds.principal(), "alice");
        assert_eq!(creds.secret_str(), Some("hunter2"));
        assert!(prompt.announced.is_empty());
    }

    #[test]
    fn test_gather_announces_default_user() {
        let config = AuthConfig {
            default_user: Some("bob".to_string()),
            ..AuthConfig::default()
        };
        let mut prompt = scripted(&[]);
        let creds = gather_credentials(&config, &mut prompt).unwrap();
        assert_eq!(creds.principal(), "bob");
        assert_eq!(prompt.announced, vec!["bob".to_string()]);
    }

    #[test]
    fn test_gather_rejects_empty_principal() {
        let mut prompt = scripted(&["   "]);
        assert!(matches!(
            gather_credentials(&AuthConfig::default(), &mut prompt),
            Err(LoginError::AuthFailure { .. })
        ));
    }

    #[test]
    fn test_gather_on_closed_input_is_prompt_closed() {
        let mut prompt = scripted(&[]);
        let err = gather_credentials(&AuthConfig::default(), &mut prompt).unwrap_err();
        assert!(matches!(err, LoginError::PromptClosed { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials::new("alice", Zeroizing::new(b"hunter2".to_vec()));
        let shown = format!("{:?}", creds);
        assert!(shown.contains("alice"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn test_create_shadow_backend() {
        let config = LoginConfig {
            auth: AuthConfig {
                backend: BackendKind::Shadow,
                ..AuthConfig::default()
            },
            ..LoginConfig::default()
        };
        let backend = create_backend(
            &config,
            Box::new(scripted(&[])),
            Box::new(NullAuditLog),
            "tty1",
        )
        .unwrap();
        assert_eq!(backend.name(), "shadow");
    }

    #[cfg(not(feature = "pam-auth"))]
    #[test]
    fn test_pam_without_feature_is_startup_error() {
        let err = create_backend(
            &LoginConfig::default(),
            Box::new(scripted(&[])),
            Box::new(NullAuditLog),
            "tty1",
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("not compiled in"));
    }
}
