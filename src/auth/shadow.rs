//! Shadow database backend
//!
//! Verifies SHA-crypt hashes straight from the shadow file. There is no
//! privileged session context, so opening, closing and environment injection
//! are no-ops.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::audit::{self, AuditLog, FailedLogin};
use super::{gather_credentials, AuthBackend, CredentialPrompt, Credentials, Identity};
use crate::config::AuthConfig;
use crate::desktop::SessionType;
use crate::error::{LoginError, Result};
use crate::session::SessionEnv;

/// Reduced backend reading the shadow file
pub struct ShadowBackend {
    shadow_path: PathBuf,
    prompt: Box<dyn CredentialPrompt>,
    audit: Box<dyn AuditLog>,
    tty: String,
    authenticated: bool,
}

impl ShadowBackend {
    /// Create new shadow backend
    pub fn new(
        shadow_path: impl Into<PathBuf>,
        prompt: Box<dyn CredentialPrompt>,
        audit: Box<dyn AuditLog>,
        tty: &str,
    ) -> Self {
        Self {
            shadow_path: shadow_path.into(),
            prompt,
            audit,
            tty: tty.to_string(),
            authenticated: false,
        }
    }

    fn verify(&self, credentials: &Credentials) -> bool {
        match find_password_hash(&self.shadow_path, credentials.principal()) {
            Ok(Some(hash)) => verify_crypt_hash(credentials.secret(), &hash),
            Ok(None) => {
                debug!("No shadow entry for {}", credentials.principal());
                false
            }
            Err(e) => {
                warn!("Failed to read {:?}: {}", self.shadow_path, e);
                false
            }
        }
    }
}

impl AuthBackend for ShadowBackend {
    fn name(&self) -> &'static str {
        "shadow"
    }

    fn authenticate(&mut self, config: &AuthConfig) -> Result<Identity> {
        self.authenticated = false;

        let identity = if let Some(user) = config.autologin_user() {
            info!("Auto-login for {}", user);
            Identity::lookup(user)?
        } else {
            let credentials = gather_credentials(config, self.prompt.as_mut())?;
            if !self.verify(&credentials) {
                audit::record(
                    self.audit.as_ref(),
                    &FailedLogin::new(credentials.principal(), &self.tty),
                );
                return Err(LoginError::auth_failure());
            }
            Identity::lookup(credentials.principal())?
        };

        info!("User {} (UID: {}) authenticated", identity.username, identity.uid);
        self.authenticated = true;
        Ok(identity)
    }

    fn open_session(&mut self, session_type: SessionType) -> Result<()> {
        if !self.authenticated {
            return Err(LoginError::SessionOpenFailure {
                reason: "no authenticated user".to_string(),
            });
        }
        debug!("Shadow backend has no session context to open for {}", session_type);
        Ok(())
    }

    fn close_session(&mut self) {
        self.authenticated = false;
    }

    fn inject_environment(&self, _identity: &Identity, _env: &mut SessionEnv) {}
}

/// Password field of `user`'s shadow entry
fn find_password_hash(path: &Path, user: &str) -> io::Result<Option<Zeroizing<String>>> {
    let content = Zeroizing::new(std::fs::read_to_string(path)?);

    Ok(content.lines().find_map(|line| {
        let mut fields = line.splitn(3, ':');
        match (fields.next(), fields.next()) {
            (Some(name), Some(hash)) if name == user => Some(Zeroizing::new(hash.to_string())),
            _ => None,
        }
    }))
}

/// Check `secret` against a `$6$` or `$5$` crypt string.
///
/// Locked (`!`, `*`), empty and other schemes never verify.
pub(crate) fn verify_crypt_hash(secret: &[u8], hash: &str) -> bool {
    let Ok(secret) = std::str::from_utf8(secret) else {
        return false;
    };

    if hash.starts_with("$6$") {
        sha_crypt::sha512_check(secret, hash).is_ok()
    } else if hash.starts_with("$5$") {
        sha_crypt::sha256_check(secret, hash).is_ok()
    } else {
        debug!("Password entry is locked or uses an unsupported scheme");
        false
    }
}
