//! PAM backend
//!
//! Authenticates through the configured PAM service and keeps the PAM
//! handle alive for the duration of the session. Dropping the handle closes
//! the PAM session.

use pam::{Authenticator, PasswordConv};
use tracing::{debug, info};

use super::audit::{self, AuditLog, FailedLogin};
use super::{gather_credentials, AuthBackend, CredentialPrompt, Identity};
use crate::config::AuthConfig;
use crate::desktop::SessionType;
use crate::error::{LoginError, Result};
use crate::session::SessionEnv;

/// Variables `pam_systemd` and friends export into the process environment
const EXPORTED_VARS: &[&str] = &[
    "XDG_SESSION_ID",
    "XDG_RUNTIME_DIR",
    "XDG_SEAT",
    "XDG_VTNR",
    "XDG_SESSION_CLASS",
];

/// Full backend delegating to the system PAM stack
pub struct PamBackend {
    service: String,
    autologin_service: String,
    prompt: Box<dyn CredentialPrompt>,
    audit: Box<dyn AuditLog>,
    tty: String,
    handle: Option<Authenticator<'static, PasswordConv>>,
}

impl PamBackend {
    /// Create new PAM backend
    pub fn new(
        service: &str,
        autologin_service: &str,
        prompt: Box<dyn CredentialPrompt>,
        audit: Box<dyn AuditLog>,
        tty: &str,
    ) -> Self {
        Self {
            service: service.to_string(),
            autologin_service: autologin_service.to_string(),
            prompt,
            audit,
            tty: tty.to_string(),
            handle: None,
        }
    }

    fn start(service: &str) -> Result<Authenticator<'static, PasswordConv>> {
        Authenticator::with_password(service).map_err(|e| LoginError::AuthFailure {
            reason: format!("failed to start PAM service {service}: {e:?}"),
        })
    }
}

/// The password half of a PAM transaction
trait PasswordExchange {
    /// Hand the principal and secret to the conversation
    fn offer(&mut self, principal: &str, secret: &str);

    /// Run the auth stack against what was offered
    fn verify(&mut self) -> bool;
}

impl PasswordExchange for Authenticator<'static, PasswordConv> {
    fn offer(&mut self, principal: &str, secret: &str) {
        self.get_handler().set_credentials(principal, secret);
    }

    fn verify(&mut self) -> bool {
        match self.authenticate() {
            Ok(()) => true,
            Err(e) => {
                debug!("PAM authentication failed: {:?}", e);
                false
            }
        }
    }
}

/// Verify `secret`, then blank the conversation's copy of it whatever the
/// outcome. The copy itself is a plain `String` owned by the pam crate.
fn exchange_password(exchange: &mut impl PasswordExchange, principal: &str, secret: &str) -> bool {
    exchange.offer(principal, secret);
    let verified = exchange.verify();
    exchange.offer(principal, "");
    verified
}

impl AuthBackend for PamBackend {
    fn name(&self) -> &'static str {
        "pam"
    }

    fn authenticate(&mut self, config: &AuthConfig) -> Result<Identity> {
        self.handle = None;

        if let Some(user) = config.autologin_user() {
            info!("Auto-login for {} via PAM service {}", user, self.autologin_service);

            let mut handle = Self::start(&self.autologin_service)?;
            handle.get_handler().set_credentials(user, "");
            handle.authenticate().map_err(|e| LoginError::AuthFailure {
                reason: format!("auto-login rejected: {e:?}"),
            })?;

            let identity = Identity::lookup(user)?;
            self.handle = Some(handle);
            return Ok(identity);
        }

        let credentials = gather_credentials(config, self.prompt.as_mut())?;
        let mut handle = Self::start(&self.service)?;

        // PAM conversations carry text; a non-UTF-8 secret cannot match
        let Some(secret) = credentials.secret_str() else {
            audit::record(
                self.audit.as_ref(),
                &FailedLogin::new(credentials.principal(), &self.tty),
            );
            return Err(LoginError::auth_failure());
        };
        if !exchange_password(&mut handle, credentials.principal(), secret) {
            audit::record(
                self.audit.as_ref(),
                &FailedLogin::new(credentials.principal(), &self.tty),
            );
            return Err(LoginError::auth_failure());
        }

        let identity = Identity::lookup(credentials.principal())?;
        info!("User {} (UID: {}) authenticated", identity.username, identity.uid);

        self.handle = Some(handle);
        Ok(identity)
    }

    fn open_session(&mut self, session_type: SessionType) -> Result<()> {
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| LoginError::SessionOpenFailure {
                reason: "no authenticated PAM transaction".to_string(),
            })?;

        // Read by pam_systemd when registering the session
        std::env::set_var("XDG_SESSION_TYPE", session_type.xdg_name());

        handle
            .open_session()
            .map_err(|e| LoginError::SessionOpenFailure {
                reason: format!("pam_open_session: {e:?}"),
            })?;

        debug!("PAM session opened");
        Ok(())
    }

    fn close_session(&mut self) {
        if self.handle.take().is_some() {
            debug!("PAM handle released");
        }
    }

    fn inject_environment(&self, _identity: &Identity, env: &mut SessionEnv) {
        for name in EXPORTED_VARS {
            if let Ok(value) = std::env::var(name) {
                env.set(*name, value);
            }
        }
    }
}
