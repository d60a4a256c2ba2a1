//! Scope guard over an authentication backend
//!
//! Whatever path a login run takes out of its scope, the backend's
//! privileged context is closed exactly once.

use tracing::debug;

use super::{AuthBackend, Identity};
use crate::config::AuthConfig;
use crate::desktop::SessionType;
use crate::error::Result;
use crate::session::SessionEnv;

/// Borrowed backend that is closed when the guard goes away
pub struct AuthContext<'a> {
    backend: &'a mut dyn AuthBackend,
    closed: bool,
}

impl<'a> AuthContext<'a> {
    /// Guard `backend` for one login run
    pub fn new(backend: &'a mut dyn AuthBackend) -> Self {
        Self {
            backend,
            closed: false,
        }
    }

    /// See [`AuthBackend::authenticate`]
    pub fn authenticate(&mut self, config: &AuthConfig) -> Result<Identity> {
        self.backend.authenticate(config)
    }

    /// See [`AuthBackend::open_session`]
    pub fn open_session(&mut self, session_type: SessionType) -> Result<()> {
        self.backend.open_session(session_type)
    }

    /// See [`AuthBackend::inject_environment`]
    pub fn inject_environment(&self, identity: &Identity, env: &mut SessionEnv) {
        self.backend.inject_environment(identity, env);
    }

    /// Close now instead of at drop. Later calls do nothing.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            debug!("Closing {} session context", self.backend.name());
            self.backend.close_session();
        }
    }
}

impl Drop for AuthContext<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
