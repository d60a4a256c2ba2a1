//! Resolved account identity

use std::path::PathBuf;
use tracing::warn;

use crate::error::{LoginError, Result};

/// Authenticated user information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Username
    pub username: String,

    /// User ID (UID)
    pub uid: u32,

    /// Group ID (GID)
    pub gid: u32,

    /// Home directory
    pub home: PathBuf,

    /// Login shell
    pub shell: PathBuf,

    /// First GECOS field, or the username when empty
    pub display_name: String,
}

impl Identity {
    /// Resolve a principal through the system account database
    pub fn lookup(username: &str) -> Result<Self> {
        use nix::unistd::User;

        match User::from_name(username) {
            Ok(Some(user)) => Ok(Self::from(user)),
            Ok(None) => {
                warn!("User not found: {}", username);
                Err(LoginError::AuthFailure {
                    reason: "unknown user".to_string(),
                })
            }
            Err(e) => {
                warn!("Failed to query user database for {}: {}", username, e);
                Err(LoginError::AuthFailure {
                    reason: "user database unavailable".to_string(),
                })
            }
        }
    }

    /// Whether this is the superuser
    pub fn is_root(&self) -> bool {
        self.uid == 0
    }
}

impl From<nix::unistd::User> for Identity {
    fn from(user: nix::unistd::User) -> Self {
        let gecos = user.gecos.to_string_lossy();
        let display_name = gecos
            .split(',')
            .next()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&user.name)
            .to_string();

        Self {
            display_name,
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
            home: user.dir,
            shell: user.shell,
            username: user.name,
        }
    }
}
