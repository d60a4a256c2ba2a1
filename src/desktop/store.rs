//! Per-user desktop persistence
//!
//! Two TOML files under the user's home directory:
//!
//! - `~/.config/lamco-login/desktop.toml`: user-maintained preferences
//! - `~/.cache/lamco-login/last-session.toml`: the last desktop picked from the menu
//!
//! ```toml
//! # ~/.config/lamco-login/desktop.toml
//! selection = true          # always show the menu
//! lang = "de_DE.UTF-8"
//!
//! [desktop]
//! name = "custom"
//! command = "~/.session-wrapper"
//! session_type = "x11"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::DesktopSelection;
use crate::auth::Identity;
use crate::error::StorageError;
use crate::security::privileges::{as_user, write_private_file};

/// Preferences a user keeps for their own logins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDesktopState {
    /// Pinned desktop, possibly a wrapper
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop: Option<DesktopSelection>,

    /// Ask for a desktop on every login
    #[serde(default, rename = "selection")]
    pub reselect: bool,

    /// Language override for the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

/// Where desktop preferences live
pub trait DesktopStore {
    /// Persisted preferences, `None` when the user has none
    fn load_state(&self, identity: &Identity) -> Result<Option<UserDesktopState>, StorageError>;

    /// Desktop picked at the previous interactive login
    fn last_used(&self, identity: &Identity) -> Result<Option<DesktopSelection>, StorageError>;

    /// Record `selection` as last used
    fn remember(&self, identity: &Identity, selection: &DesktopSelection) -> Result<(), StorageError>;
}

/// Files in the user's home directory, accessed with the user's privileges
#[derive(Debug, Clone, Copy, Default)]
pub struct UserDesktopStore;

impl UserDesktopStore {
    /// Preferences file
    pub fn state_path(identity: &Identity) -> PathBuf {
        identity.home.join(".config/lamco-login/desktop.toml")
    }

    /// Last-used file
    pub fn last_used_path(identity: &Identity) -> PathBuf {
        identity.home.join(".cache/lamco-login/last-session.toml")
    }
}

impl DesktopStore for UserDesktopStore {
    fn load_state(&self, identity: &Identity) -> Result<Option<UserDesktopState>, StorageError> {
        as_user(identity, || read_toml(&Self::state_path(identity)))
    }

    fn last_used(&self, identity: &Identity) -> Result<Option<DesktopSelection>, StorageError> {
        as_user(identity, || read_toml(&Self::last_used_path(identity)))
    }

    fn remember(&self, identity: &Identity, selection: &DesktopSelection) -> Result<(), StorageError> {
        let path = Self::last_used_path(identity);
        let content = toml::to_string(selection).map_err(|e| StorageError::malformed(&path, e))?;
        as_user(identity, || write_private_file(&path, content.as_bytes()))
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, e)),
    };

    toml::from_str(&content)
        .map(Some)
        .map_err(|e| StorageError::malformed(path, e))
}
