//! Desktop selection
//!
//! Decides which desktop environment the session launches:
//!
//! 1. [`DesktopCatalog`] lists installed sessions (`.desktop` files)
//! 2. [`DesktopStore`] holds per-user preferences and the last choice
//! 3. [`DesktopPresenter`] asks the user when a choice is needed
//! 4. [`DesktopSelector`] sequences the three and resolves wrappers

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod catalog;
pub mod menu;
pub mod selector;
pub mod store;

pub use catalog::DesktopCatalog;
pub use menu::TerminalMenu;
pub use selector::{DesktopPresenter, DesktopSelector, ResolvedDesktop, SelectionError, SelectionMode};
pub use store::{DesktopStore, UserDesktopState, UserDesktopStore};

/// Kind of session a desktop runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    /// Xorg session
    X11,
    /// Wayland compositor
    Wayland,
    /// Plain text session
    Tty,
}

impl SessionType {
    /// Value for `XDG_SESSION_TYPE`
    pub fn xdg_name(self) -> &'static str {
        match self {
            Self::X11 => "x11",
            Self::Wayland => "wayland",
            Self::Tty => "tty",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.xdg_name())
    }
}

/// A launchable desktop, or a wrapper around one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopSelection {
    /// Display name; also the key for `auth.autologin_session`
    pub name: String,

    /// Command line to launch
    pub command: String,

    /// Session kind
    pub session_type: SessionType,

    /// Desktop this one wraps; the innermost one is what runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<Box<DesktopSelection>>,

    /// Marker entry meaning "ask every time"
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub always_ask: bool,
}

impl DesktopSelection {
    /// Plain entry with no child
    pub fn new(name: impl Into<String>, command: impl Into<String>, session_type: SessionType) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            session_type,
            child: None,
            always_ask: false,
        }
    }

    /// Wrap `child`
    pub fn with_child(mut self, child: DesktopSelection) -> Self {
        self.child = Some(Box::new(child));
        self
    }

    /// Innermost selection of a wrapper chain
    pub fn leaf(&self) -> &DesktopSelection {
        let mut current = self;
        while let Some(child) = current.child.as_deref() {
            current = child;
        }
        current
    }

    /// Whether this may be stored as the last-used desktop
    pub fn is_rememberable(&self) -> bool {
        self.child.is_none() && !self.always_ask
    }
}

impl fmt::Display for DesktopSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.session_type)
    }
}
