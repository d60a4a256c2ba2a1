//! # lamco-login
//!
//! Text-mode login manager for a Linux virtual terminal.
//!
//! One login run authenticates the user, applies the auto-login retry
//! limit, picks a desktop and drives the session from start to logout:
//!
//! ```text
//! lamco-login
//!   ├─> AuthBackend (PAM or shadow database)
//!   ├─> RetryLimiter (auto-login respawn guard)
//!   ├─> DesktopSelector (catalog, preferences, menu)
//!   ├─> Display scripts (start / stop)
//!   └─> SessionRunner (user's login shell)
//! ```
//!
//! The pieces are wired together by [`session::LoginLifecycle`], which
//! takes every collaborator explicitly so each can be replaced in tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Authentication backends and credential handling
pub mod auth;

/// Configuration loading and validation
pub mod config;

/// Desktop catalog, persistence and selection
pub mod desktop;

/// Error types
pub mod error;

/// Retry limiting and privilege switching
pub mod security;

/// Session lifecycle
pub mod session;

/// Utility functions
pub mod utils;

pub use config::LoginConfig;
pub use error::{LoginError, Result};
pub use session::{LoginLifecycle, LoginState};
