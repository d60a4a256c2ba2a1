//! Utility Functions and Diagnostics
//!
//! Startup diagnostics and user-friendly formatting of startup errors.
//!
//! ```rust,no_run
//! use lamco_login::utils::format_user_error;
//!
//! let err = anyhow::anyhow!("Failed to read config file: /etc/lamco-login/config.toml");
//! eprintln!("{}", format_user_error(&err));
//! ```
//!
//! Login failures never go through here; they only show
//! [`LoginError::user_message`](crate::LoginError::user_message).

pub mod diagnostics;
pub mod errors;

pub use diagnostics::{detect_tty, log_startup_diagnostics};
pub use errors::format_user_error;
