//! Security
//!
//! Auto-login retry limiting and the effective-id switching used for every
//! file touched in a user's home directory.

pub mod privileges;
pub mod retry;

pub use privileges::as_user;
pub use retry::{RetryLimiter, RETRY_WINDOW};
