//! Login Error Types
//!
//! Terminal errors end a login run; the non-fatal kinds are logged by
//! whoever hits them and never surface to the person at the terminal.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for login operations
pub type Result<T> = std::result::Result<T, LoginError>;

/// Errors that terminate a login run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// Credentials rejected or the principal could not be resolved
    #[error("Authentication failed: {reason}")]
    AuthFailure {
        /// Backend-supplied reason, for the log only
        reason: String,
    },

    /// The terminal stopped answering the credential prompt (hangup, EOF)
    #[error("Credential prompt failed: {reason}")]
    PromptClosed {
        /// I/O error text, for the log only
        reason: String,
    },

    /// Too many auto-login attempts inside the retry window
    #[error("Exceeded maximum number of allowed login retries in short period")]
    RetryExceeded,

    /// The privileged session context could not be established
    #[error("Failed to open session: {reason}")]
    SessionOpenFailure {
        /// Backend-supplied reason, for the log only
        reason: String,
    },

    /// No desktop could be chosen
    #[error("Desktop selection failed: {reason}")]
    DesktopSelectionFailure {
        /// Presenter-supplied reason, for the log only
        reason: String,
    },
}

impl LoginError {
    /// Generic credential rejection
    pub fn auth_failure() -> Self {
        Self::AuthFailure {
            reason: "authentication failure".to_string(),
        }
    }

    /// Whether an interactive login goes back to the prompt after this
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AuthFailure { .. })
    }

    /// Message shown at the terminal. Carries no internal detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AuthFailure { .. } => "Login incorrect.",
            Self::PromptClosed { .. } => "Login aborted.",
            Self::RetryExceeded => {
                "Exceeded maximum number of allowed login retries in short period."
            }
            Self::SessionOpenFailure { .. } => "Could not start login session.",
            Self::DesktopSelectionFailure { .. } => "No desktop environment selected.",
        }
    }
}

/// Persistent-state failures. Callers fail open.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File content did not parse
    #[error("Malformed content in {path}: {reason}")]
    Malformed {
        /// File involved
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Could not take on the user's effective ids
    #[error("Cannot act as {user}: {source}")]
    Privileges {
        /// Account the access was for
        user: String,
        /// Failed set*id call
        #[source]
        source: nix::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True when the file simply does not exist yet
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Display script failures. Logged, never fatal.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// Script path missing or lacking the execute bit
    #[error("Script is not executable: {0}")]
    NotExecutable(PathBuf),

    /// Script could not be started
    #[error("Failed to run script {path}: {source}")]
    Spawn {
        /// Script path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Script ran and exited unsuccessfully
    #[error("Script {path} exited with {status}")]
    Failed {
        /// Script path
        path: PathBuf,
        /// Exit status description
        status: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_hide_reason() {
        let err = LoginError::SessionOpenFailure {
            reason: "pam_open_session: module unknown".to_string(),
        };
        assert!(!err.user_message().contains("pam"));
        assert!(err.to_string().contains("module unknown"));
    }

    #[test]
    fn test_closed_prompt_is_not_a_rejection() {
        let err = LoginError::PromptClosed {
            reason: "unexpected end of file".to_string(),
        };
        assert_ne!(err.user_message(), LoginError::auth_failure().user_message());
        assert!(!err.is_retryable());
        assert!(LoginError::auth_failure().is_retryable());
        assert!(!LoginError::RetryExceeded.is_retryable());
    }

    #[test]
    fn test_storage_not_found() {
        let err = StorageError::io(
            "/nowhere",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.is_not_found());
        assert!(!StorageError::malformed("/x", "bad digit").is_not_found());
    }
}
