//! Auto-login retry limiting
//!
//! An auto-login whose session dies immediately would otherwise respawn in
//! a tight loop. Each attempt bumps a counter in
//! `~/.cache/lamco-login/login-retry`; the counter only carries over while
//! the file was written within the last [`RETRY_WINDOW`].
//!
//! Reading and rewriting the counter is not locked. Two terminals
//! auto-logging the same user within the window may lose an increment.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use super::privileges::{as_user, write_private_file};
use crate::auth::Identity;
use crate::config::AuthConfig;
use crate::error::{LoginError, StorageError};

/// How recent the last write must be for its count to carry over
pub const RETRY_WINDOW: Duration = Duration::from_secs(2);

/// File-backed auto-login attempt counter
#[derive(Debug, Clone)]
pub struct RetryLimiter {
    window: Duration,
}

impl Default for RetryLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryLimiter {
    /// Create new limiter with the standard window
    pub fn new() -> Self {
        Self {
            window: RETRY_WINDOW,
        }
    }

    /// Counter file for `identity`
    pub fn record_path(identity: &Identity) -> PathBuf {
        identity.home.join(".cache/lamco-login/login-retry")
    }

    /// Count this attempt and reject it once the limit is reached.
    ///
    /// Only auto-logins into a configured session are counted; a negative
    /// `autologin_max_retry` disables counting. When the limit is hit the
    /// counter is written back as `0`.
    pub fn check_and_record(&self, identity: &Identity, config: &AuthConfig) -> Result<(), LoginError> {
        let max_retry = config.autologin_max_retry;
        if max_retry < 0 || !config.autologin || config.autologin_session().is_none() {
            return Ok(());
        }

        let path = Self::record_path(identity);
        let count = self.read_count(identity, &path, SystemTime::now()).saturating_add(1);

        if i64::from(count) >= i64::from(max_retry) {
            warn!(
                "Auto-login for {} exceeded {} attempt(s) within {:?}",
                identity.username, max_retry, self.window
            );
            self.store(identity, &path, 0);
            return Err(LoginError::RetryExceeded);
        }

        debug!("Auto-login attempt {} of {} for {}", count, max_retry, identity.username);
        self.store(identity, &path, count);
        Ok(())
    }

    /// Stored count if written within the window, else 0
    fn read_count(&self, identity: &Identity, path: &Path, now: SystemTime) -> u32 {
        match as_user(identity, || read_record(path, now, self.window)) {
            Ok(count) => count,
            Err(e) if e.is_not_found() => 0,
            Err(e) => {
                warn!("Ignoring unreadable retry record: {}", e);
                0
            }
        }
    }

    fn store(&self, identity: &Identity, path: &Path, count: u32) {
        if let Err(e) = as_user(identity, || write_private_file(path, count.to_string().as_bytes())) {
            warn!("Failed to update retry record: {}", e);
        }
    }
}

fn read_record(path: &Path, now: SystemTime, window: Duration) -> Result<u32, StorageError> {
    let modified = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| StorageError::io(path, e))?;

    let recent = match now.checked_sub(window) {
        Some(limit) => modified > limit,
        None => true,
    };
    if !recent {
        return Ok(0);
    }

    let content = std::fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
    content
        .trim()
        .parse::<u32>()
        .map_err(|e| StorageError::malformed(path, e))
}
