//! Failed-login audit trail

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

use crate::config::AuthConfig;

/// One rejected login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedLogin {
    /// Principal that was tried
    pub principal: String,
    /// Process that handled the attempt
    pub pid: u32,
    /// Terminal the attempt came from
    pub tty: String,
}

impl FailedLogin {
    /// Entry for the current process
    pub fn new(principal: &str, tty: &str) -> Self {
        Self {
            principal: principal.to_string(),
            pid: std::process::id(),
            tty: tty.to_string(),
        }
    }
}

/// Sink for failed-login records
pub trait AuditLog {
    /// Persist one record
    fn record_failed_login(&self, entry: &FailedLogin) -> Result<()>;
}

/// Appends one line per failure to a text file
#[derive(Debug, Clone)]
pub struct FileAuditLog {
    path: PathBuf,
}

impl FileAuditLog {
    /// Audit log writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AuditLog for FileAuditLog {
    fn record_failed_login(&self, entry: &FailedLogin) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create audit log directory {:?}", parent))?;
        }

        let timestamp = chrono::Utc::now().to_rfc3339();
        let log_entry = format!(
            "{} [AUTH_FAILURE] {}: pid={} tty={}\n",
            timestamp,
            sanitize(&entry.principal),
            entry.pid,
            sanitize(&entry.tty)
        );

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("Failed to open audit log")?;

        file.write_all(log_entry.as_bytes())
            .context("Failed to write to audit log")?;

        file.sync_all().context("Failed to sync audit log")?;

        Ok(())
    }
}

/// Discards records
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuditLog;

impl AuditLog for NullAuditLog {
    fn record_failed_login(&self, _entry: &FailedLogin) -> Result<()> {
        Ok(())
    }
}

/// Audit sink selected by `auth.audit_log`
pub fn audit_log_from_config(config: &AuthConfig) -> Box<dyn AuditLog> {
    match &config.audit_log {
        Some(path) => Box::new(FileAuditLog::new(path.clone())),
        None => Box::new(NullAuditLog),
    }
}

/// Record a failure; a broken sink never changes the login outcome
pub(crate) fn record(audit: &dyn AuditLog, entry: &FailedLogin) {
    warn!(
        "Failed login attempt for {} on {}",
        sanitize(&entry.principal),
        entry.tty
    );
    if let Err(e) = audit.record_failed_login(entry) {
        warn!("Failed to write audit entry: {:#}", e);
    }
}

// Principals are user-typed; keep one record per line.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { '?' } else { c })
        .collect()
}
