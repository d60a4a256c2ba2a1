//! Operator display scripts
//!
//! Optional executables run around the session: the start script after the
//! desktop is resolved, the stop script once the session context is closed.
//! They run synchronously and never affect the login outcome.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

use crate::error::ScriptError;

/// Run `path` and wait for it
pub fn run_display_script(path: &Path) -> Result<(), ScriptError> {
    if !is_executable(path) {
        return Err(ScriptError::NotExecutable(path.to_path_buf()));
    }

    let status = Command::new(path)
        .status()
        .map_err(|source| ScriptError::Spawn {
            path: path.to_path_buf(),
            source,
        })?;

    if !status.success() {
        return Err(ScriptError::Failed {
            path: path.to_path_buf(),
            status: status.to_string(),
        });
    }

    Ok(())
}

/// Run an optional script, logging any failure
pub(crate) fn run_hook(label: &str, path: Option<&Path>) {
    let Some(path) = path else {
        return;
    };

    debug!("Running display {} script {:?}", label, path);
    if let Err(e) = run_display_script(path) {
        warn!("Display {} script: {}", label, e);
    }
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
