//! Installed desktop sessions
//!
//! Reads XDG session `.desktop` files from the X11 and Wayland session
//! directories. Only the `[Desktop Entry]` group is consulted, and only the
//! `Name`, `Exec`, `Hidden` and `NoDisplay` keys.

use std::path::Path;

use tracing::{debug, warn};

use super::{DesktopSelection, SessionType};
use crate::config::DesktopConfig;

/// Name of the plain-shell entry
pub const TTY_SHELL_NAME: &str = "User shell";

/// Entries offered to the user, in menu order
#[derive(Debug, Clone, Default)]
pub struct DesktopCatalog {
    entries: Vec<DesktopSelection>,
}

impl DesktopCatalog {
    /// Scan the configured session directories
    pub fn scan(config: &DesktopConfig) -> Self {
        let mut entries = Vec::new();
        entries.extend(scan_dir(&config.wayland_sessions_dir, SessionType::Wayland));
        entries.extend(scan_dir(&config.x11_sessions_dir, SessionType::X11));

        entries.retain(|entry| {
            let excluded = config
                .exclude
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&entry.name));
            if excluded {
                debug!("Excluding desktop {}", entry.name);
            }
            !excluded
        });

        if config.tty_shell {
            // Empty command means the user's login shell
            entries.push(DesktopSelection::new(TTY_SHELL_NAME, "", SessionType::Tty));
        }

        debug!("Desktop catalog has {} entries", entries.len());
        Self { entries }
    }

    /// Catalog over a fixed list
    pub fn from_entries(entries: Vec<DesktopSelection>) -> Self {
        Self { entries }
    }

    /// All entries
    pub fn entries(&self) -> &[DesktopSelection] {
        &self.entries
    }

    /// Entry by name, ignoring ASCII case
    pub fn find(&self, name: &str) -> Option<&DesktopSelection> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Whether there is nothing to offer
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn scan_dir(dir: &Path, session_type: SessionType) -> Vec<DesktopSelection> {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            debug!("Skipping session directory {:?}: {}", dir, e);
            return Vec::new();
        }
    };

    let mut paths: Vec<_> = read_dir
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "desktop"))
        .collect();
    paths.sort();

    paths
        .iter()
        .filter_map(|path| {
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Failed to read {:?}: {}", path, e);
                    return None;
                }
            };
            let fallback = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            parse_desktop_entry(&content, &fallback, session_type)
        })
        .collect()
}

/// Parse one `.desktop` file. Hidden entries and entries without `Exec` yield `None`.
pub(crate) fn parse_desktop_entry(
    content: &str,
    fallback_name: &str,
    session_type: SessionType,
) -> Option<DesktopSelection> {
    let mut in_entry = false;
    let mut name = None;
    let mut exec = None;

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            in_entry = line == "[Desktop Entry]";
            continue;
        }
        if !in_entry {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Name" => name = Some(value.to_string()),
            "Exec" => exec = Some(value.to_string()),
            "Hidden" | "NoDisplay" if value.eq_ignore_ascii_case("true") => return None,
            _ => {}
        }
    }

    let exec = exec.filter(|e| !e.is_empty())?;
    let name = name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| fallback_name.to_string());

    Some(DesktopSelection::new(name, exec, session_type))
}
