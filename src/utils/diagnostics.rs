//! Startup diagnostics

use std::path::Path;

use tracing::info;

use crate::config::LoginConfig;

/// Terminal name for audit records: `tty<N>` from config, else whatever
/// stdin is connected to
pub fn detect_tty(config: &LoginConfig) -> String {
    if let Some(n) = config.session.tty {
        return format!("tty{n}");
    }

    std::fs::read_link("/proc/self/fd/0")
        .ok()
        .and_then(|target| tty_name(&target))
        .unwrap_or_else(|| "unknown".to_string())
}

fn tty_name(target: &Path) -> Option<String> {
    let relative = target.strip_prefix("/dev").ok()?;
    let name = relative.to_string_lossy();
    (!name.is_empty()).then(|| name.into_owned())
}

/// Log startup diagnostics
pub fn log_startup_diagnostics(config: &LoginConfig, tty: &str) {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "Unknown".to_string());

    info!("=== Startup Diagnostics ===");
    info!("  Hostname: {}", hostname);
    info!("  Effective UID: {}", nix::unistd::geteuid());
    info!("  Terminal: {}", tty);
    info!("  Auth backend: {}", config.auth.backend);
    info!(
        "  PAM support: {}",
        if cfg!(feature = "pam-auth") { "compiled in" } else { "not compiled in" }
    );
    if let Some(user) = config.auth.autologin_user() {
        info!(
            "  Auto-login: {} (session: {}, max retry: {})",
            user,
            config.auth.autologin_session().unwrap_or("menu"),
            config.auth.autologin_max_retry
        );
    }
}
