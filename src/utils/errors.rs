//! User-Friendly Error Formatting
//!
//! Startup errors are shown to the operator with troubleshooting hints.

use std::fmt::Write;

/// Format a startup error for the operator
///
/// Takes the technical error and adds likely causes and fixes.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    // Header
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    let error_msg = format!("{:#}", error);

    if error_msg.contains("PAM") {
        format_pam_error(&mut output);
    } else if error_msg.contains("config") {
        format_config_error(&mut output);
    } else if error_msg.contains("Permission denied") || error_msg.contains("shadow") {
        format_permission_error(&mut output);
    } else {
        format_generic_error(&mut output);
    }

    // Technical details
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{}", error_msg).ok();

    output
}

fn format_pam_error(output: &mut String) {
    writeln!(output, "PAM Error").ok();
    writeln!(output).ok();
    writeln!(output, "The PAM authentication backend is unavailable.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Binary built without PAM support").ok();
    writeln!(output, "     → Rebuild with: cargo build --features pam-auth").ok();
    writeln!(output, "     → Or set auth.backend = \"shadow\" in config.toml").ok();
    writeln!(output).ok();
    writeln!(output, "  2. PAM service file missing").ok();
    writeln!(output, "     → Check /etc/pam.d/lamco-login exists").ok();
    writeln!(
        output,
        "     → Auto-login also needs /etc/pam.d/lamco-login-autologin"
    )
    .ok();
}

fn format_config_error(output: &mut String) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "Problem with configuration file.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output, "     → Default location: /etc/lamco-login/config.toml").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Inconsistent auto-login settings").ok();
    writeln!(output, "     → auth.autologin = true needs auth.default_user").ok();
}

fn format_permission_error(output: &mut String) {
    writeln!(output, "Permission Error").ok();
    writeln!(output).ok();
    writeln!(output, "A system file could not be accessed.").ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. lamco-login must run as root").ok();
    writeln!(output, "     → Start it from a getty unit or systemd service").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Check auth.shadow_path points at the shadow database").ok();
}

fn format_generic_error(output: &mut String) {
    writeln!(output, "Startup Error").ok();
    writeln!(output).ok();
    writeln!(output, "The login manager could not start.").ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Run with -vv for debug logging").ok();
    writeln!(output, "  2. Check the log file given with --log-file").ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_user_error() {
        let error = anyhow::anyhow!("Failed to parse config file: /etc/lamco-login/config.toml");
        let formatted = format_user_error(&error);
        assert!(formatted.contains("ERROR"));
        assert!(formatted.contains("Configuration Error"));
    }

    #[test]
    fn test_pam_error_formatting() {
        let error = anyhow::anyhow!("PAM auth backend requested but PAM support is not compiled in");
        let formatted = format_user_error(&error);
        assert!(formatted.contains("--features pam-auth"));
    }
}
