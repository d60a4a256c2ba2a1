//! Login session lifecycle
//!
//! After authentication the lifecycle works through:
//!
//! ```text
//! Unauthenticated → Authenticated → RetryChecked → DesktopResolved
//!                 → SessionOpen → Running → Closed
//! ```
//!
//! Every failure jumps straight to `Closed`. The backend's session context
//! is released exactly once whichever way the run ends.

pub mod env;
pub mod lifecycle;
pub mod runner;
pub mod scripts;

pub use env::SessionEnv;
pub use lifecycle::{LoginLifecycle, LoginState};
pub use runner::{CommandRunner, SessionRunner};
pub use scripts::run_display_script;

use crate::auth::Identity;
use crate::config::SessionConfig;
use crate::desktop::{DesktopSelection, ResolvedDesktop};

const DEFAULT_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// Everything the runner needs for one session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// Who the session runs as
    pub identity: Identity,
    /// Leaf desktop to launch
    pub desktop: DesktopSelection,
    /// Effective language
    pub lang: Option<String>,
    /// Full session environment
    pub env: SessionEnv,
}

impl SessionHandle {
    /// Build the handle and its base environment
    pub fn new(identity: Identity, resolved: ResolvedDesktop, config: &SessionConfig) -> Self {
        let lang = resolved
            .lang_override
            .or_else(|| config.lang.clone())
            .filter(|lang| !lang.is_empty());
        let desktop = resolved.selection;

        let mut env = SessionEnv::default();
        env.set("HOME", identity.home.to_string_lossy());
        env.set("USER", identity.username.as_str());
        env.set("LOGNAME", identity.username.as_str());
        env.set("SHELL", identity.shell.to_string_lossy());
        env.set("PATH", DEFAULT_PATH);
        env.set(
            "TERM",
            std::env::var("TERM").unwrap_or_else(|_| "linux".to_string()),
        );
        env.set("XDG_SESSION_TYPE", desktop.session_type.xdg_name());
        env.set("XDG_SESSION_DESKTOP", desktop.name.as_str());
        env.set("DESKTOP_SESSION", desktop.name.as_str());
        if let Some(lang) = &lang {
            env.set("LANG", lang.as_str());
        }
        for var in &config.environment {
            env.set(var.name.as_str(), var.value.as_str());
        }

        Self {
            identity,
            desktop,
            lang,
            env,
        }
    }
}
