//! Login lifecycle driver

use std::io::Write;

use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use super::runner::SessionRunner;
use super::scripts::run_hook;
use super::SessionHandle;
use crate::auth::{AuthBackend, AuthContext};
use crate::config::LoginConfig;
use crate::desktop::DesktopSelector;
use crate::error::Result;
use crate::security::RetryLimiter;

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// Nothing verified yet
    Unauthenticated,
    /// Identity resolved
    Authenticated,
    /// Retry limit passed
    RetryChecked,
    /// Desktop chosen
    DesktopResolved,
    /// Privileged session context established
    SessionOpen,
    /// Session process handed to the runner
    Running,
    /// Run finished, successfully or not
    Closed,
}

/// One login attempt from prompt to logout
pub struct LoginLifecycle<'a> {
    config: &'a LoginConfig,
    backend: Box<dyn AuthBackend + 'a>,
    limiter: RetryLimiter,
    selector: DesktopSelector,
    runner: Box<dyn SessionRunner + 'a>,
    notice: Box<dyn Write + 'a>,
    states: Vec<LoginState>,
}

impl<'a> LoginLifecycle<'a> {
    /// Create new lifecycle. Failure messages for the user go to `notice`.
    pub fn new(
        config: &'a LoginConfig,
        backend: Box<dyn AuthBackend + 'a>,
        selector: DesktopSelector,
        runner: Box<dyn SessionRunner + 'a>,
        notice: Box<dyn Write + 'a>,
    ) -> Self {
        Self {
            config,
            backend,
            limiter: RetryLimiter::new(),
            selector,
            runner,
            notice,
            states: vec![LoginState::Unauthenticated],
        }
    }

    /// Current state
    pub fn state(&self) -> LoginState {
        self.states
            .last()
            .copied()
            .unwrap_or(LoginState::Unauthenticated)
    }

    /// States visited by the last run, in order
    pub fn history(&self) -> &[LoginState] {
        &self.states
    }

    /// Run one login. Always ends in [`LoginState::Closed`].
    pub fn run(&mut self) -> Result<()> {
        let span = info_span!("login", run = %Uuid::new_v4(), backend = self.backend.name());
        let _enter = span.enter();

        self.states.clear();
        self.states.push(LoginState::Unauthenticated);

        let result = {
            let mut context = AuthContext::new(self.backend.as_mut());
            let mut steps = Steps {
                config: self.config,
                limiter: &self.limiter,
                selector: &mut self.selector,
                runner: self.runner.as_mut(),
                states: &mut self.states,
            };
            steps.drive(&mut context)
        };
        enter(&mut self.states, LoginState::Closed);

        match &result {
            Ok(()) => info!("Login session finished"),
            Err(err) => {
                warn!("Login failed: {}", err);
                if let Err(e) = writeln!(self.notice, "{}", err.user_message()).and_then(|()| self.notice.flush()) {
                    warn!("Failed to show login failure: {}", e);
                }
            }
        }

        result
    }
}

struct Steps<'r> {
    config: &'r LoginConfig,
    limiter: &'r RetryLimiter,
    selector: &'r mut DesktopSelector,
    runner: &'r mut dyn SessionRunner,
    states: &'r mut Vec<LoginState>,
}

impl Steps<'_> {
    fn drive(&mut self, context: &mut AuthContext<'_>) -> Result<()> {
        let session_config = &self.config.session;

        let identity = context.authenticate(&self.config.auth)?;
        self.enter(LoginState::Authenticated);

        self.limiter.check_and_record(&identity, &self.config.auth)?;
        self.enter(LoginState::RetryChecked);

        let resolved = self.selector.select(&identity, self.config)?;
        self.enter(LoginState::DesktopResolved);

        run_hook("start", session_config.display_start_script.as_deref());

        context.open_session(resolved.selection.session_type)?;
        self.enter(LoginState::SessionOpen);

        let mut handle = SessionHandle::new(identity, resolved, session_config);
        context.inject_environment(&handle.identity, &mut handle.env);

        self.enter(LoginState::Running);
        if let Err(e) = self.runner.run(&handle) {
            warn!("Session ended with error: {:#}", e);
        }

        context.close();
        run_hook("stop", session_config.display_stop_script.as_deref());

        Ok(())
    }

    fn enter(&mut self, next: LoginState) {
        enter(self.states, next);
    }
}

fn enter(states: &mut Vec<LoginState>, next: LoginState) {
    debug!("Login state: {:?} -> {:?}", states.last(), next);
    states.push(next);
}
