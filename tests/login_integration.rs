//! Login lifecycle integration tests
//!
//! Runs complete logins with real stores, menus and backends where the
//! environment allows, counting how often the session context is closed.

use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use lamco_login::auth::{
    AuthBackend, CredentialPrompt, FileAuditLog, Identity, ShadowBackend,
};
use lamco_login::config::{AuthConfig, LoginConfig};
use lamco_login::desktop::{
    DesktopCatalog, DesktopSelection, DesktopSelector, DesktopStore, SessionType, TerminalMenu,
    UserDesktopState, UserDesktopStore,
};
use lamco_login::error::StorageError;
use lamco_login::session::{SessionEnv, SessionHandle, SessionRunner};
use lamco_login::{LoginError, LoginLifecycle, LoginState, Result};
use tempfile::TempDir;
use zeroize::Zeroizing;

// glibc SHA-crypt reference vector for "Hello world!"
const HELLO_HASH: &str = "$6$saltstring$svn8UoSVapNtMuq1ukKS4tPQd8iKwSMHWjl/O817G3uBnIFNjnQJuesI68u4OTLiBFdcbYEdFCoEOfaS35inz1";

/// Wraps a backend and counts `close_session` calls
struct Counting<B> {
    inner: B,
    closes: Arc<AtomicUsize>,
}

impl<B: AuthBackend> AuthBackend for Counting<B> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }
    fn authenticate(&mut self, config: &AuthConfig) -> Result<Identity> {
        self.inner.authenticate(config)
    }
    fn open_session(&mut self, session_type: SessionType) -> Result<()> {
        self.inner.open_session(session_type)
    }
    fn close_session(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close_session();
    }
    fn inject_environment(&self, identity: &Identity, env: &mut SessionEnv) {
        self.inner.inject_environment(identity, env);
    }
}

/// Accepts whoever it was built for
struct Trusting {
    identity: Identity,
    authenticated: bool,
}

impl AuthBackend for Trusting {
    fn name(&self) -> &'static str {
        "trusting"
    }
    fn authenticate(&mut self, _config: &AuthConfig) -> Result<Identity> {
        self.authenticated = true;
        Ok(self.identity.clone())
    }
    fn open_session(&mut self, _session_type: SessionType) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(LoginError::SessionOpenFailure {
                reason: "not authenticated".to_string(),
            })
        }
    }
    fn close_session(&mut self) {}
    fn inject_environment(&self, _identity: &Identity, env: &mut SessionEnv) {
        env.set("XDG_SESSION_ID", "c1");
    }
}

struct Typed {
    principal: &'static str,
    secret: &'static str,
}

impl CredentialPrompt for Typed {
    fn announce_principal(&mut self, _principal: &str) -> io::Result<()> {
        Ok(())
    }
    fn read_principal(&mut self) -> io::Result<String> {
        Ok(self.principal.to_string())
    }
    fn read_secret(&mut self) -> io::Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(self.secret.as_bytes().to_vec()))
    }
}

struct Pinned(DesktopSelection);

impl DesktopStore for Pinned {
    fn load_state(&self, _identity: &Identity) -> std::result::Result<Option<UserDesktopState>, StorageError> {
        Ok(Some(UserDesktopState {
            desktop: Some(self.0.clone()),
            ..UserDesktopState::default()
        }))
    }
    fn last_used(&self, _identity: &Identity) -> std::result::Result<Option<DesktopSelection>, StorageError> {
        Ok(None)
    }
    fn remember(&self, _identity: &Identity, _selection: &DesktopSelection) -> std::result::Result<(), StorageError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Recording(Arc<Mutex<Vec<SessionHandle>>>);

impl SessionRunner for Recording {
    fn run(&mut self, handle: &SessionHandle) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(handle.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Notice(Arc<Mutex<Vec<u8>>>);

impl Write for Notice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Notice {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn user_in(home: &Path) -> Identity {
    Identity {
        username: "alice".to_string(),
        uid: nix::unistd::geteuid().as_raw(),
        gid: nix::unistd::getegid().as_raw(),
        home: home.to_path_buf(),
        shell: "/bin/sh".into(),
        display_name: "Alice".to_string(),
    }
}

fn sway() -> DesktopSelection {
    DesktopSelection::new("Sway", "sway", SessionType::Wayland)
}

fn i3() -> DesktopSelection {
    DesktopSelection::new("i3", "i3", SessionType::X11)
}

fn no_menu() -> Box<TerminalMenu<Cursor<Vec<u8>>, Vec<u8>>> {
    Box::new(TerminalMenu::new(Cursor::new(Vec::new()), Vec::new()))
}

fn counted(inner: impl AuthBackend + 'static) -> (Box<dyn AuthBackend>, Arc<AtomicUsize>) {
    let closes = Arc::new(AtomicUsize::new(0));
    let backend = Counting {
        inner,
        closes: Arc::clone(&closes),
    };
    (Box::new(backend), closes)
}

#[test]
fn test_autologin_lockout_after_rapid_restarts() {
    let dir = TempDir::new().unwrap();
    let user = user_in(dir.path());
    let mut config = LoginConfig::default();
    config.auth.default_user = Some("alice".to_string());
    config.auth.autologin = true;
    config.auth.autologin_session = Some("Sway".to_string());
    config.auth.autologin_max_retry = 3;

    let runner = Recording::default();
    let retry_file = dir.path().join(".cache/lamco-login/login-retry");
    let mut outcomes = Vec::new();

    for _ in 0..3 {
        let (backend, closes) = counted(Trusting {
            identity: user.clone(),
            authenticated: false,
        });
        let selector = DesktopSelector::new(
            DesktopCatalog::from_entries(vec![sway(), i3()]),
            Box::new(UserDesktopStore),
            no_menu(),
        );
        let mut lifecycle = LoginLifecycle::new(
            &config,
            backend,
            selector,
            Box::new(runner.clone()),
            Box::new(io::sink()),
        );

        outcomes.push(lifecycle.run());
        assert_eq!(lifecycle.state(), LoginState::Closed);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        if outcomes.len() < 3 {
            let stored = std::fs::read_to_string(&retry_file).unwrap();
            assert_eq!(stored, outcomes.len().to_string());
        }
    }

    assert_eq!(outcomes, vec![Ok(()), Ok(()), Err(LoginError::RetryExceeded)]);
    assert_eq!(std::fs::read_to_string(&retry_file).unwrap(), "0");

    let handles = runner.0.lock().unwrap();
    assert_eq!(handles.len(), 2);
    assert!(handles.iter().all(|h| h.desktop == sway()));
}

#[test]
fn test_first_login_forces_menu_and_remembers_choice() {
    let dir = TempDir::new().unwrap();
    let user = user_in(dir.path());
    let config = LoginConfig::default();

    // A last-used entry exists but there are no preferences
    UserDesktopStore.remember(&user, &i3()).unwrap();

    let menu_output = Notice::default();
    let runner = Recording::default();
    {
        let menu = TerminalMenu::new(Cursor::new(b"\n0\n".to_vec()), menu_output.clone());
        let selector = DesktopSelector::new(
            DesktopCatalog::from_entries(vec![sway(), i3()]),
            Box::new(UserDesktopStore),
            Box::new(menu),
        );
        let (backend, closes) = counted(Trusting {
            identity: user.clone(),
            authenticated: false,
        });
        let mut lifecycle = LoginLifecycle::new(
            &config,
            backend,
            selector,
            Box::new(runner.clone()),
            Box::new(io::sink()),
        );

        lifecycle.run().unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    let menu_text = menu_output.lines().join("\n");
    // Forced mode: Enter is not accepted and no default is offered
    assert!(!menu_text.contains("Enter for"));
    assert!(menu_text.contains("Invalid choice"));

    assert_eq!(UserDesktopStore.last_used(&user).unwrap(), Some(sway()));
    let handles = runner.0.lock().unwrap();
    assert_eq!(handles[0].desktop, sway());
    assert_eq!(handles[0].env.get("XDG_SESSION_TYPE"), Some("wayland"));
    assert_eq!(handles[0].env.get("XDG_SESSION_ID"), Some("c1"));
}

#[test]
fn test_wrong_password_is_audited_and_reported_once() {
    let dir = TempDir::new().unwrap();
    let shadow = write_shadow(dir.path());
    let audit_path = dir.path().join("failed-logins.log");

    let mut config = LoginConfig::default();
    config.session.tty = Some(5);

    let backend = ShadowBackend::new(
        &shadow,
        Box::new(Typed {
            principal: "root",
            secret: "not the password",
        }),
        Box::new(FileAuditLog::new(&audit_path)),
        "tty5",
    );
    let (backend, closes) = counted(backend);
    let notice = Notice::default();
    let runner = Recording::default();

    let mut lifecycle = LoginLifecycle::new(
        &config,
        backend,
        DesktopSelector::new(
            DesktopCatalog::from_entries(vec![sway()]),
            Box::new(Pinned(sway())),
            no_menu(),
        ),
        Box::new(runner.clone()),
        Box::new(notice.clone()),
    );

    let err = lifecycle.run().unwrap_err();
    assert_eq!(err, LoginError::auth_failure());
    assert_eq!(
        lifecycle.history(),
        &[LoginState::Unauthenticated, LoginState::Closed]
    );
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(notice.lines(), vec!["Login incorrect.".to_string()]);
    assert!(runner.0.lock().unwrap().is_empty());

    let audit = std::fs::read_to_string(&audit_path).unwrap();
    let lines: Vec<&str> = audit.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("root"));
    assert!(lines[0].contains(&format!("pid={}", std::process::id())));
    assert!(lines[0].contains("tty=tty5"));
    assert!(!audit.contains("not the password"));
}

#[test]
fn test_shadow_login_runs_pinned_desktop() {
    let dir = TempDir::new().unwrap();
    let shadow = write_shadow(dir.path());
    let mut config = LoginConfig::default();
    config.session.lang = Some("C.UTF-8".to_string());

    let backend = ShadowBackend::new(
        &shadow,
        Box::new(Typed {
            principal: "root",
            secret: "Hello world!",
        }),
        Box::new(FileAuditLog::new(dir.path().join("failed.log"))),
        "tty1",
    );
    let (backend, closes) = counted(backend);
    let runner = Recording::default();

    let mut lifecycle = LoginLifecycle::new(
        &config,
        backend,
        DesktopSelector::new(
            DesktopCatalog::from_entries(vec![sway(), i3()]),
            Box::new(Pinned(i3())),
            no_menu(),
        ),
        Box::new(runner.clone()),
        Box::new(io::sink()),
    );

    lifecycle.run().unwrap();
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert!(!dir.path().join("failed.log").exists());

    let handles = runner.0.lock().unwrap();
    assert_eq!(handles.len(), 1);
    assert_eq!(handles[0].identity.uid, 0);
    assert_eq!(handles[0].desktop, i3());
    assert_eq!(handles[0].env.get("LANG"), Some("C.UTF-8"));
    assert_eq!(handles[0].env.get("USER"), Some("root"));
}

fn write_shadow(dir: &Path) -> PathBuf {
    let path = dir.join("shadow");
    std::fs::write(&path, format!("root:{HELLO_HASH}:19000:0:99999:7:::\n")).unwrap();
    path
}
