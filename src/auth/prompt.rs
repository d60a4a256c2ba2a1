//! Terminal credential prompt

use std::io::{self, BufRead, Write};
use std::os::fd::AsFd;

use nix::sys::termios::{self, LocalFlags, SetArg, Termios};
use tracing::debug;
use zeroize::Zeroizing;

/// Source of the principal and secret for an interactive login
pub trait CredentialPrompt {
    /// Show the preconfigured principal instead of asking for one
    fn announce_principal(&mut self, principal: &str) -> io::Result<()>;

    /// Ask for the principal
    fn read_principal(&mut self) -> io::Result<String>;

    /// Ask for the secret with echo disabled
    fn read_secret(&mut self) -> io::Result<Zeroizing<Vec<u8>>>;
}

/// Prompt on the controlling terminal (stdin/stdout)
pub struct TerminalPrompt {
    hostname: String,
}

impl TerminalPrompt {
    /// Create a prompt labelled with the local hostname
    pub fn new() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "localhost".to_string());

        Self { hostname }
    }

    fn login_label(&self) -> String {
        format!("{} login: ", self.hostname)
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialPrompt for TerminalPrompt {
    fn announce_principal(&mut self, principal: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}{}", self.login_label(), principal)?;
        out.flush()
    }

    fn read_principal(&mut self) -> io::Result<String> {
        {
            let mut out = io::stdout().lock();
            write!(out, "{}", self.login_label())?;
            out.flush()?;
        }

        let mut line = String::new();
        read_line(&mut line)?;
        Ok(line)
    }

    fn read_secret(&mut self) -> io::Result<Zeroizing<Vec<u8>>> {
        {
            let mut out = io::stdout().lock();
            write!(out, "Password: ")?;
            out.flush()?;
        }

        let mut line = Zeroizing::new(String::new());
        let result = {
            let _echo = EchoGuard::disable();
            read_line(&mut line)
        };
        println!();
        result?;

        Ok(Zeroizing::new(line.as_bytes().to_vec()))
    }
}

fn read_line(buf: &mut String) -> io::Result<()> {
    if io::stdin().lock().read_line(buf)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }
    while buf.ends_with(['\n', '\r']) {
        buf.pop();
    }
    Ok(())
}

/// Turns terminal echo off until dropped
struct EchoGuard {
    original: Option<Termios>,
}

impl EchoGuard {
    fn disable() -> Self {
        let original = match termios::tcgetattr(io::stdin().as_fd()) {
            Ok(original) => original,
            Err(e) => {
                debug!("stdin is not a terminal, reading secret as-is: {}", e);
                return Self { original: None };
            }
        };

        let mut silent = original.clone();
        silent.local_flags.remove(LocalFlags::ECHO);
        if let Err(e) = termios::tcsetattr(io::stdin().as_fd(), SetArg::TCSANOW, &silent) {
            debug!("Failed to disable echo: {}", e);
            return Self { original: None };
        }

        Self {
            original: Some(original),
        }
    }
}

impl Drop for EchoGuard {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            if let Err(e) = termios::tcsetattr(io::stdin().as_fd(), SetArg::TCSANOW, &original) {
                debug!("Failed to restore terminal echo: {}", e);
            }
        }
    }
}
