//! Session process runner

use std::ffi::CString;
use std::process::Command;

use anyhow::{Context, Result};
use nix::unistd::{geteuid, getgrouplist, setgid, setgroups, setuid, Gid, Uid};
use tracing::info;

use super::SessionHandle;
use crate::auth::Identity;

/// Runs the desktop for a prepared session and waits for it to end
pub trait SessionRunner {
    /// Run until the session exits
    fn run(&mut self, handle: &SessionHandle) -> Result<()>;
}

/// Launches the desktop command through the user's login shell
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner;

impl CommandRunner {
    /// Create new runner
    pub fn new() -> Self {
        Self
    }

    /// `<shell> -l -c <command>`, or a bare login shell for an empty command
    pub fn command(handle: &SessionHandle) -> Command {
        let mut cmd = Command::new(&handle.identity.shell);
        cmd.arg("-l");
        if !handle.desktop.command.is_empty() {
            cmd.arg("-c").arg(&handle.desktop.command);
        }

        cmd.env_clear()
            .envs(handle.env.iter())
            .current_dir(&handle.identity.home);
        cmd
    }
}

impl SessionRunner for CommandRunner {
    fn run(&mut self, handle: &SessionHandle) -> Result<()> {
        let mut cmd = Self::command(handle);
        if geteuid().is_root() && !handle.identity.is_root() {
            drop_privileges(&mut cmd, &handle.identity)?;
        }

        info!(
            "Starting {} session for user: {}",
            handle.desktop, handle.identity.username
        );

        let mut child = cmd.spawn().context("Failed to spawn session process")?;
        info!("Session spawned with PID: {}", child.id());

        let status = child.wait().context("Failed to wait for session process")?;
        if !status.success() {
            anyhow::bail!("Session process exited with {}", status);
        }

        info!("Session for {} ended", handle.identity.username);
        Ok(())
    }
}

/// Switch the child to the user's groups, gid and uid before exec
#[allow(unsafe_code)]
fn drop_privileges(cmd: &mut Command, identity: &Identity) -> Result<()> {
    use std::os::unix::process::CommandExt;

    let name = CString::new(identity.username.as_str()).context("Username contains NUL")?;
    let uid = Uid::from_raw(identity.uid);
    let gid = Gid::from_raw(identity.gid);
    let groups = getgrouplist(&name, gid).context("Failed to resolve supplementary groups")?;

    // SAFETY: the hook only issues setgroups/setgid/setuid, which are
    // async-signal-safe, and touches no memory shared with the parent.
    unsafe {
        cmd.pre_exec(move || {
            setgroups(&groups)?;
            setgid(gid)?;
            setuid(uid)?;
            Ok(())
        });
    }

    Ok(())
}
