//! Effective-id switching for per-user file access
//!
//! Files in a user's home directory are read and written with that user's
//! effective uid/gid so ownership and permission checks match what the user
//! could do themselves. Switching only happens when running as root.

use std::fs::{DirBuilder, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::Path;

use nix::unistd::{getegid, geteuid, setegid, seteuid, Gid, Uid};
use tracing::warn;

use crate::auth::Identity;
use crate::error::StorageError;

/// Run `f` with the effective ids of `identity`.
///
/// `f` is not run at all if the switch fails, so nothing is created as root
/// on the user's behalf.
pub fn as_user<T>(
    identity: &Identity,
    f: impl FnOnce() -> Result<T, StorageError>,
) -> Result<T, StorageError> {
    let _guard = EffectiveIdGuard::switch(identity).map_err(|source| {
        warn!("Skipping file access for {}: {}", identity.username, source);
        StorageError::Privileges {
            user: identity.username.clone(),
            source,
        }
    })?;
    f()
}

/// Restores the original effective ids on drop
struct EffectiveIdGuard {
    uid: Uid,
    gid: Gid,
}

impl EffectiveIdGuard {
    fn switch(identity: &Identity) -> nix::Result<Option<Self>> {
        let (uid, gid) = (geteuid(), getegid());
        if !uid.is_root() || identity.uid == uid.as_raw() {
            return Ok(None);
        }

        // Group first: once the uid is dropped we may no longer change it
        setegid(Gid::from_raw(identity.gid))?;
        if let Err(e) = seteuid(Uid::from_raw(identity.uid)) {
            if let Err(restore) = setegid(gid) {
                warn!("Failed to restore effective gid: {}", restore);
            }
            return Err(e);
        }

        Ok(Some(Self { uid, gid }))
    }
}

impl Drop for EffectiveIdGuard {
    fn drop(&mut self) {
        if let Err(e) = seteuid(self.uid) {
            warn!("Failed to restore effective uid: {}", e);
        }
        if let Err(e) = setegid(self.gid) {
            warn!("Failed to restore effective gid: {}", e);
        }
    }
}

/// Replace `path` with `contents`, creating private parent directories
pub(crate) fn write_private_file(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(parent)
            .map_err(|e| StorageError::io(parent, e))?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(|e| StorageError::io(path, e))?;

    file.write_all(contents)
        .map_err(|e| StorageError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_as_user_for_current_user_is_passthrough() {
        let me = Identity {
            username: "me".to_string(),
            uid: geteuid().as_raw(),
            gid: getegid().as_raw(),
            home: "/tmp".into(),
            shell: "/bin/sh".into(),
            display_name: "me".to_string(),
        };
        let before = geteuid();
        let seen = as_user(&me, || Ok(geteuid())).unwrap();
        assert_eq!(seen, before);
        assert_eq!(geteuid(), before);
    }

    #[test]
    fn test_failed_switch_skips_closure() {
        // Only root switches ids
        if !geteuid().is_root() {
            return;
        }
        let nobody = Identity {
            username: "broken".to_string(),
            uid: 65534,
            // (gid_t)-1 is rejected by setegid
            gid: u32::MAX,
            home: "/nonexistent".into(),
            shell: "/bin/sh".into(),
            display_name: "broken".to_string(),
        };

        let gid_before = getegid();
        let mut ran = false;
        let result = as_user(&nobody, || {
            ran = true;
            Ok(())
        });
        assert!(matches!(result, Err(StorageError::Privileges { .. })));
        assert!(!ran);
        assert!(geteuid().is_root());
        assert_eq!(getegid(), gid_before);
    }

    #[test]
    fn test_write_private_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/state");

        write_private_file(&path, b"1").unwrap();
        write_private_file(&path, b"0").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
