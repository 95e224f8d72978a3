//! Advisory lock around publish and rollback.
//!
//! Two concurrent publishes racing on the same stable directory would
//! silently clobber each other's swap and backup, so every mutating
//! entry point takes this lock first. The lock file uses
//! exclusive-create semantics; contention surfaces as an error rather
//! than a blocking wait.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PublishError, Result};

/// Lock file name, created in the project root.
pub const LOCK_FILE_NAME: &str = ".publish.lock";

/// Guard holding the advisory publish lock; released on drop.
#[derive(Debug)]
pub struct PublishLock {
    lock_path: PathBuf,
}

impl PublishLock {
    /// Acquire the lock, failing immediately if it is held.
    ///
    /// The owning process id is written into the lock file to help
    /// operators diagnose a stale lock left by a killed process.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create_new(true).write(true).open(path);
        match file {
            Ok(mut handle) => {
                let _ = write!(handle, "{}", std::process::id());
                debug!(lock = %path.display(), "acquired publish lock");
                Ok(PublishLock {
                    lock_path: path.to_path_buf(),
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(PublishError::LockHeld(path.to_path_buf()))
            }
            Err(err) => Err(PublishError::io(path, err)),
        }
    }
}

impl Drop for PublishLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_and_release() {
        let root = tempdir().unwrap();
        let path = root.path().join(LOCK_FILE_NAME);
        {
            let _lock = PublishLock::acquire(&path).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn second_acquire_fails_while_held() {
        let root = tempdir().unwrap();
        let path = root.path().join(LOCK_FILE_NAME);
        let _lock = PublishLock::acquire(&path).unwrap();

        let err = PublishLock::acquire(&path).unwrap_err();
        assert!(matches!(err, PublishError::LockHeld(_)));
    }

    #[test]
    fn reacquire_after_release() {
        let root = tempdir().unwrap();
        let path = root.path().join(LOCK_FILE_NAME);
        drop(PublishLock::acquire(&path).unwrap());
        assert!(PublishLock::acquire(&path).is_ok());
    }
}
