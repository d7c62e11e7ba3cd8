//! # Singleton Guard
//!
//! Filesystem mutual exclusion for whole pipeline runs: an exclusively
//! created lock file holding the owning PID. Contention is the expected
//! "another instance is running" case and is reported as `None`, not as an
//! error. There is no staleness detection — a crashed run leaves the file
//! in place until it is cleared externally.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ReminderError, Result};

/// Exclusive run token; releasing removes the lock file. Release happens
/// on drop as well, so the lock survives no normal exit path.
#[derive(Debug)]
pub struct SingletonGuard {
    path: PathBuf,
    released: bool,
}

impl SingletonGuard {
    /// Default lock location in the OS temp directory.
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join("wishlist_orch.lock")
    }

    /// Atomically create the lock file. `Ok(None)` means another instance
    /// holds it; only unexpected I/O failures are errors.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref().to_path_buf();

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                if let Err(e) = write!(file, "{}", std::process::id()) {
                    // Lock exists but the PID payload is best-effort only.
                    debug!(path = %path.display(), error = %e, "Could not write PID into lock file");
                }
                info!(path = %path.display(), pid = std::process::id(), "Acquired singleton lock");
                Ok(Some(Self {
                    path,
                    released: false,
                }))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                warn!(path = %path.display(), "Lock already held, another instance is running");
                Ok(None)
            }
            Err(e) => Err(ReminderError::Lock {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Remove the lock file. Idempotent; a missing file is not an error.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Released singleton lock"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove lock file"),
        }
    }
}

impl Drop for SingletonGuard {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_without_blocking_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orch.lock");

        let guard = SingletonGuard::acquire(&path).unwrap().expect("first acquire");
        assert!(SingletonGuard::acquire(&path).unwrap().is_none());

        guard.release();
        assert!(SingletonGuard::acquire(&path).unwrap().is_some());
    }

    #[test]
    fn drop_releases_the_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orch.lock");

        {
            let _guard = SingletonGuard::acquire(&path).unwrap().expect("acquire");
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn lock_file_contains_the_owning_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orch.lock");

        let guard = SingletonGuard::acquire(&path).unwrap().expect("acquire");
        let payload = fs::read_to_string(&path).unwrap();
        assert_eq!(payload, std::process::id().to_string());
        guard.release();
    }
}
