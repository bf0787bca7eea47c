//! Advisory file lock guarding read-modify-write cycles
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on
//! Windows). The lock is held by an open handle on a sidecar `.lock` file and
//! released on drop.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(10);
const MAX_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Exclusive lock on a data file, held until dropped
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Acquire the lock, retrying with exponential backoff until `timeout`.
    ///
    /// Returns `io::ErrorKind::TimedOut` if another holder keeps the lock
    /// past the deadline.
    pub fn acquire(lock_path: &Path, timeout: Duration) -> io::Result<Self> {
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(lock_path)?;

        let deadline = Instant::now() + timeout;
        let mut retry_delay = INITIAL_RETRY_DELAY;

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    log::debug!("Acquired lock {}", lock_path.display());
                    return Ok(Self {
                        file,
                        path: lock_path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if Instant::now() >= deadline {
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            format!("timed out waiting for lock {}", lock_path.display()),
                        ));
                    }
                    thread::sleep(retry_delay);
                    retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            log::warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}
