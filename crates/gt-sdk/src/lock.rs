//! Exclusive repository lock.
//!
//! Mutating commands hold an OS-level advisory lock on `<meta>/lock` for their
//! whole duration. Acquisition never blocks: if another process holds the
//! lock the command fails with [`SdkError::Locked`]. The lock is released when
//! the guard is dropped.

use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use fs2::FileExt;
use tracing::debug;

use crate::error::{SdkError, SdkResult};

/// Guard holding the repository lock.
#[derive(Debug)]
pub struct RepoLock {
    path: PathBuf,
    file: File,
}

impl RepoLock {
    /// Take the lock at `path`, creating the file if needed.
    pub fn acquire(path: impl Into<PathBuf>) -> SdkResult<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "repository lock acquired");
                Ok(Self { path, file })
            }
            Err(e) if is_contended(&e) => Err(SdkError::Locked(path)),
            Err(e) => Err(e.into()),
        }
    }

}

impl Drop for RepoLock {
    fn drop(&mut self) {
        if FileExt::unlock(&self.file).is_ok() {
            debug!(path = %self.path.display(), "repository lock released");
        }
    }
}

fn is_contended(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
