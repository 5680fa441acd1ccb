//! Error types for the worktree crate.

use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while scanning, building or checking out.
#[derive(Debug, thiserror::Error)]
pub enum WorktreeError {
    /// A file or directory could not be read during a strict scan.
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A name cannot be stored because it is not valid UTF-8.
    #[error("file name is not valid UTF-8: {}", path.display())]
    NonUtf8Name { path: PathBuf },

    /// Reading or writing objects failed.
    #[error("store error: {0}")]
    Store(#[from] gt_store::StoreError),

    /// Replacing the working directory failed part-way.
    ///
    /// When `restored` is `false` the rollback failed too and the previous
    /// contents are left in `backup`.
    #[error("working directory swap failed: {source}{}", backup_note(backup))]
    SwapFailed {
        restored: bool,
        backup: Option<PathBuf>,
        #[source]
        source: io::Error,
    },

    /// Any other filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn backup_note(backup: &Option<PathBuf>) -> String {
    match backup.as_deref().map(Path::display) {
        Some(path) => format!("; previous contents kept in {path}"),
        None => "; working directory restored".to_string(),
    }
}

/// Convenience alias for worktree results.
pub type WorktreeResult<T> = Result<T, WorktreeError>;
