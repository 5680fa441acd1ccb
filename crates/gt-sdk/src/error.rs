use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("not a gtrack repository (no {} directory in {})", crate::paths::META_DIR, .0.display())]
    NotInitialized(PathBuf),

    #[error("repository already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("invalid fingerprint {input:?}: {reason}")]
    InvalidFingerprint { input: String, reason: String },

    #[error("repository is locked by another gtrack process ({})", .0.display())]
    Locked(PathBuf),

    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] gt_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] gt_refs::RefError),

    #[error("worktree error: {0}")]
    Worktree(#[from] gt_worktree::WorktreeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
