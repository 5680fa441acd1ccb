//! High-level repository API for gtrack.
//!
//! [`Repository`] ties the object store, the head reference and the working
//! directory together and exposes the user-facing operations: `init`,
//! `commit`, `checkout`, `log` and `cat`. The commit manager and the history
//! walker are also usable on their own against any [`ObjectStore`].

pub mod commit;
pub mod config;
pub mod error;
pub mod history;
pub mod lock;
pub mod paths;
pub mod repository;

pub use commit::{commit_snapshot, CommitRecord};
pub use config::{CoreConfig, RepoConfig, WorktreeConfig};
pub use error::{SdkError, SdkResult};
pub use history::{History, LogEntry, Truncation};
pub use lock::RepoLock;
pub use paths::{RepoPaths, META_DIR};
pub use repository::{parse_fingerprint, CheckoutOutcome, CommitOutcome, ObjectContent, Repository};

// Re-export key types
pub use gt_refs::Head;
pub use gt_store::{Blob, Commit, EntryMode, ObjectKind, ObjectStore, Tree, TreeEntry};
pub use gt_types::ObjectId;
pub use gt_worktree::{CheckoutReport, ScanPolicy};
