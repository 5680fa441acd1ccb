//! The commit manager.

use gt_refs::Head;
use gt_store::{Commit, ObjectStore};
use gt_types::ObjectId;
use gt_worktree::{Directory, TreeBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SdkResult;

/// A commit together with its fingerprint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: ObjectId,
    #[serde(flatten)]
    pub commit: Commit,
}

impl CommitRecord {
    /// Head after this commit.
    pub fn head(&self) -> Head {
        Head::At(self.id)
    }
}

/// Store `root` as a tree and a commit on top of `head`.
///
/// The parent is exactly `head`'s commit. Nothing here reads or writes the
/// head reference itself; the caller moves it to [`CommitRecord::head`] once
/// the commit is stored.
pub fn commit_snapshot<S: ObjectStore + ?Sized>(
    store: &S,
    head: Head,
    root: &Directory,
    message: &str,
    timestamp: i64,
) -> SdkResult<CommitRecord> {
    // Reject the message before any blob is written.
    Commit::validate_message(message)?;

    let built = TreeBuilder::new(store).build(root)?;
    let commit = Commit::new(built.id, head.commit(), timestamp, message);
    let id = store.write(&commit.to_stored_object()?)?;
    debug!(
        commit = %id.short_hex(),
        tree = %built.id.short_hex(),
        blobs = built.blobs,
        trees = built.trees,
        "commit stored"
    );

    Ok(CommitRecord { id, commit })
}
