//! The history walker.

use gt_store::ObjectStore;
use gt_types::ObjectId;
use tracing::warn;

use crate::commit::CommitRecord;

/// One step of a history walk.
pub type LogEntry = CommitRecord;

/// Why a walk ended before reaching a root commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Truncation {
    /// The commit that could not be read.
    pub at: ObjectId,
    pub reason: String,
}

/// Lazily follows parent links, newest first.
///
/// A missing or unreadable commit ends the walk instead of failing it: the
/// commits already yielded stay valid, the problem is logged, and
/// [`History::truncation`] reports where it happened.
pub struct History<'s, S: ObjectStore + ?Sized> {
    store: &'s S,
    next: Option<ObjectId>,
    truncation: Option<Truncation>,
}

impl<'s, S: ObjectStore + ?Sized> History<'s, S> {
    /// Walk from `start`; `None` yields nothing.
    pub fn new(store: &'s S, start: Option<ObjectId>) -> Self {
        Self {
            store,
            next: start,
            truncation: None,
        }
    }

    pub fn truncation(&self) -> Option<&Truncation> {
        self.truncation.as_ref()
    }
}

impl<S: ObjectStore + ?Sized> Iterator for History<'_, S> {
    type Item = LogEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        match self.store.read_commit(&id) {
            Ok(commit) => {
                self.next = commit.parent;
                Some(CommitRecord { id, commit })
            }
            Err(e) => {
                warn!(commit = %id.short_hex(), error = %e, "history truncated");
                self.truncation = Some(Truncation {
                    at: id,
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}
