//! The [`RefStore`] trait defining the reference storage interface.

use gt_types::ObjectId;

use crate::error::Result;
use crate::types::Head;

/// Storage backend for the head reference.
///
/// Implementations replace the head atomically: a reader sees either the old
/// or the new value, never a partial write.
pub trait RefStore: Send + Sync {
    /// Read the current head.
    ///
    /// Returns `Ok(Head::Unborn)` if no commit has been recorded yet.
    fn head(&self) -> Result<Head>;

    /// Point head at `commit`, overwriting the previous value.
    fn set_head(&self, commit: &ObjectId) -> Result<()>;
}
