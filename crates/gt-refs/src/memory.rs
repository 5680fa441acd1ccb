//! In-memory reference store for tests.

use std::sync::{PoisonError, RwLock};

use gt_types::ObjectId;

use crate::error::Result;
use crate::traits::RefStore;
use crate::types::Head;

/// An in-memory implementation of [`RefStore`]. Data is lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    head: RwLock<Head>,
}

impl InMemoryRefStore {
    /// Create a store whose head is unborn.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for InMemoryRefStore {
    fn head(&self) -> Result<Head> {
        Ok(*self.head.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn set_head(&self, commit: &ObjectId) -> Result<()> {
        *self.head.write().unwrap_or_else(PoisonError::into_inner) = Head::At(*commit);
        Ok(())
    }
}
