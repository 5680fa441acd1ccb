//! Head reference management for gtrack.
//!
//! gtrack keeps a single linear history, so the only reference is the head:
//! a pointer to the most recently committed (or checked-out) commit. It lives
//! outside the object store and is overwritten, never appended.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`types`] -- The [`Head`] value
//! - [`traits`] -- The [`RefStore`] trait defining the storage interface
//! - [`file`] -- [`FileRefStore`], the `HEAD` text file
//! - [`memory`] -- In-memory [`InMemoryRefStore`] for tests

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use file::FileRefStore;
pub use memory::InMemoryRefStore;
pub use traits::RefStore;
pub use types::Head;
