//! Content-addressed object storage for gtrack.
//!
//! This crate implements a hash-keyed object store laid out like git's
//! `.git/objects/` directory. Every piece of repository data -- file contents,
//! directory listings, commits -- is stored as an immutable object identified
//! by the SHA-1 of its header-framed encoding.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw file content
//! - [`Tree`] -- directory listing mapping names to object references
//! - [`Commit`] -- root tree, parent link, timestamp and message
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`LooseObjectStore`] -- one file per object under `objects/<2>/<38>`
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Objects are written to a temporary file and renamed into place.
//! 3. Reads verify the header and the fingerprint before returning data.
//! 4. The store never deletes objects.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod loose;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use loose::LooseObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{
    validate_entry_name, Blob, Commit, EntryMode, ObjectKind, StoredObject, Tree, TreeEntry,
};
pub use traits::ObjectStore;
