//! Working-directory handling for gtrack.
//!
//! Three steps connect the files on disk to the object store:
//!
//! - [`Scanner`] reads the working directory into an in-memory [`Snapshot`]
//! - [`TreeBuilder`] turns a snapshot into blob and tree objects
//! - [`Checkout`] materializes a tree into a staging area and swaps it in
//!
//! All three walk directories with explicit work-lists, so depth is bounded by
//! memory rather than the call stack. A metadata directory is never read by the
//! scanner or written by checkout, at any depth. Configured excludes are left
//! alone at the top level.

pub mod builder;
pub mod checkout;
pub mod error;
pub mod snapshot;

pub use builder::{BuiltTree, TreeBuilder};
pub use checkout::{leftover_scratch, materialize, Checkout, CheckoutReport, SCRATCH_PREFIX};
pub use error::{WorktreeError, WorktreeResult};
pub use snapshot::{Directory, File, ScanPolicy, Scanner, Snapshot};
