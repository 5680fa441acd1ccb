//! Content hashing for gtrack.
//!
//! Every stored object is framed as `"<kind> <payload-length>\0" + payload`
//! and addressed by the SHA-1 digest of that framed form. [`ContentHasher`]
//! owns both halves of that rule so the store and the tests agree on it.

pub mod hasher;

pub use hasher::ContentHasher;
