//! Foundation types for gtrack.
//!
//! This crate provides the fingerprint type every other gtrack crate uses to
//! address stored objects.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (SHA-1, 40 hex characters)
//! - [`TypeError`] -- Parsing failures for fingerprints

pub mod error;
pub mod object;

pub use error::TypeError;
pub use object::ObjectId;
