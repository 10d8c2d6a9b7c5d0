//! # Arbor DB Revision
//!
//! The versioning policy layer: given a page's historical fragments this
//! crate materializes the logical page for a revision, and given an
//! outgoing page image it decides what a commit physically persists — a
//! full copy, an incremental delta, a differential against the last full
//! dump, or a sliding-snapshot delta with condensation.
//!
//! Fragments are treated as opaque slot/byte pairs; no record is ever
//! decoded here.

mod error;
mod strategy;

pub use error::{Result, RevisionError};
pub use strategy::{plan_commit, reconstruct, window_len};
