//! Error types for the revision crate

use thiserror::Error;

/// Result type for versioning operations
pub type Result<T> = std::result::Result<T, RevisionError>;

/// Errors raised while planning or reconstructing page fragments.
///
/// Chain errors are data-level corruption: they are fatal for the read and
/// never retried.
#[derive(Error, Debug)]
pub enum RevisionError {
    /// A fragment's back-reference does not match the next-older fragment
    /// in the window.
    #[error(
        "broken fragment chain at revision {revision}: references {expected:?}, found {found:?}"
    )]
    BrokenChain {
        revision: u64,
        expected: Option<u64>,
        found: Option<u64>,
    },

    /// No terminal Full fragment exists where the strategy requires one.
    #[error("no full fragment reachable for reconstruction at revision {revision}")]
    MissingFull { revision: u64 },

    /// Reconstruction was asked to materialize a page with no fragments.
    #[error("cannot reconstruct a page from an empty fragment window")]
    EmptyWindow,

    /// Other data-level corruption
    #[error("corrupt fragment data: {0}")]
    Corrupt(String),

    /// Core error wrapper
    #[error("core error: {0}")]
    Core(#[from] arbor_db_core::Error),
}

impl RevisionError {
    /// Create a corrupt data error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        RevisionError::Corrupt(msg.into())
    }
}
