//! Error types for the ledger crate

use thiserror::Error;

/// Result type for resource/transaction operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur managing resources and transactions
#[derive(Error, Debug)]
pub enum StoreError {
    /// A second write transaction was requested while one is active on
    /// the same resource. Caller-recoverable: retry or wait.
    #[error("a write transaction is already active on this resource")]
    WriterBusy,

    /// Requested revision exceeds the latest committed revision.
    #[error("revision {requested} not found (latest is {latest})")]
    RevisionNotFound { requested: u64, latest: u64 },

    /// Resource already exists at creation time.
    #[error("resource already exists: {0}")]
    ResourceExists(String),

    /// Resource does not exist at open time.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// Operation not valid for the targeted node (wrong kind, missing
    /// node, or structural constraint).
    #[error("illegal operation: {0}")]
    IllegalOperation(String),

    /// Core error wrapper
    #[error("core error: {0}")]
    Core(#[from] arbor_db_core::Error),

    /// Versioning error wrapper
    #[error("versioning error: {0}")]
    Revision(#[from] arbor_db_revision::RevisionError),
}

impl StoreError {
    /// Create an illegal operation error
    pub fn illegal(msg: impl Into<String>) -> Self {
        StoreError::IllegalOperation(msg.into())
    }
}
