//! Error types for arbor-db-core

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// A record tag byte does not map to a known node kind.
    ///
    /// Fatal for the containing read: record payloads are length-implicit
    /// per kind, so the decoder must not skip bytes.
    #[error("unknown node kind tag: 0x{0:02x}")]
    UnknownNodeKind(u8),

    /// Malformed wire data: bad DeweyID framing, truncated record payload,
    /// invalid fragment header, and the like. Not retried.
    #[error("corrupt format: {0}")]
    CorruptFormat(String),

    /// Storage-related errors
    #[error("storage error: {0}")]
    Storage(String),

    /// Resource or blob not found
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O error from the persistence backend
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON parsing error (serde_json)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid resource configuration
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a corrupt format error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptFormat(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create an I/O error
    pub fn io(msg: impl Into<String>) -> Self {
        Error::Io(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

#[cfg(feature = "native")]
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(e.to_string())
        } else {
            Error::Io(e.to_string())
        }
    }
}
