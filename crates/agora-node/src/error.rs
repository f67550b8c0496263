//! Error types for the Agora node.

use thiserror::Error;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in node operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(e: rocksdb::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<agora_feed::Error> for Error {
    fn from(e: agora_feed::Error) -> Self {
        match e {
            agora_feed::Error::InvalidLimit(_) => Error::InvalidInput(e.to_string()),
            agora_feed::Error::Serialization(e) => Error::Serialization(e),
            agora_feed::Error::Source(msg) => Error::Storage(msg),
        }
    }
}

impl From<agora_reputation::Error> for Error {
    fn from(e: agora_reputation::Error) -> Self {
        match e {
            agora_reputation::Error::UserNotFound(id) => Error::NotFound(format!("user {}", id)),
            agora_reputation::Error::Store(msg) => Error::Storage(msg),
        }
    }
}

// The store answers the feed and tier contracts; their errors carry ours as text.

impl From<Error> for agora_feed::Error {
    fn from(e: Error) -> Self {
        agora_feed::Error::Source(e.to_string())
    }
}

impl From<Error> for agora_reputation::Error {
    fn from(e: Error) -> Self {
        agora_reputation::Error::Store(e.to_string())
    }
}
