//! Error types for the feed pipeline.

use thiserror::Error;

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the feed pipeline.
///
/// Only [`Error::InvalidLimit`] ever reaches a feed caller; source failures
/// are degraded inside the pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// A query against the activity source failed.
    #[error("source query failed: {0}")]
    Source(String),

    /// Requested page size is outside the accepted bounds.
    #[error("invalid limit {0}: must be between 5 and 100")]
    InvalidLimit(u32),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
