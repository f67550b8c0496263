//! Error types for agora-reputation.

use thiserror::Error;

/// Result type for reputation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scoring or persisting reputation.
#[derive(Debug, Error)]
pub enum Error {
    /// The user a recalculation was requested for does not exist.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(String),
}
