//! Error types for request construction.

use thiserror::Error;

/// Errors raised while building or validating a request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Upload/download without a local path
    #[error("{0} requires a local path")]
    MissingLocalPath(&'static str),

    /// Rename without a destination
    #[error("rename requires a destination path")]
    MissingDestination,
}
