//! Client error types.
//!
//! Every operation returns an explicit `Result`. The enums mirror the layers:
//! [`AuthError`] for the session, [`TransferError`] for individual calls and
//! [`SyncError`] for a whole sync pass.

use std::path::PathBuf;
use thiserror::Error;

use crate::transport::TransportError;
use fbsync_types::{Operation, RequestError};

/// Why a login or renewal did not succeed.
#[derive(Debug, Error)]
pub enum FailureCause {
    /// The service answered with an unexpected status.
    #[error("status {0}")]
    Status(u16),

    /// Login returned 200 without a usable token header.
    #[error("response carried no token")]
    MissingToken,

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The request body could not be built.
    #[error("invalid request: {0}")]
    Request(#[from] RequestError),
}

/// Session errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login was rejected with 401.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Login failed for another reason.
    #[error("login failed: {0}")]
    LoginFailed(FailureCause),

    /// Renewal failed with a status other than 200/401, or did not complete.
    #[error("renew failed: {0}")]
    RenewFailed(FailureCause),
}

/// Transfer errors.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Authentication before the call failed.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The local source file could not be opened.
    #[error("cannot open {}: {source}", .path.display())]
    LocalOpenError {
        /// File that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The local target file could not be created.
    #[error("cannot create {}: {source}", .path.display())]
    LocalCreateError {
        /// File that was created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing an open local file failed.
    #[error("i/o error on {}: {source}", .path.display())]
    LocalIo {
        /// File being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Listing answered with a non-200 status.
    #[error("list failed with status {0}")]
    ListFailed(u16),

    /// Upload answered with a non-200 status.
    #[error("upload failed with status {0}")]
    UploadFailed(u16),

    /// The download stream broke before a clean end.
    #[error("download failed: {0}")]
    DownloadFailed(TransportError),

    /// A chunk was not completely written.
    #[error("partial write: {written} of {expected} bytes")]
    PartialWrite {
        /// Bytes accepted.
        written: usize,
        /// Bytes offered.
        expected: usize,
    },

    /// A metadata call answered with a non-200 status.
    #[error("{operation} failed with status {status}")]
    RequestFailed {
        /// Operation attempted.
        operation: Operation,
        /// Status received.
        status: u16,
    },

    /// A share request answered with a non-200 status.
    #[error("share {share} failed with status {status}")]
    ShareFailed {
        /// Share name.
        share: String,
        /// Status received.
        status: u16,
    },

    /// The transfer request was missing a required field.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    /// The request did not complete.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl TransferError {
    /// Status code carried by the error, if the service answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransferError::ListFailed(status) | TransferError::UploadFailed(status) => {
                Some(*status)
            }
            TransferError::RequestFailed { status, .. }
            | TransferError::ShareFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the service rejected the token (401).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Errors that stop a whole sync pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local directory could not be opened or enumerated.
    #[error("cannot read directory {}: {source}", .path.display())]
    LocalDirectory {
        /// Directory being enumerated.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A transfer that the pass depends on failed.
    #[error(transparent)]
    Transfer(#[from] TransferError),
}
