//! A single transfer call against the service.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::RequestError;

/// Operation kind carried by a [`TransferRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// List a remote directory
    List,
    /// Push a local file to the service
    Upload,
    /// Fetch a remote file into local storage
    Download,
    /// Remove a remote file or directory
    Delete,
    /// Move a remote file or directory
    Rename,
    /// Create a remote directory
    Mkdir,
    /// Fetch metadata for a remote path
    Info,
}

impl Operation {
    /// Lowercase name, as used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Upload => "upload",
            Operation::Download => "download",
            Operation::Delete => "delete",
            Operation::Rename => "rename",
            Operation::Mkdir => "mkdir",
            Operation::Info => "info",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transfer call, constructed per call and not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// What to do.
    pub operation: Operation,
    /// Path on the service, starting with `/`.
    pub remote_path: String,
    /// Local file (upload source, download target).
    pub local_path: Option<PathBuf>,
    /// New remote path (rename only).
    pub destination_path: Option<String>,
}

impl TransferRequest {
    fn remote(operation: Operation, remote_path: &str) -> Self {
        Self {
            operation,
            remote_path: remote_path.to_string(),
            local_path: None,
            destination_path: None,
        }
    }

    /// List a remote directory.
    pub fn list(remote_path: &str) -> Self {
        Self::remote(Operation::List, remote_path)
    }

    /// Upload `local_path` to `remote_path`.
    pub fn upload(local_path: impl AsRef<Path>, remote_path: &str) -> Self {
        Self {
            local_path: Some(local_path.as_ref().to_path_buf()),
            ..Self::remote(Operation::Upload, remote_path)
        }
    }

    /// Download `remote_path` into `local_path`.
    pub fn download(remote_path: &str, local_path: impl AsRef<Path>) -> Self {
        Self {
            local_path: Some(local_path.as_ref().to_path_buf()),
            ..Self::remote(Operation::Download, remote_path)
        }
    }

    /// Delete a remote path.
    pub fn delete(remote_path: &str) -> Self {
        Self::remote(Operation::Delete, remote_path)
    }

    /// Rename `remote_path` to `destination`.
    pub fn rename(remote_path: &str, destination: &str) -> Self {
        Self {
            destination_path: Some(destination.to_string()),
            ..Self::remote(Operation::Rename, remote_path)
        }
    }

    /// Create a remote directory.
    pub fn mkdir(remote_path: &str) -> Self {
        Self::remote(Operation::Mkdir, remote_path)
    }

    /// Fetch metadata for a remote path.
    pub fn info(remote_path: &str) -> Self {
        Self::remote(Operation::Info, remote_path)
    }

    /// Check that the optional fields required by the operation are present.
    pub fn validate(&self) -> Result<(), RequestError> {
        match self.operation {
            Operation::Upload | Operation::Download if self.local_path.is_none() => {
                Err(RequestError::MissingLocalPath(self.operation.as_str()))
            }
            Operation::Rename if self.destination_path.is_none() => {
                Err(RequestError::MissingDestination)
            }
            _ => Ok(()),
        }
    }
}
