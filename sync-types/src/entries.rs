//! Configured shares and local directory entries.

use serde::{Deserialize, Serialize};

/// A named network share the client mounts through the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShareDescriptor {
    /// Share name as known to the service.
    #[serde(rename = "name")]
    pub share_name: String,
}

impl ShareDescriptor {
    /// Create a share descriptor.
    pub fn new(name: &str) -> Self {
        Self {
            share_name: name.to_string(),
        }
    }
}

/// One entry produced by enumerating a local directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// File name (no directory component).
    pub name: String,
    /// True only for regular files; directories, symlinks and
    /// special files are false.
    pub is_regular_file: bool,
}

impl DirectoryEntry {
    /// Entry for a regular file.
    pub fn file(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_regular_file: true,
        }
    }

    /// Entry for anything that is not a regular file.
    pub fn other(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_regular_file: false,
        }
    }
}
