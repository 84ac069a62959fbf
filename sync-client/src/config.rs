//! Client configuration.

use fbsync_types::api::{DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT_MS};
use fbsync_types::{Credentials, ShareDescriptor};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default local mount point.
pub const DEFAULT_MOUNT_POINT: &str = "/sdcard";

/// Default remote directory that sync passes target.
pub const DEFAULT_REMOTE_BASE: &str = "/";

/// Configuration for the sync client components.
///
/// Built once and handed to each component; nothing here is global.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL, e.g. `http://192.168.4.1`.
    pub base_url: String,
    /// Login credentials.
    pub credentials: Credentials,
    /// Local directory the store is rooted at.
    pub mount_point: PathBuf,
    /// Remote directory that uploads go to and listings come from.
    pub remote_base: String,
    /// Shares mounted by `mount_all`, in order.
    pub shares: Vec<ShareDescriptor>,
    /// Transfer chunk size in bytes.
    pub chunk_size: usize,
    /// Timeout applied to each network step.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration with default paths, chunk size and timeout.
    pub fn new(base_url: &str, username: &str, password: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            credentials: Credentials::new(username, password),
            mount_point: PathBuf::from(DEFAULT_MOUNT_POINT),
            remote_base: DEFAULT_REMOTE_BASE.to_string(),
            shares: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Set the local mount point.
    pub fn with_mount_point(mut self, mount_point: impl Into<PathBuf>) -> Self {
        self.mount_point = mount_point.into();
        self
    }

    /// Set the remote base directory.
    pub fn with_remote_base(mut self, remote_base: &str) -> Self {
        self.remote_base = remote_base.to_string();
        self
    }

    /// Set the shares to mount.
    pub fn with_shares<I, S>(mut self, shares: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.shares = shares
            .into_iter()
            .map(|name| ShareDescriptor::new(name.as_ref()))
            .collect();
        self
    }

    /// Set the chunk size. Zero is raised to one byte.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the network timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// Config dump; the password never appears
impl fmt::Display for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shares: Vec<&str> = self.shares.iter().map(|s| s.share_name.as_str()).collect();
        writeln!(f, "base_url:    {}", self.base_url)?;
        writeln!(f, "username:    {}", self.credentials.username())?;
        writeln!(f, "mount_point: {}", self.mount_point.display())?;
        writeln!(f, "remote_base: {}", self.remote_base)?;
        writeln!(f, "shares:      [{}]", shares.join(", "))?;
        writeln!(f, "chunk_size:  {}", self.chunk_size)?;
        write!(f, "timeout_ms:  {}", self.timeout.as_millis())
    }
}
