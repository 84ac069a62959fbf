//! Configuration management for fbsync.
//!
//! Configuration is loaded from a TOML file (default: `fbsync.toml`).

use anyhow::{Context, Result};
use fbsync_client::ClientConfig;
use fbsync_types::api::{DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration for fbsync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service connection.
    pub server: ServerConfig,
    /// Local side of the sync.
    #[serde(default)]
    pub local: LocalConfig,
    /// Transfer tuning.
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Shares mounted by `fbsync mount`, in order.
    #[serde(default)]
    pub shares: Vec<ShareConfig>,
}

/// Service connection.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the service.
    pub base_url: String,
    /// Account name.
    pub username: String,
    /// Account password (optional; FBSYNC_PASSWORD or --password take precedence).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Network timeout in milliseconds (default: 20000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Local side of the sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Local directory the store is rooted at (default: /sdcard).
    #[serde(default = "default_mount_point")]
    pub mount_point: PathBuf,
    /// Remote directory pushes go to and pulls list (default: /).
    #[serde(default = "default_remote_base")]
    pub remote_base: String,
}

/// Transfer tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Chunk size in bytes (default: 1024).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

/// A share to mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Share name.
    pub name: String,
}

// Default value functions
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_mount_point() -> PathBuf {
    PathBuf::from(fbsync_client::config::DEFAULT_MOUNT_POINT)
}

fn default_remote_base() -> String {
    fbsync_client::config::DEFAULT_REMOTE_BASE.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            mount_point: default_mount_point(),
            remote_base: default_remote_base(),
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

// Don't leak the password in debug output
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl Config {
    /// Create a configuration with defaults for everything but the server.
    pub fn new(base_url: &str, username: &str) -> Self {
        Self {
            server: ServerConfig {
                base_url: base_url.to_string(),
                username: username.to_string(),
                password: None,
                timeout_ms: default_timeout_ms(),
            },
            local: LocalConfig::default(),
            transfer: TransferConfig::default(),
            shares: Vec::new(),
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.server.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "server.base_url must start with http:// or https://, got {:?}",
                url
            )));
        }
        if self.server.username.is_empty() {
            return Err(ConfigError::Invalid("server.username is empty".to_string()));
        }
        if self.server.timeout_ms == 0 {
            return Err(ConfigError::Invalid("server.timeout_ms must be positive".to_string()));
        }
        if self.transfer.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "transfer.chunk_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration as TOML, readable by the owner only.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        tokio::fs::write(path, contents)
            .await
            .context("Failed to save configuration")?;
        set_file_permissions_0600(path).await?;
        Ok(())
    }

    /// Pick the password: an explicit value (flag or FBSYNC_PASSWORD) wins
    /// over the configuration file.
    pub fn resolve_password(&self, explicit: Option<&str>) -> Result<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.server.password.clone())
            .context("No password configured. Pass --password, set FBSYNC_PASSWORD, or run 'fbsync init --save-password'.")
    }

    /// Build the library configuration.
    pub fn to_client_config(&self, password: &str) -> ClientConfig {
        ClientConfig::new(&self.server.base_url, &self.server.username, password)
            .with_mount_point(&self.local.mount_point)
            .with_remote_base(&self.local.remote_base)
            .with_shares(self.shares.iter().map(|s| s.name.as_str()))
            .with_chunk_size(self.transfer.chunk_size)
            .with_timeout(Duration::from_millis(self.server.timeout_ms))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {}: {source}", .path.display())]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {}: {source}", .path.display())]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Parsed values are unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[server]
base_url = "http://192.168.4.1"
username = "admin"
password = "secret"
timeout_ms = 5000

[local]
mount_point = "/mnt/sd"
remote_base = "/backup"

[transfer]
chunk_size = 4096

[[shares]]
name = "media"

[[shares]]
name = "docs"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.base_url, "http://192.168.4.1");
        assert_eq!(config.server.password.as_deref(), Some("secret"));
        assert_eq!(config.server.timeout_ms, 5000);
        assert_eq!(config.local.mount_point, PathBuf::from("/mnt/sd"));
        assert_eq!(config.local.remote_base, "/backup");
        assert_eq!(config.transfer.chunk_size, 4096);
        let shares: Vec<_> = config.shares.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(shares, vec!["media", "docs"]);
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let toml = r#"
[server]
base_url = "http://host"
username = "u"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.server.password.is_none());
        assert_eq!(config.server.timeout_ms, 20_000);
        assert_eq!(config.local.mount_point, PathBuf::from("/sdcard"));
        assert_eq!(config.local.remote_base, "/");
        assert_eq!(config.transfer.chunk_size, 1024);
        assert!(config.shares.is_empty());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = Config::new("ftp://host", "u");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.server.base_url = "http://host".to_string();
        assert!(config.validate().is_ok());

        config.transfer.chunk_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempdir().unwrap();
        let result = Config::from_file(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fbsync.toml");
        std::fs::write(&path, "[server\nbase_url = ").unwrap();
        let result = Config::from_file(&path);
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fbsync.toml");
        let mut config = Config::new("http://host", "u");
        config.shares.push(ShareConfig {
            name: "media".to_string(),
        });
        config.save(&path).await.unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.server.base_url, "http://host");
        assert_eq!(loaded.shares, config.shares);
        assert!(!std::fs::read_to_string(&path).unwrap().contains("password"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn config_file_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let path = dir.path().join("fbsync.toml");
        Config::new("http://host", "u").save(&path).await.unwrap();

        let perms = tokio::fs::metadata(&path).await.unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600, "file should be 0600");
    }

    #[test]
    fn explicit_password_wins() {
        let mut config = Config::new("http://host", "u");
        assert!(config.resolve_password(None).is_err());

        config.server.password = Some("from-file".to_string());
        assert_eq!(config.resolve_password(None).unwrap(), "from-file");
        assert_eq!(config.resolve_password(Some("flag")).unwrap(), "flag");
    }

    #[test]
    fn debug_hides_password() {
        let mut config = Config::new("http://host", "u");
        config.server.password = Some("hunter2".to_string());
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn client_config_carries_settings() {
        let mut config = Config::new("http://host", "u");
        config.transfer.chunk_size = 512;
        config.server.timeout_ms = 1500;
        let client = config.to_client_config("p");
        assert_eq!(client.chunk_size, 512);
        assert_eq!(client.timeout, Duration::from_millis(1500));
        assert_eq!(client.credentials.username(), "u");
    }
}
