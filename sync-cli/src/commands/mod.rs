//! CLI command implementations.

pub mod init;
pub mod login;
pub mod mount;
pub mod pull;
pub mod push;
pub mod remote;
pub mod status;

use anyhow::{Context, Result};
use fbsync_client::{FsStore, HttpTransport, SyncOrchestrator};
use std::path::Path;

use crate::config::Config;

/// Load the configuration file, pointing at `fbsync init` when it is missing.
pub fn load_config(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        anyhow::bail!(
            "No configuration at {}. Run 'fbsync init' first.",
            config_path.display()
        );
    }
    Config::from_file(config_path).context("Failed to load configuration")
}

/// Build an HTTP-backed client from a loaded configuration.
pub fn connect(
    config: &Config,
    password: Option<&str>,
) -> Result<SyncOrchestrator<HttpTransport, FsStore>> {
    let password = config.resolve_password(password)?;
    SyncOrchestrator::with_http(&config.to_client_config(&password))
        .context("Failed to create HTTP transport")
}
