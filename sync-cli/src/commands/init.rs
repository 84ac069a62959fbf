//! Write a configuration file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{Config, ShareConfig};

/// Values collected from the command line.
#[derive(Debug, Default)]
pub struct InitOptions {
    /// Base URL of the service.
    pub base_url: String,
    /// Account name.
    pub username: String,
    /// Password to store in the file, if any.
    pub password: Option<String>,
    /// Local mount point override.
    pub mount_point: Option<PathBuf>,
    /// Remote base override.
    pub remote_base: Option<String>,
    /// Shares to mount, in order.
    pub shares: Vec<String>,
    /// Chunk size override.
    pub chunk_size: Option<usize>,
    /// Timeout override in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Overwrite an existing file.
    pub force: bool,
}

/// Run the init command.
pub async fn run(config_path: &Path, options: InitOptions) -> Result<()> {
    if config_path.exists() && !options.force {
        anyhow::bail!(
            "Configuration already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let mut config = Config::new(&options.base_url, &options.username);
    config.server.password = options.password;
    if let Some(timeout_ms) = options.timeout_ms {
        config.server.timeout_ms = timeout_ms;
    }
    if let Some(mount_point) = options.mount_point {
        config.local.mount_point = mount_point;
    }
    if let Some(remote_base) = options.remote_base {
        config.local.remote_base = remote_base;
    }
    if let Some(chunk_size) = options.chunk_size {
        config.transfer.chunk_size = chunk_size;
    }
    config.shares = options
        .shares
        .into_iter()
        .map(|name| ShareConfig { name })
        .collect();

    config.validate()?;
    config.save(config_path).await?;

    println!("Configuration written to {}", config_path.display());
    println!();
    println!("  Server:      {}", config.server.base_url);
    println!("  User:        {}", config.server.username);
    println!("  Mount point: {}", config.local.mount_point.display());
    println!("  Remote base: {}", config.local.remote_base);
    println!(
        "  Password:    {}",
        if config.server.password.is_some() { "stored" } else { "not stored" }
    );
    println!();
    println!("Next steps:");
    println!("  1. Check the connection: fbsync login");
    println!("  2. Push the mount point: fbsync push");

    Ok(())
}

/// Prompt for the account password with echo suppression.
pub fn prompt_password(username: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("Password for {}: ", username))
        .context("Failed to read password")?;
    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }
    Ok(password)
}
