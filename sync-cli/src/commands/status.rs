//! Show the effective configuration.

use anyhow::Result;
use std::path::Path;

use super::load_config;

/// Run the status command.
pub async fn run(config_path: &Path, password: Option<&str>) -> Result<()> {
    println!("=== fbsync status ===");
    println!();
    println!("Config file: {}", config_path.display());

    if !config_path.exists() {
        println!("Status:      NOT INITIALIZED");
        println!();
        println!("Run 'fbsync init --url <url> --username <name>' to initialize.");
        return Ok(());
    }

    let config = load_config(config_path)?;
    let password_source = match (password, &config.server.password) {
        (Some(_), _) => "command line or FBSYNC_PASSWORD",
        (None, Some(_)) => "config file",
        (None, None) => "missing",
    };

    // The dump never includes the password itself
    let client = config.to_client_config(password.unwrap_or_default());
    println!();
    println!("{}", client);
    println!();
    println!("password:    {}", password_source);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::tempdir;

    #[tokio::test]
    async fn status_without_config_succeeds() {
        let dir = tempdir().unwrap();
        run(&dir.path().join("fbsync.toml"), None).await.unwrap();
    }

    #[tokio::test]
    async fn status_with_config_succeeds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fbsync.toml");
        Config::new("http://host", "u").save(&path).await.unwrap();

        run(&path, Some("p")).await.unwrap();
    }

    #[tokio::test]
    async fn status_reports_broken_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fbsync.toml");
        std::fs::write(&path, "not toml [").unwrap();

        assert!(run(&path, None).await.is_err());
    }
}
