//! Check credentials against the service.

use anyhow::{Context, Result};
use fbsync_client::{LocalStore, SyncOrchestrator, Transport};
use std::path::Path;

use super::{connect, load_config};

/// Run the login command.
pub async fn run(config_path: &Path, password: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let mut client = connect(&config, password)?;

    do_login(&mut client).await?;

    println!(
        "Logged in to {} as {}",
        config.server.base_url, config.server.username
    );
    Ok(())
}

/// Force a fresh login, ignoring any token already held.
pub async fn do_login<T: Transport, S: LocalStore>(
    client: &mut SyncOrchestrator<T, S>,
) -> Result<()> {
    client
        .engine_mut()
        .session_mut()
        .login()
        .await
        .context("Login failed")
}
