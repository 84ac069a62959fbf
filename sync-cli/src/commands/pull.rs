//! Show the listing of the remote base.

use anyhow::{Context, Result};
use fbsync_client::{LocalStore, SyncOrchestrator, Transport};
use std::path::Path;

use super::{connect, load_config};
use super::remote::render_body;

/// Run the pull command.
pub async fn run(config_path: &Path, password: Option<&str>) -> Result<()> {
    let mut client = connect(&load_config(config_path)?, password)?;
    let listing = do_pull(&mut client).await?;
    println!("{}", listing);
    Ok(())
}

/// List the remote base and render the body for display.
pub async fn do_pull<T: Transport, S: LocalStore>(
    client: &mut SyncOrchestrator<T, S>,
) -> Result<String> {
    let base = client.remote_base().to_string();
    client
        .sync_from_remote(|body| render_body(&body))
        .await
        .with_context(|| format!("Listing of {} failed", base))
}
