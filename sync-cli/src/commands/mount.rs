//! Mount the configured shares.

use anyhow::{Context, Result};
use fbsync_client::{LocalStore, SyncOrchestrator, Transport};
use std::path::Path;

use super::{connect, load_config};

/// Run the mount command.
pub async fn run(config_path: &Path, password: Option<&str>) -> Result<()> {
    let mut client = connect(&load_config(config_path)?, password)?;
    let mounted = do_mount(&mut client).await?;
    if mounted == 0 {
        println!("No shares configured.");
    } else {
        println!("Mounted {} share(s).", mounted);
    }
    Ok(())
}

/// Mount every configured share, returning how many there were.
pub async fn do_mount<T: Transport, S: LocalStore>(
    client: &mut SyncOrchestrator<T, S>,
) -> Result<usize> {
    client.mount_shares().await.context("Mount failed")?;
    Ok(client.shares().shares().len())
}
