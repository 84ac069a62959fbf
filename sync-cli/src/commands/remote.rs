//! Single remote operations: ls, info, upload, download, rm, mv, mkdir.

use anyhow::{Context, Result};
use fbsync_client::{LocalStore, SyncOrchestrator, TransferOutcome, Transport};
use fbsync_types::TransferRequest;
use std::path::Path;

use super::{connect, load_config};

/// Run one transfer request against the configured service.
pub async fn run(config_path: &Path, password: Option<&str>, request: TransferRequest) -> Result<()> {
    let mut client = connect(&load_config(config_path)?, password)?;
    let outcome = execute(&mut client, &request).await?;

    match outcome {
        TransferOutcome::Body(body) => println!("{}", render_body(&body)),
        TransferOutcome::Bytes(n) => {
            println!("{} {} ({} bytes)", request.operation.as_str(), request.remote_path, n)
        }
        TransferOutcome::Done => println!("{} {}", request.operation.as_str(), request.remote_path),
    }
    Ok(())
}

/// Execute a request through the client's transfer engine.
pub async fn execute<T: Transport, S: LocalStore>(
    client: &mut SyncOrchestrator<T, S>,
    request: &TransferRequest,
) -> Result<TransferOutcome> {
    client
        .engine_mut()
        .execute(request)
        .await
        .with_context(|| format!("{} {} failed", request.operation.as_str(), request.remote_path))
}

/// Pretty-print JSON bodies; anything else is shown as text.
pub fn render_body(body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => serde_json::to_string_pretty(&value)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned()),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}
