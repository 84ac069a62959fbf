//! Upload every regular file of a local directory.

use anyhow::{Context, Result};
use fbsync_client::{LocalStore, SyncOrchestrator, Transport};
use fbsync_core::SyncReport;
use std::path::{Path, PathBuf};

use super::{connect, load_config};

/// Run the push command.
///
/// `dir` defaults to the configured mount point.
pub async fn run(config_path: &Path, password: Option<&str>, dir: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let dir = dir.unwrap_or_else(|| config.local.mount_point.clone());
    let mut client = connect(&config, password)?;

    println!("Pushing {} to {}...", dir.display(), config.local.remote_base);
    let report = do_push(&mut client, &dir).await?;
    print_report(&report);

    if !report.is_clean() {
        anyhow::bail!("{} of {} file(s) failed", report.failure_count(), report.attempted());
    }
    Ok(())
}

/// Run one push pass.
pub async fn do_push<T: Transport, S: LocalStore>(
    client: &mut SyncOrchestrator<T, S>,
    dir: &Path,
) -> Result<SyncReport> {
    client
        .sync_to_remote(dir)
        .await
        .with_context(|| format!("Push of {} stopped", dir.display()))
}

fn print_report(report: &SyncReport) {
    for name in &report.transferred {
        println!("  uploaded  {}", name);
    }
    for failure in &report.failed {
        println!("  FAILED    {}: {}", failure.name, failure.reason);
    }
    println!();
    println!(
        "{} uploaded, {} failed, {} skipped",
        report.transferred.len(),
        report.failure_count(),
        report.skipped
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbsync_client::{ClientConfig, FsStore, MockTransport};
    use tempfile::tempdir;

    #[tokio::test]
    async fn push_uploads_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"bb").unwrap();
        let transport = MockTransport::new();
        let config = ClientConfig::new("http://host", "admin", "admin")
            .with_mount_point(dir.path())
            .with_remote_base("/backup");
        let mut client =
            SyncOrchestrator::from_config(&config, transport.clone(), FsStore::new(dir.path()));

        let report = do_push(&mut client, dir.path()).await.unwrap();

        assert_eq!(report.transferred, vec!["a.txt", "b.txt"]);
        assert_eq!(transport.file("/backup/b.txt"), Some(b"bb".to_vec()));
    }

    #[tokio::test]
    async fn push_reports_per_file_failures() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        let transport = MockTransport::new();
        transport.fail_path("/a.txt", 500);
        let config = ClientConfig::new("http://host", "admin", "admin");
        let mut client =
            SyncOrchestrator::from_config(&config, transport.clone(), FsStore::new(dir.path()));

        let report = do_push(&mut client, dir.path()).await.unwrap();

        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.transferred, vec!["b.txt"]);
    }

    #[tokio::test]
    async fn push_of_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let config = ClientConfig::new("http://host", "admin", "admin");
        let mut client =
            SyncOrchestrator::from_config(&config, MockTransport::new(), FsStore::new(dir.path()));

        let result = do_push(&mut client, &dir.path().join("missing")).await;
        assert!(result.is_err());
    }
}
