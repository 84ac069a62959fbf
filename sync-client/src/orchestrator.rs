//! SyncOrchestrator - batch push/pull between a local directory and the service.
//!
//! # Architecture
//!
//! ```text
//! SyncOrchestrator → TransferEngine → SessionManager → Transport → Network
//!        ↓                  ↓
//!   ShareController     LocalStore
//! ```
//!
//! Files are handled one at a time. A failing file is logged and counted in
//! the [`SyncReport`]; only an unreadable source directory stops a pass.

use std::path::Path;

use fbsync_core::routes::join_remote;
use fbsync_core::SyncReport;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{SyncError, TransferError};
use crate::session::SessionManager;
use crate::share::ShareController;
use crate::store::{FsStore, LocalStore};
use crate::transfer::{RawBody, TransferEngine};
use crate::transport::{HttpTransport, Transport, TransportError};

/// Drives the transfer engine over whole directories.
pub struct SyncOrchestrator<T: Transport, S: LocalStore> {
    engine: TransferEngine<T, S>,
    shares: ShareController,
    remote_base: String,
}

impl SyncOrchestrator<HttpTransport, FsStore> {
    /// Build a client talking HTTP to the configured service, with a store
    /// rooted at the configured mount point.
    pub fn with_http(config: &ClientConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(config.timeout)?;
        let store = FsStore::new(&config.mount_point);
        Ok(Self::from_config(config, transport, store))
    }
}

impl<T: Transport, S: LocalStore> SyncOrchestrator<T, S> {
    /// Assemble session, engine and share controller from a configuration.
    pub fn from_config(config: &ClientConfig, transport: T, store: S) -> Self {
        let session = SessionManager::new(transport, &config.base_url, config.credentials.clone());
        info!("Client initialised for {}", session.routes().base());
        debug!(
            "mount point {}, remote base {}, {} share(s)",
            config.mount_point.display(),
            config.remote_base,
            config.shares.len()
        );

        let engine = TransferEngine::new(session, store, config.chunk_size);
        Self::new(
            engine,
            ShareController::new(config.shares.clone()),
            &config.remote_base,
        )
    }

    /// Create an orchestrator around an existing engine.
    pub fn new(engine: TransferEngine<T, S>, shares: ShareController, remote_base: &str) -> Self {
        Self {
            engine,
            shares,
            remote_base: remote_base.to_string(),
        }
    }

    /// The transfer engine, for single-file operations.
    pub fn engine(&self) -> &TransferEngine<T, S> {
        &self.engine
    }

    /// Mutable access to the transfer engine.
    pub fn engine_mut(&mut self) -> &mut TransferEngine<T, S> {
        &mut self.engine
    }

    /// The share controller.
    pub fn shares(&self) -> &ShareController {
        &self.shares
    }

    /// Remote directory that passes target.
    pub fn remote_base(&self) -> &str {
        &self.remote_base
    }

    /// Upload every regular file of `local_dir` to the remote base.
    ///
    /// Directories, symlinks and special files are skipped; there is no
    /// recursion. A file whose upload answers 401 is retried once after a
    /// session renewal.
    pub async fn sync_to_remote(&mut self, local_dir: &Path) -> Result<SyncReport, SyncError> {
        let entries = self
            .engine
            .store()
            .read_dir(local_dir)
            .await
            .map_err(|source| SyncError::LocalDirectory {
                path: local_dir.to_path_buf(),
                source,
            })?;

        let mut report = SyncReport::new();
        for entry in entries {
            if !entry.is_regular_file {
                debug!("Skipping {}: not a regular file", entry.name);
                report.record_skipped();
                continue;
            }

            let local = local_dir.join(&entry.name);
            let remote = join_remote(&self.remote_base, &entry.name);
            match self.upload_with_renewal(&local, &remote).await {
                Ok(_) => report.record_success(&entry.name),
                Err(e) => {
                    warn!("Failed to upload {}: {}", entry.name, e);
                    report.record_failure(&entry.name, e);
                }
            }
        }

        info!(
            "Sync to {} finished: {} uploaded, {} failed, {} skipped",
            self.remote_base,
            report.transferred.len(),
            report.failure_count(),
            report.skipped
        );
        Ok(report)
    }

    async fn upload_with_renewal(&mut self, local: &Path, remote: &str) -> Result<u64, TransferError> {
        match self.engine.upload(local, remote).await {
            Err(e) if e.is_unauthorized() => {
                info!("Upload of {} was rejected, renewing session", remote);
                self.engine.session_mut().renew().await?;
                self.engine.upload(local, remote).await
            }
            result => result,
        }
    }

    /// List the remote base and hand the raw listing to `consumer`.
    ///
    /// Choosing files to download from the listing is left to the consumer.
    pub async fn sync_from_remote<F, R>(&mut self, consumer: F) -> Result<R, SyncError>
    where
        F: FnOnce(RawBody) -> R,
    {
        let body = self.engine.list(&self.remote_base).await?;
        debug!("Listing of {} is {} bytes", self.remote_base, body.len());
        Ok(consumer(body))
    }

    /// Mount the configured shares in order, stopping at the first failure.
    pub async fn mount_shares(&mut self) -> Result<(), TransferError> {
        self.shares.mount_all(self.engine.session_mut()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, Method};
    use tempfile::TempDir;

    fn orchestrator(
        transport: &MockTransport,
        dir: &TempDir,
        remote_base: &str,
    ) -> SyncOrchestrator<MockTransport, FsStore> {
        let config = ClientConfig::new("http://host", "u", "p")
            .with_mount_point(dir.path())
            .with_remote_base(remote_base)
            .with_shares(["A", "B", "C"]);
        SyncOrchestrator::from_config(&config, transport.clone(), FsStore::new(dir.path()))
    }

    fn write(dir: &TempDir, name: &str, data: &[u8]) {
        std::fs::write(dir.path().join(name), data).unwrap();
    }

    // ===========================================
    // Push Tests
    // ===========================================

    #[tokio::test]
    async fn uploads_only_regular_files() {
        let dir = TempDir::new().unwrap();
        let transport = MockTransport::with_account("u", "p", "tok1");
        write(&dir, "a.txt", b"a");
        write(&dir, "b.txt", b"bb");
        write(&dir, "c.txt", b"ccc");
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::create_dir(dir.path().join("other")).unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(dir.path().join("a.txt"), dir.path().join("link")).unwrap();
        let mut orchestrator = orchestrator(&transport, &dir, "/");

        let report = orchestrator.sync_to_remote(dir.path()).await.unwrap();

        assert_eq!(transport.count(Method::Post, "/api/resources"), 3);
        assert_eq!(report.transferred, vec!["a.txt", "b.txt", "c.txt"]);
        assert!(report.is_clean());
        #[cfg(unix)]
        assert_eq!(report.skipped, 3);
        assert_eq!(transport.file("/c.txt"), Some(b"ccc".to_vec()));
    }

    #[tokio::test]
    async fn uploads_go_under_remote_base() {
        let dir = TempDir::new().unwrap();
        let transport = MockTransport::with_account("u", "p", "tok1");
        write(&dir, "a.txt", b"a");
        let mut orchestrator = orchestrator(&transport, &dir, "/backup/");

        orchestrator.sync_to_remote(dir.path()).await.unwrap();

        assert_eq!(transport.file("/backup/a.txt"), Some(b"a".to_vec()));
    }

    #[tokio::test]
    async fn failed_files_do_not_stop_the_pass() {
        let dir = TempDir::new().unwrap();
        let transport = MockTransport::with_account("u", "p", "tok1");
        for name in ["a.txt", "b.txt", "c.txt", "d.txt"] {
            write(&dir, name, name.as_bytes());
        }
        transport.fail_path("/b.txt", 500);
        transport.fail_path("/d.txt", 403);
        let mut orchestrator = orchestrator(&transport, &dir, "/");

        let report = orchestrator.sync_to_remote(dir.path()).await.unwrap();

        assert_eq!(transport.count(Method::Post, "/api/resources"), 4);
        assert_eq!(report.failure_count(), 2);
        assert_eq!(report.transferred, vec!["a.txt", "c.txt"]);
        let failed: Vec<_> = report.failed.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(failed, vec!["b.txt", "d.txt"]);
        assert_eq!(report.attempted(), 4);
    }

    #[tokio::test]
    async fn transport_failure_mid_pass_does_not_stop_it() {
        let dir = TempDir::new().unwrap();
        let transport = MockTransport::with_account("u", "p", "tok1");
        for name in ["a.txt", "b.txt", "c.txt"] {
            write(&dir, name, name.as_bytes());
        }
        // login is request 0, a.txt is 1, b.txt is 2
        transport.fail_request(2, "connection reset");
        let mut orchestrator = orchestrator(&transport, &dir, "/");

        let report = orchestrator.sync_to_remote(dir.path()).await.unwrap();

        assert_eq!(report.transferred, vec!["a.txt", "c.txt"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "b.txt");
        assert!(report.failed[0].reason.contains("connection reset"));
        assert!(transport.file("/b.txt").is_none());
        assert_eq!(transport.file("/c.txt"), Some(b"c.txt".to_vec()));
    }

    #[tokio::test]
    async fn unreadable_directory_is_hard_stop() {
        let dir = TempDir::new().unwrap();
        let transport = MockTransport::with_account("u", "p", "tok1");
        let mut orchestrator = orchestrator(&transport, &dir, "/");

        let result = orchestrator
            .sync_to_remote(&dir.path().join("missing"))
            .await;

        assert!(matches!(result, Err(SyncError::LocalDirectory { .. })));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn expired_session_is_renewed_and_upload_retried() {
        let dir = TempDir::new().unwrap();
        let transport = MockTransport::with_account("u", "p", "tok1");
        write(&dir, "a.txt", b"a");
        let mut orchestrator = orchestrator(&transport, &dir, "/");
        orchestrator.engine_mut().session_mut().login().await.unwrap();
        transport.expire_tokens();

        let report = orchestrator.sync_to_remote(dir.path()).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(transport.count(Method::Post, "/api/resources"), 2);
        assert_eq!(transport.count(Method::Post, "/api/renew"), 1);
        assert_eq!(transport.login_count(), 2);
        assert_eq!(transport.file("/a.txt"), Some(b"a".to_vec()));
    }

    #[tokio::test]
    async fn early_rejected_upload_is_renewed_and_retried() {
        let dir = TempDir::new().unwrap();
        let transport = MockTransport::with_account("u", "p", "tok1");
        transport.reject_uploads_early();
        write(&dir, "a.txt", b"a");
        let mut orchestrator = orchestrator(&transport, &dir, "/");
        orchestrator.engine_mut().session_mut().login().await.unwrap();
        transport.expire_tokens();

        let report = orchestrator.sync_to_remote(dir.path()).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(transport.count(Method::Post, "/api/renew"), 1);
        assert_eq!(transport.login_count(), 2);
        assert_eq!(transport.file("/a.txt"), Some(b"a".to_vec()));
    }

    #[tokio::test]
    async fn unauthorized_upload_is_retried_only_once() {
        let dir = TempDir::new().unwrap();
        let transport = MockTransport::with_account("u", "p", "tok1");
        write(&dir, "a.txt", b"a");
        transport.fail_path("/a.txt", 401);
        let mut orchestrator = orchestrator(&transport, &dir, "/");

        let report = orchestrator.sync_to_remote(dir.path()).await.unwrap();

        assert_eq!(report.failure_count(), 1);
        assert_eq!(transport.count(Method::Post, "/api/resources"), 2);
        assert_eq!(transport.count(Method::Post, "/api/renew"), 1);
    }

    // ===========================================
    // Pull Tests
    // ===========================================

    #[tokio::test]
    async fn pull_hands_listing_to_consumer() {
        let dir = TempDir::new().unwrap();
        let transport = MockTransport::with_account("u", "p", "tok1");
        transport.put_file("/backup/a.txt", b"a");
        transport.put_file("/backup/b.txt", b"b");
        transport.put_file("/elsewhere.txt", b"c");
        let mut orchestrator = orchestrator(&transport, &dir, "/backup");

        let count = orchestrator
            .sync_from_remote(|body| {
                let listing: serde_json::Value = serde_json::from_slice(&body).unwrap();
                listing["items"].as_array().map(Vec::len).unwrap_or(0)
            })
            .await
            .unwrap();

        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn pull_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let transport = MockTransport::with_account("u", "p", "tok1");
        let mut orchestrator = orchestrator(&transport, &dir, "/nowhere");

        let result = orchestrator.sync_from_remote(|body| body.len()).await;

        assert!(matches!(
            result,
            Err(SyncError::Transfer(TransferError::ListFailed(404)))
        ));
    }

    // ===========================================
    // Share Tests
    // ===========================================

    #[tokio::test]
    async fn mount_shares_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        let transport = MockTransport::with_account("u", "p", "tok1");
        transport.add_share("A");
        transport.fail_share("B");
        transport.add_share("C");
        let mut orchestrator = orchestrator(&transport, &dir, "/");

        let result = orchestrator.mount_shares().await;

        assert!(matches!(result, Err(TransferError::ShareFailed { .. })));
        assert_eq!(transport.count(Method::Post, "/api/smb"), 2);
    }

    #[test]
    fn http_client_builds_from_config() {
        let config = ClientConfig::new("http://192.168.4.1/", "u", "p").with_shares(["media"]);
        let orchestrator = SyncOrchestrator::with_http(&config).unwrap();
        assert_eq!(orchestrator.engine().session().routes().base(), "http://192.168.4.1");
        assert_eq!(orchestrator.shares().shares().len(), 1);
        assert_eq!(orchestrator.engine().chunk_size(), 1024);
    }
}
