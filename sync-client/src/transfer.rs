//! TransferEngine - file operations against the service.
//!
//! Every operation first makes sure the session holds a token. Payloads are
//! streamed through one [`ChunkBuffer`] per call, so memory use does not
//! depend on file size.
//!
//! A 401 is reported, never retried here: callers decide whether to
//! `renew()` and try again.

use std::path::Path;

use fbsync_core::ChunkBuffer;
use fbsync_types::api::CONTENT_TYPE_OCTET_STREAM;
use fbsync_types::{Operation, RequestError, TransferRequest};
use tracing::{debug, info, warn};

use crate::error::TransferError;
use crate::session::SessionManager;
use crate::store::LocalStore;
use crate::transport::{HttpRequest, Method, Transport};

/// Unparsed response body (listing, metadata).
pub type RawBody = Vec<u8>;

/// Result of [`TransferEngine::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Listing or metadata body.
    Body(RawBody),
    /// Bytes moved by an upload or download.
    Bytes(u64),
    /// Metadata operation completed.
    Done,
}

/// Performs transfers through a [`SessionManager`] and a [`LocalStore`].
pub struct TransferEngine<T: Transport, S: LocalStore> {
    session: SessionManager<T>,
    store: S,
    chunk_size: usize,
}

impl<T: Transport, S: LocalStore> TransferEngine<T, S> {
    /// Create an engine moving data in chunks of `chunk_size` bytes.
    pub fn new(session: SessionManager<T>, store: S, chunk_size: usize) -> Self {
        Self {
            session,
            store,
            chunk_size: chunk_size.max(1),
        }
    }

    /// The session used for every call.
    pub fn session(&self) -> &SessionManager<T> {
        &self.session
    }

    /// Mutable access to the session, e.g. to `renew()` after a 401.
    pub fn session_mut(&mut self) -> &mut SessionManager<T> {
        &mut self.session
    }

    /// The local store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    async fn authorized(&mut self, method: Method, url: String) -> Result<HttpRequest, TransferError> {
        self.session.ensure_authenticated().await?;
        let mut request = HttpRequest::new(method, url);
        self.session.attach_auth_header(&mut request);
        Ok(request)
    }

    /// List a remote directory, returning the raw body.
    pub async fn list(&mut self, path: &str) -> Result<RawBody, TransferError> {
        let url = self.session.routes().resources(path);
        let request = self.authorized(Method::Get, url).await?;

        let response = self.session.transport().send(request).await?;
        if response.status != 200 {
            warn!("Listing {} failed with status {}", path, response.status);
            return Err(TransferError::ListFailed(response.status));
        }
        Ok(response.body)
    }

    /// Upload a local file to `remote_path`, returning the bytes sent.
    ///
    /// Only a 200 after the body is complete counts as success.
    pub async fn upload(&mut self, local_path: &Path, remote_path: &str) -> Result<u64, TransferError> {
        let url = self.session.routes().resources(remote_path);
        let request = self
            .authorized(Method::Post, url)
            .await?
            .with_header("Content-Type", CONTENT_TYPE_OCTET_STREAM);

        let mut reader = self.store.open_read(local_path).await.map_err(|source| {
            TransferError::LocalOpenError {
                path: local_path.to_path_buf(),
                source,
            }
        })?;
        let length = reader.len();

        let mut upload = self
            .session
            .transport()
            .open_upload(request, length)
            .await?;
        let mut buffer = ChunkBuffer::new(self.chunk_size);
        let mut sent = 0u64;

        loop {
            let n = reader
                .read(buffer.as_mut_slice())
                .await
                .map_err(|source| TransferError::LocalIo {
                    path: local_path.to_path_buf(),
                    source,
                })?;
            if n == 0 {
                break;
            }

            let chunk = buffer.filled(n);
            let mut offset = 0;
            while offset < n {
                let written = upload.write(&chunk[offset..]).await?;
                if written == 0 {
                    warn!("Upload of {} stalled after {} bytes", remote_path, sent + offset as u64);
                    // The server may have answered already; its verdict wins
                    return Err(match upload.finish().await {
                        Ok(200) => TransferError::PartialWrite {
                            written: offset,
                            expected: n,
                        },
                        Ok(status) => TransferError::UploadFailed(status),
                        Err(e) => TransferError::Transport(e),
                    });
                }
                offset += written;
            }
            sent += n as u64;
        }

        let status = upload.finish().await?;
        if status != 200 {
            warn!("Upload of {} failed with status {}", remote_path, status);
            return Err(TransferError::UploadFailed(status));
        }

        info!("Uploaded {} ({} bytes)", remote_path, sent);
        Ok(sent)
    }

    /// Download `remote_path` into a local file, returning the bytes written.
    ///
    /// Success is a clean end of the response stream. The status code is
    /// only logged.
    pub async fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<u64, TransferError> {
        let url = self.session.routes().raw(remote_path);
        let request = self.authorized(Method::Get, url).await?;

        let mut writer = self.store.create(local_path).await.map_err(|source| {
            TransferError::LocalCreateError {
                path: local_path.to_path_buf(),
                source,
            }
        })?;

        let mut stream = self
            .session
            .transport()
            .open_download(request)
            .await
            .map_err(TransferError::DownloadFailed)?;
        match stream.status() {
            200 => debug!("Downloading {}", remote_path),
            status => warn!("Download of {} answered status {}", remote_path, status),
        }

        let local_io = |source| TransferError::LocalIo {
            path: local_path.to_path_buf(),
            source,
        };
        let mut buffer = ChunkBuffer::new(self.chunk_size);
        let mut received = 0u64;

        loop {
            let n = stream
                .read(buffer.as_mut_slice())
                .await
                .map_err(TransferError::DownloadFailed)?;
            if n == 0 {
                break;
            }

            let written = writer.write(buffer.filled(n)).await.map_err(local_io)?;
            if written < n {
                return Err(TransferError::PartialWrite {
                    written,
                    expected: n,
                });
            }
            received += n as u64;
        }
        writer.flush().await.map_err(local_io)?;

        info!("Downloaded {} ({} bytes)", remote_path, received);
        Ok(received)
    }

    /// Delete a remote file or directory.
    pub async fn delete(&mut self, path: &str) -> Result<(), TransferError> {
        let url = self.session.routes().resources(path);
        self.call(Operation::Delete, Method::Delete, url).await?;
        Ok(())
    }

    /// Move a remote file or directory to `destination`.
    pub async fn rename(&mut self, path: &str, destination: &str) -> Result<(), TransferError> {
        let url = self.session.routes().rename(path, destination);
        self.call(Operation::Rename, Method::Patch, url).await?;
        Ok(())
    }

    /// Create a remote directory.
    pub async fn mkdir(&mut self, path: &str) -> Result<(), TransferError> {
        let url = self.session.routes().mkdir(path);
        self.call(Operation::Mkdir, Method::Post, url).await?;
        Ok(())
    }

    /// Fetch metadata for a remote path, returning the raw body.
    pub async fn info(&mut self, path: &str) -> Result<RawBody, TransferError> {
        let url = self.session.routes().resources(path);
        self.call(Operation::Info, Method::Get, url).await
    }

    async fn call(&mut self, operation: Operation, method: Method, url: String) -> Result<RawBody, TransferError> {
        let request = self.authorized(method, url).await?;
        let response = self.session.transport().send(request).await?;
        match response.status {
            200 => Ok(response.body),
            status => {
                warn!("{} failed with status {}", operation, status);
                Err(TransferError::RequestFailed { operation, status })
            }
        }
    }

    /// Validate and run a [`TransferRequest`].
    pub async fn execute(&mut self, request: &TransferRequest) -> Result<TransferOutcome, TransferError> {
        request.validate()?;
        let remote = request.remote_path.as_str();

        match (
            request.operation,
            request.local_path.as_deref(),
            request.destination_path.as_deref(),
        ) {
            (Operation::List, ..) => self.list(remote).await.map(TransferOutcome::Body),
            (Operation::Info, ..) => self.info(remote).await.map(TransferOutcome::Body),
            (Operation::Upload, Some(local), _) => {
                self.upload(local, remote).await.map(TransferOutcome::Bytes)
            }
            (Operation::Download, Some(local), _) => {
                self.download(remote, local).await.map(TransferOutcome::Bytes)
            }
            (Operation::Rename, _, Some(destination)) => {
                self.rename(remote, destination).await?;
                Ok(TransferOutcome::Done)
            }
            (Operation::Delete, ..) => {
                self.delete(remote).await?;
                Ok(TransferOutcome::Done)
            }
            (Operation::Mkdir, ..) => {
                self.mkdir(remote).await?;
                Ok(TransferOutcome::Done)
            }
            (operation @ (Operation::Upload | Operation::Download), None, _) => {
                Err(RequestError::MissingLocalPath(operation.as_str()).into())
            }
            (Operation::Rename, _, None) => Err(RequestError::MissingDestination.into()),
        }
    }
}
