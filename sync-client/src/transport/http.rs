//! HttpTransport - real HTTP transport using reqwest.
//!
//! Streamed uploads run the request on a spawned task and feed its body
//! through a bounded channel, so at most one chunk is in flight. Streamed
//! downloads hand out the response body chunk by chunk.

use super::{DownloadStream, HttpRequest, HttpResponse, Method, Transport, TransportError, UploadStream};
use async_trait::async_trait;
use bytes::{Buf, Bytes};
use reqwest::header::CONTENT_LENGTH;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type BodyChunk = Result<Vec<u8>, std::io::Error>;

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::ConnectionFailed(e.to_string())
        } else if e.is_builder() {
            TransportError::InvalidRequest(e.to_string())
        } else {
            TransportError::SendFailed(e.to_string())
        }
    }
}

/// HttpTransport implements the Transport trait with a reqwest client.
///
/// # Example
///
/// ```ignore
/// let transport = HttpTransport::new(Duration::from_secs(20))?;
/// let response = transport
///     .send(HttpRequest::new(Method::Get, "http://host/api/resources/"))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport whose connections and individual I/O steps are
    /// bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| TransportError::ConnectionFailed(format!("Failed to build client: {e}")))?;
        Ok(Self { client, timeout })
    }

    fn builder(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };
        request
            .headers
            .iter()
            .fold(self.client.request(method, &request.url), |builder, (name, value)| {
                builder.header(name.as_str(), value.as_str())
            })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.builder(&request).timeout(self.timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    async fn open_upload(
        &self,
        request: HttpRequest,
        content_length: u64,
    ) -> Result<Box<dyn UploadStream>, TransportError> {
        // Capacity 1: the writer waits until the previous chunk was taken
        let (sender, receiver) = mpsc::channel::<BodyChunk>(1);
        let body_stream = futures_util::stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|chunk| (chunk, receiver))
        });

        let pending = self
            .builder(&request)
            .header(CONTENT_LENGTH, content_length)
            .body(reqwest::Body::wrap_stream(body_stream))
            .send();

        Ok(Box::new(HttpUpload {
            sender: Some(sender),
            response: Some(tokio::spawn(pending)),
            timeout: self.timeout,
        }))
    }

    async fn open_download(
        &self,
        request: HttpRequest,
    ) -> Result<Box<dyn DownloadStream>, TransportError> {
        let response = tokio::time::timeout(self.timeout, self.builder(&request).send())
            .await
            .map_err(|_| TransportError::Timeout)??;

        Ok(Box::new(HttpDownload {
            status: response.status().as_u16(),
            response,
            pending: Bytes::new(),
            timeout: self.timeout,
        }))
    }
}

/// Body writer for an in-flight upload request.
struct HttpUpload {
    sender: Option<mpsc::Sender<BodyChunk>>,
    response: Option<JoinHandle<Result<reqwest::Response, reqwest::Error>>>,
    timeout: Duration,
}

#[async_trait]
impl UploadStream for HttpUpload {
    async fn write(&mut self, chunk: &[u8]) -> Result<usize, TransportError> {
        let Some(sender) = self.sender.as_ref() else {
            return Ok(0);
        };

        match tokio::time::timeout(self.timeout, sender.send(Ok(chunk.to_vec()))).await {
            Err(_) => Err(TransportError::Timeout),
            // Receiver dropped: the request finished or failed early
            Ok(Err(_)) => Ok(0),
            Ok(Ok(())) => Ok(chunk.len()),
        }
    }

    async fn finish(&mut self) -> Result<u16, TransportError> {
        // Dropping the sender ends the body stream
        self.sender.take();

        let handle = self.response.take().ok_or(TransportError::ConnectionClosed)?;
        let response = tokio::time::timeout(self.timeout, handle)
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(|e| TransportError::SendFailed(format!("Upload task failed: {e}")))??;

        Ok(response.status().as_u16())
    }
}

impl Drop for HttpUpload {
    fn drop(&mut self) {
        if let Some(handle) = self.response.take() {
            handle.abort();
        }
    }
}

/// Body reader for a received download response.
struct HttpDownload {
    status: u16,
    response: reqwest::Response,
    pending: Bytes,
    timeout: Duration,
}

#[async_trait]
impl DownloadStream for HttpDownload {
    fn status(&self) -> u16 {
        self.status
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        while self.pending.is_empty() {
            let next = tokio::time::timeout(self.timeout, self.response.chunk())
                .await
                .map_err(|_| TransportError::Timeout)?
                .map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;
            match next {
                Some(chunk) => self.pending = chunk,
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(n)
    }
}
