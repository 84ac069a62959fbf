//! Transport abstraction for the FileBrowser sync client.
//!
//! This module provides the HTTP request/response primitive the session and
//! transfer layers are built on, abstracting the underlying client (reqwest,
//! in-memory mock for testing).
//!
//! # Design
//!
//! The transport trait is async and request-oriented:
//! - `send()` issues a request with an optional body and returns the whole response
//! - `open_upload()` starts a request whose body is written chunk by chunk
//! - `open_download()` starts a request whose response body is read chunk by chunk
//!
//! Timeouts are the transport's concern: an expired timeout surfaces as
//! [`TransportError::Timeout`].
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! let request = HttpRequest::new(Method::Get, "http://host/api/resources/");
//! let response = transport.send(request).await?;
//! assert_eq!(response.status, 401);
//! ```

mod http;
mod mock;

pub use http::HttpTransport;
#[cfg(test)]
pub(crate) use http::early_server;
pub use mock::{MockTransport, RecordedRequest};

use async_trait::async_trait;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed before the exchange completed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Request could not be built (bad URL, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Connection timeout.
    #[error("connection timeout")]
    Timeout,
}

/// HTTP method subset used by the service API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// Uppercase method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// An outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Full request body, if any. Streamed uploads leave this empty.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Create a request with no headers and no body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Set a header, replacing any existing value (names are case-insensitive).
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Builder form of [`set_header`](Self::set_header).
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// Attach a full body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A fully received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response with no headers.
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    /// Look up a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Transport trait for issuing requests to the service.
///
/// Implementations handle the underlying HTTP client (reqwest, mock, etc).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for the complete response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Open a request whose body of `content_length` bytes is written
    /// through the returned stream.
    async fn open_upload(
        &self,
        request: HttpRequest,
        content_length: u64,
    ) -> Result<Box<dyn UploadStream>, TransportError>;

    /// Send a request and return a stream over the response body.
    async fn open_download(
        &self,
        request: HttpRequest,
    ) -> Result<Box<dyn DownloadStream>, TransportError>;
}

/// Request body being written.
#[async_trait]
pub trait UploadStream: Send {
    /// Write a chunk of the body.
    ///
    /// Returns the number of bytes accepted. Zero means the request can no
    /// longer make progress (e.g. the server already answered).
    async fn write(&mut self, chunk: &[u8]) -> Result<usize, TransportError>;

    /// Close the body and wait for the response status.
    async fn finish(&mut self) -> Result<u16, TransportError>;
}

/// Response body being read.
#[async_trait]
pub trait DownloadStream: Send {
    /// Status code of the response.
    fn status(&self) -> u16;

    /// Read up to `buf.len()` bytes. `Ok(0)` is a clean end of stream.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut request = HttpRequest::new(Method::Get, "http://host/");
        request.set_header("X-Auth", "old");
        request.set_header("x-auth", "new");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("X-AUTH"), Some("new"));
    }

    #[test]
    fn response_header_lookup() {
        let mut response = HttpResponse::new(200, vec![]);
        response
            .headers
            .push(("x-auth-token".to_string(), "tok1".to_string()));
        assert_eq!(response.header("X-Auth-Token"), Some("tok1"));
        assert_eq!(response.header("X-Other"), None);
    }

    #[test]
    fn method_names() {
        assert_eq!(Method::Patch.as_str(), "PATCH");
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }

    #[test]
    fn transport_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TransportError>();
    }
}
