//! Mock transport for testing.
//!
//! Simulates a FileBrowser service in memory: accounts and tokens, a file
//! tree, and shares. Requests are recorded for verification and failures can
//! be injected per endpoint.

use super::{
    DownloadStream, HttpRequest, HttpResponse, Method, Transport, TransportError, UploadStream,
};
use async_trait::async_trait;
use fbsync_types::api::{
    AUTH_HEADER, AUTH_TOKEN_HEADER, LOGIN_PATH, RAW_PREFIX, RENEW_PATH, RESOURCES_PREFIX, SMB_PATH,
};
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// A request as seen by the mock service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Request method.
    pub method: Method,
    /// Full URL as sent.
    pub url: String,
    /// Decoded path starting at `/api/`, without the query.
    pub path: String,
    /// Headers as sent.
    pub headers: Vec<(String, String)>,
    /// Body; for streamed uploads, the bytes written before `finish`.
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// Look up a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        super::find_header(&self.headers, name)
    }
}

/// Mock transport for testing.
///
/// Clones share the same simulated service.
#[derive(Debug)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    username: String,
    password: String,
    login_token: Option<String>,
    valid_tokens: HashSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    shares: BTreeSet<String>,
    failing_shares: HashSet<String>,
    forced_status: HashMap<&'static str, VecDeque<u16>>,
    path_status: HashMap<String, u16>,
    fail_next_send: Option<String>,
    fail_at: Option<(usize, String)>,
    reject_uploads_early: bool,
    stall_uploads_after: Option<usize>,
    fail_downloads_after: Option<usize>,
    requests: Vec<RecordedRequest>,
    login_count: usize,
}

impl MockTransport {
    /// Create a mock service with account `admin`/`admin` issuing `mock-token`.
    pub fn new() -> Self {
        Self::with_account("admin", "admin", "mock-token")
    }

    /// Create a mock service with one account; a successful login issues `token`.
    pub fn with_account(username: &str, password: &str, token: &str) -> Self {
        let inner = MockTransportInner {
            username: username.to_string(),
            password: password.to_string(),
            login_token: Some(token.to_string()),
            ..Default::default()
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Token handed out by the next logins. `None` answers 200 without the header.
    pub fn set_login_token(&self, token: Option<&str>) {
        let mut inner = self.inner.lock().unwrap();
        inner.login_token = token.map(str::to_string);
    }

    /// Invalidate every issued token, as if the session expired server-side.
    pub fn expire_tokens(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.valid_tokens.clear();
    }

    /// Answer the next request to `endpoint` (e.g. `/api/renew`) with `status`.
    ///
    /// Calls queue up: each forced status is used once, in order.
    pub fn force_status(&self, endpoint: &str, status: u16) {
        let Some(endpoint) = endpoint_key(endpoint) else {
            return;
        };
        let mut inner = self.inner.lock().unwrap();
        inner
            .forced_status
            .entry(endpoint)
            .or_default()
            .push_back(status);
    }

    /// Answer every resource request for `path` (uploads included) with `status`.
    pub fn fail_path(&self, path: &str, status: u16) {
        let mut inner = self.inner.lock().unwrap();
        inner.path_status.insert(clean(path), status);
    }

    /// Cause the next request to fail at the transport level.
    pub fn fail_next_send(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_send = Some(error.to_string());
    }

    /// Cause the request at zero-based position `index` among recorded
    /// requests to fail at the transport level.
    pub fn fail_request(&self, index: usize, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_at = Some((index, error.to_string()));
    }

    /// Decide uploads when they are opened, as an HTTP server answering
    /// before reading the body does: a rejected upload accepts no bytes and
    /// `finish` reports the status.
    pub fn reject_uploads_early(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.reject_uploads_early = true;
    }

    /// Uploads stop accepting bytes once `bytes` have been written.
    ///
    /// A stalled upload still finishes with 200 but nothing is stored.
    pub fn stall_uploads_after(&self, bytes: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.stall_uploads_after = Some(bytes);
    }

    /// Download streams error out once `bytes` have been read.
    pub fn fail_downloads_after(&self, bytes: usize) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_downloads_after = Some(bytes);
    }

    /// Store a remote file.
    pub fn put_file(&self, path: &str, data: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner.files.insert(clean(path), data.to_vec());
    }

    /// Contents of a remote file.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner.files.get(&clean(path)).cloned()
    }

    /// Whether a remote directory exists.
    pub fn has_dir(&self, path: &str) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.has_dir(&clean(path))
    }

    /// Register a share that answers 200.
    pub fn add_share(&self, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.shares.insert(name.to_string());
    }

    /// Register a share whose requests answer 500.
    pub fn fail_share(&self, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.shares.insert(name.to_string());
        inner.failing_shares.insert(name.to_string());
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.clone()
    }

    /// Number of login requests received.
    pub fn login_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.login_count
    }

    /// Number of requests with `method` whose path starts with `prefix`.
    pub fn count(&self, method: Method, prefix: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner
            .requests
            .iter()
            .filter(|r| r.method == method && r.path.starts_with(prefix))
            .count()
    }

    /// Forget recorded requests and the login counter.
    pub fn clear_requests(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.clear();
        inner.login_count = 0;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Split a URL into its decoded `/api/...` path and raw query.
fn split_url(url: &str) -> (String, Option<String>) {
    let start = url.find("/api/").unwrap_or(url.len());
    let rest = &url[start..];
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (rest, None),
    };
    (percent_decode_str(path).decode_utf8_lossy().into_owned(), query)
}

fn endpoint_key(path: &str) -> Option<&'static str> {
    [LOGIN_PATH, RENEW_PATH, SMB_PATH, RESOURCES_PREFIX, RAW_PREFIX]
        .into_iter()
        .find(|endpoint| path.starts_with(endpoint))
}

fn query_value(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| percent_decode_str(v).decode_utf8_lossy().into_owned())
    })
}

/// Normalise a remote path: leading `/`, no trailing `/` except for the root.
fn clean(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{}", trimmed)
}

fn upload_target(path: &str) -> String {
    clean(&path[RESOURCES_PREFIX.len().min(path.len())..])
}

fn parent_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/",
        Some((parent, _)) => parent,
    }
}

fn status(status: u16) -> HttpResponse {
    HttpResponse::new(status, Vec::new())
}

impl MockTransportInner {
    fn record(&mut self, request: &HttpRequest, path: &str) -> usize {
        self.requests.push(RecordedRequest {
            method: request.method,
            url: request.url.clone(),
            path: path.to_string(),
            headers: request.headers.clone(),
            body: request.body.clone().unwrap_or_default(),
        });
        self.requests.len() - 1
    }

    fn take_forced(&mut self, endpoint: &'static str) -> Option<u16> {
        self.forced_status.get_mut(endpoint)?.pop_front()
    }

    fn take_send_failure(&mut self) -> Option<String> {
        if let Some(error) = self.fail_next_send.take() {
            return Some(error);
        }
        let position = self.requests.len();
        if self.fail_at.as_ref().is_some_and(|(index, _)| *index == position) {
            return self.fail_at.take().map(|(_, error)| error);
        }
        None
    }

    // Status an upload to `path` gets before its body is considered
    fn upload_verdict(&mut self, request: &HttpRequest, path: &str) -> Option<u16> {
        if let Some(forced) = self.take_forced(RESOURCES_PREFIX) {
            return Some(forced);
        }
        if !self.authorized(request) {
            return Some(401);
        }
        self.path_status.get(&upload_target(path)).copied()
    }

    fn authorized(&self, request: &HttpRequest) -> bool {
        request
            .header(AUTH_HEADER)
            .is_some_and(|token| self.valid_tokens.contains(token))
    }

    // Directories also exist implicitly as parents of stored files
    fn has_dir(&self, path: &str) -> bool {
        let prefix = format!("{}/", path);
        path == "/"
            || self.dirs.contains(path)
            || self.files.keys().any(|p| p.starts_with(&prefix))
    }

    fn handle(&mut self, request: &HttpRequest) -> HttpResponse {
        let (path, query) = split_url(&request.url);
        self.record(request, &path);

        let Some(endpoint) = endpoint_key(&path) else {
            return status(404);
        };
        if endpoint == LOGIN_PATH {
            self.login_count += 1;
        }
        if let Some(forced) = self.take_forced(endpoint) {
            return status(forced);
        }
        if endpoint == LOGIN_PATH {
            return self.login(request);
        }
        if !self.authorized(request) {
            return status(401);
        }

        let target = &path[endpoint.len()..];
        if endpoint == RESOURCES_PREFIX || endpoint == RAW_PREFIX {
            if let Some(code) = self.path_status.get(&clean(target)) {
                return status(*code);
            }
        }
        match (endpoint, request.method) {
            (RENEW_PATH, Method::Post) => status(200),
            (SMB_PATH, Method::Post) => self.share(request),
            (RAW_PREFIX, Method::Get) => match self.files.get(&clean(target)) {
                Some(data) => HttpResponse::new(200, data.clone()),
                None => status(404),
            },
            (RESOURCES_PREFIX, Method::Get) => self.resource_info(&clean(target)),
            (RESOURCES_PREFIX, Method::Post) if target.ends_with('/') => {
                self.dirs.insert(clean(target));
                status(200)
            }
            (RESOURCES_PREFIX, Method::Post) => {
                let body = request.body.clone().unwrap_or_default();
                self.files.insert(clean(target), body);
                status(200)
            }
            (RESOURCES_PREFIX, Method::Delete) => self.delete(&clean(target)),
            (RESOURCES_PREFIX, Method::Patch) => {
                let destination = query
                    .as_deref()
                    .filter(|q| query_value(q, "action").as_deref() == Some("rename"))
                    .and_then(|q| query_value(q, "destination"));
                match destination {
                    Some(destination) => self.rename(&clean(target), &clean(&destination)),
                    None => status(400),
                }
            }
            _ => status(405),
        }
    }

    fn login(&mut self, request: &HttpRequest) -> HttpResponse {
        let body: Value = match request.body.as_deref().map(serde_json::from_slice) {
            Some(Ok(body)) => body,
            _ => return status(400),
        };
        if body["username"] != self.username.as_str() || body["password"] != self.password.as_str()
        {
            return status(401);
        }

        let mut response = status(200);
        if let Some(token) = self.login_token.clone() {
            self.valid_tokens.insert(token.clone());
            response
                .headers
                .push((AUTH_TOKEN_HEADER.to_string(), token));
        }
        response
    }

    fn share(&mut self, request: &HttpRequest) -> HttpResponse {
        let body: Value = match request.body.as_deref().map(serde_json::from_slice) {
            Some(Ok(body)) => body,
            _ => return status(400),
        };
        let share = body["share"].as_str().unwrap_or_default();
        if self.failing_shares.contains(share) {
            status(500)
        } else if self.shares.contains(share) {
            let listing = json!({ "share": share, "items": [] });
            HttpResponse::new(200, listing.to_string().into_bytes())
        } else {
            status(404)
        }
    }

    fn resource_info(&self, path: &str) -> HttpResponse {
        if let Some(data) = self.files.get(path) {
            let info = json!({ "path": path, "size": data.len(), "isDir": false });
            return HttpResponse::new(200, info.to_string().into_bytes());
        }
        if !self.has_dir(path) {
            return status(404);
        }

        let files = self
            .files
            .iter()
            .filter(|(p, _)| parent_of(p) == path)
            .map(|(p, data)| json!({ "path": p, "size": data.len(), "isDir": false }));
        let dirs = self
            .dirs
            .iter()
            .filter(|p| parent_of(p) == path)
            .map(|p| json!({ "path": p, "size": 0, "isDir": true }));
        let listing = json!({ "path": path, "isDir": true, "items": dirs.chain(files).collect::<Vec<_>>() });
        HttpResponse::new(200, listing.to_string().into_bytes())
    }

    fn delete(&mut self, path: &str) -> HttpResponse {
        if self.files.remove(path).is_some() {
            return status(200);
        }
        if !self.dirs.remove(path) {
            return status(404);
        }
        let prefix = format!("{}/", path);
        self.files.retain(|p, _| !p.starts_with(&prefix));
        self.dirs.retain(|p| !p.starts_with(&prefix));
        status(200)
    }

    fn rename(&mut self, from: &str, to: &str) -> HttpResponse {
        if let Some(data) = self.files.remove(from) {
            self.files.insert(to.to_string(), data);
            return status(200);
        }
        if !self.dirs.remove(from) {
            return status(404);
        }
        let prefix = format!("{}/", from);
        let moved = |p: &str| format!("{}/{}", to, &p[prefix.len()..]);
        self.files = std::mem::take(&mut self.files)
            .into_iter()
            .map(|(p, data)| if p.starts_with(&prefix) { (moved(&p), data) } else { (p, data) })
            .collect();
        self.dirs = std::mem::take(&mut self.dirs)
            .into_iter()
            .map(|p| if p.starts_with(&prefix) { moved(&p) } else { p })
            .collect();
        self.dirs.insert(to.to_string());
        status(200)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        // Check for forced failure
        if let Some(error) = inner.take_send_failure() {
            return Err(TransportError::SendFailed(error));
        }

        Ok(inner.handle(&request))
    }

    async fn open_upload(
        &self,
        request: HttpRequest,
        content_length: u64,
    ) -> Result<Box<dyn UploadStream>, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(error) = inner.take_send_failure() {
            return Err(TransportError::ConnectionFailed(error));
        }

        let (path, _) = split_url(&request.url);
        let record = inner.record(&request, &path);
        let (rejected, decided) = if inner.reject_uploads_early {
            let verdict = inner.upload_verdict(&request, &path);
            (verdict.filter(|code| *code != 200), true)
        } else {
            (None, false)
        };
        Ok(Box::new(MockUpload {
            inner: Arc::clone(&self.inner),
            request,
            path,
            record,
            content_length,
            received: Vec::new(),
            stall_after: inner.stall_uploads_after,
            stalled: false,
            rejected,
            decided,
        }))
    }

    async fn open_download(
        &self,
        request: HttpRequest,
    ) -> Result<Box<dyn DownloadStream>, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(error) = inner.take_send_failure() {
            return Err(TransportError::ConnectionFailed(error));
        }

        let response = inner.handle(&request);
        Ok(Box::new(MockDownload {
            status: response.status,
            data: response.body,
            position: 0,
            fail_after: inner.fail_downloads_after,
        }))
    }
}

struct MockUpload {
    inner: Arc<Mutex<MockTransportInner>>,
    request: HttpRequest,
    path: String,
    record: usize,
    content_length: u64,
    received: Vec<u8>,
    stall_after: Option<usize>,
    stalled: bool,
    rejected: Option<u16>,
    decided: bool,
}

#[async_trait]
impl UploadStream for MockUpload {
    async fn write(&mut self, chunk: &[u8]) -> Result<usize, TransportError> {
        if self.rejected.is_some() {
            return Ok(0);
        }
        let accepted = match self.stall_after {
            Some(limit) => chunk.len().min(limit.saturating_sub(self.received.len())),
            None => chunk.len(),
        };
        if accepted < chunk.len() {
            self.stalled = true;
        }
        self.received.extend_from_slice(&chunk[..accepted]);
        Ok(accepted)
    }

    async fn finish(&mut self) -> Result<u16, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(record) = inner.requests.get_mut(self.record) {
            record.body = self.received.clone();
        }
        if let Some(code) = self.rejected {
            return Ok(code);
        }
        if !self.decided {
            if let Some(code) = inner.upload_verdict(&self.request, &self.path) {
                return Ok(code);
            }
        }
        if self.stalled {
            return Ok(200);
        }
        let target = upload_target(&self.path);
        if self.received.len() as u64 != self.content_length {
            return Ok(400);
        }

        inner.files.insert(target, std::mem::take(&mut self.received));
        Ok(200)
    }
}

struct MockDownload {
    status: u16,
    data: Vec<u8>,
    position: usize,
    fail_after: Option<usize>,
}

#[async_trait]
impl DownloadStream for MockDownload {
    fn status(&self) -> u16 {
        self.status
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut end = self.data.len();
        if let Some(limit) = self.fail_after {
            if self.position >= limit && self.position < self.data.len() {
                return Err(TransportError::ReceiveFailed("stream reset".to_string()));
            }
            end = end.min(limit.max(self.position));
        }

        let n = buf.len().min(end - self.position);
        buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }
}
