//! FileBrowser HTTP API constants.

/// Response header carrying the token issued by a successful login.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Request header carrying the current token on authenticated calls.
pub const AUTH_HEADER: &str = "X-Auth";

/// Content type of streamed upload bodies.
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// Content type of JSON request bodies.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Login endpoint.
pub const LOGIN_PATH: &str = "/api/login";

/// Token renewal endpoint.
pub const RENEW_PATH: &str = "/api/renew";

/// Prefix for listing, upload and metadata calls.
pub const RESOURCES_PREFIX: &str = "/api/resources";

/// Prefix for raw file downloads.
pub const RAW_PREFIX: &str = "/api/raw";

/// Share (SMB) request endpoint.
pub const SMB_PATH: &str = "/api/smb";

/// Default size of the transfer chunk buffer, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default network timeout, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;
