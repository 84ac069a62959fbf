//! # sync-client
//!
//! Authenticated sync client for the FileBrowser HTTP API.
//!
//! This is the library that applications use to move files between local
//! storage and a FileBrowser service.
//!
//! ## Features
//!
//! - **Lazy Sessions**: login on first use, renewal with re-login on expiry
//! - **Streaming Transfers**: uploads and downloads through one fixed-size chunk buffer
//! - **Transport Abstraction**: Pluggable transport layer (reqwest, mock)
//! - **Pure State Machine**: Uses sync-core for side-effect-free session logic
//!
//! ## Example
//!
//! ```ignore
//! use fbsync_client::{ClientConfig, SyncOrchestrator};
//!
//! let config = ClientConfig::new("http://192.168.4.1", "admin", "secret")
//!     .with_remote_base("/backup");
//! let mut client = SyncOrchestrator::with_http(&config)?;
//!
//! // Push every regular file of the mount point
//! let report = client.sync_to_remote(Path::new("/sdcard")).await?;
//!
//! // Single-file operations go through the engine
//! client.engine_mut().download("/backup/a.txt", Path::new("a.txt")).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod session;
pub mod share;
pub mod store;
pub mod transfer;
pub mod transport;

pub use config::ClientConfig;
pub use error::{AuthError, FailureCause, SyncError, TransferError};
pub use orchestrator::SyncOrchestrator;
pub use session::SessionManager;
pub use share::ShareController;
pub use store::{FileInfo, FsStore, LocalReader, LocalStore, LocalWriter};
pub use transfer::{RawBody, TransferEngine, TransferOutcome};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, MockTransport, RecordedRequest, Transport,
    TransportError,
};
