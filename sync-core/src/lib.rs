//! # sync-core
//!
//! Pure logic for the FileBrowser sync client (no I/O, instant tests).
//!
//! This crate implements the session state machine, the transfer chunk
//! buffer, URL routing and sync-pass bookkeeping without any network or
//! disk I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. The actual I/O (HTTP requests, file access) is
//! performed by `sync-client`, which interprets the actions produced by the
//! session state machine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod report;
pub mod routes;
pub mod state;

pub use buffer::ChunkBuffer;
pub use report::{FileFailure, SyncReport};
pub use routes::Routes;
pub use state::{Action, Event, SessionState};
