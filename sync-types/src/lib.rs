//! # sync-types
//!
//! Wire format types for the FileBrowser sync client.
//!
//! This crate provides the foundational types used across all fbsync crates:
//! - [`AuthToken`], [`Credentials`] - Session identity (never logged)
//! - [`LoginRequest`], [`ShareRequest`] - JSON request bodies
//! - [`TransferRequest`], [`Operation`] - A single transfer call
//! - [`ShareDescriptor`], [`DirectoryEntry`] - Configured shares and local entries
//! - [`RequestError`] - Validation errors
//!
//! Header names and API paths are collected in [`api`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
mod auth;
mod entries;
mod error;
mod messages;
mod request;

pub use auth::{AuthToken, Credentials};
pub use entries::{DirectoryEntry, ShareDescriptor};
pub use error::RequestError;
pub use messages::{LoginRequest, ShareRequest, SHARE_ACTION_LIST};
pub use request::{Operation, TransferRequest};
