//! # elements-api
//!
//! Client for the media endpoints of an Elements media management server.
//!
//! This crate provides:
//! - A pluggable, blocking [`HttpClient`] seam with a `reqwest` backend
//! - Typed [`Record`]s parsed from the server's untyped JSON at one boundary
//! - [`ElementsClient`], issuing the record-by-path, children, roots,
//!   volumes, resolved-permissions and download requests
//!
//! ## Example
//!
//! ```ignore
//! use elements_api::{Credentials, ElementsClient, ReqwestClient};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let http = ReqwestClient::new(
//!     "https://elements.example.com",
//!     Credentials::Bearer("token".into()),
//!     Duration::from_secs(30),
//! )?;
//! let client = ElementsClient::new(Arc::new(http));
//!
//! if let Some(record) = client.find_by_path("projects/shoot/a.jpg")? {
//!     println!("{} (dir: {})", record.path(), record.is_dir());
//! }
//! ```

mod client;
mod error;
mod record;
mod transport;

pub use client::{DownloadKey, ElementsClient, Endpoints};
pub use error::{Error, Result};
pub use record::{
    parse_entries, parse_records, DirectoryRecord, FileRecord, PermissionEntry, Record, RecordId,
    RootEntry, VolumeEntry,
};
pub use transport::{ApiRequest, Body, Credentials, HttpClient, ReqwestClient};
