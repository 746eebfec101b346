//! # elements-fs
//!
//! Read-only virtual filesystem over an Elements media store.
//!
//! Callers address assets by slash-separated path; the adapter resolves
//! paths to remote records, memoizes every answer for its own lifetime and
//! returns filesystem-shaped results.
//!
//! This crate provides:
//! - [`ElementsAdapter`], the filesystem facade (existence checks, metadata,
//!   byte streams, listings; every mutating call is refused)
//! - [`RecordCache`] and [`DirectoryCache`], single-flight caches of path
//!   lookups and directory listings
//! - [`RootResolver`] for the direct and permission-scoped root listings
//! - TOML configuration via [`ElementsConfig`]
//! - **WebDAV server support** (with the `webdav` feature)
//!
//! ## Example
//!
//! ```ignore
//! use elements_fs::ElementsConfig;
//!
//! let adapter = ElementsConfig::load("elements.toml")?.build_adapter()?;
//!
//! for entry in adapter.list_contents("projects", false)? {
//!     println!("{} (dir: {})", entry.path(), entry.is_dir());
//! }
//! let bytes = adapter.read("projects/shoot/a.jpg")?;
//! ```

mod adapter;
mod attributes;
mod config;
mod content_cache;
mod error;
mod flight;
mod mime;
mod prefix;
mod record_cache;
mod roots;

#[cfg(feature = "webdav")]
pub mod webdav;

pub use adapter::ElementsAdapter;
pub use attributes::{
    DirectoryAttributes, FileAttributes, MetadataKind, StorageAttributes, Visibility,
};
pub use config::ElementsConfig;
pub use content_cache::DirectoryCache;
pub use error::{ConfigError, Error, Operation, Reason, Result, RetrievalError};
pub use mime::guess_mime_type;
pub use prefix::PathPrefixer;
pub use record_cache::RecordCache;
pub use roots::{RootResolver, RootStrategy};

// Re-export elements-api types for convenience
pub use elements_api::{DownloadKey, ElementsClient, Endpoints, Record};
