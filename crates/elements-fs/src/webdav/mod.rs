//! WebDAV server adapter for Elements media stores.
//!
//! Exposes an [`ElementsAdapter`](crate::ElementsAdapter) as a read-only,
//! network-mountable filesystem that Finder, Explorer or any WebDAV client
//! can browse.
//!
//! # Example
//!
//! ```ignore
//! use elements_fs::webdav::serve_background;
//! use elements_fs::ElementsConfig;
//! use std::sync::Arc;
//!
//! let adapter = Arc::new(ElementsConfig::load("elements.toml")?.build_adapter()?);
//! let server = serve_background(adapter, 0).await?;
//! println!("mount {}", server.mount_url());
//! server.shutdown();
//! ```

mod filesystem;
mod server;

pub use filesystem::ElementsDavFs;
pub use server::{serve, serve_background, ElementsWebDavServer};
