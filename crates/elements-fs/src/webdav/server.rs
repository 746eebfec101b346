//! WebDAV server implementation using hyper.
//!
//! This module provides the HTTP server that hosts the WebDAV filesystem,
//! allowing clients to connect and mount the media store.

use super::ElementsDavFs;
use crate::adapter::ElementsAdapter;
use dav_server::{fakels::FakeLs, DavHandler};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use log::{debug, error, info};
use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// WebDAV server running in the background.
pub struct ElementsWebDavServer {
    /// Server address.
    addr: SocketAddr,
    /// Shutdown signal sender.
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ElementsWebDavServer {
    /// Get the server's listen address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the URL to mount this server.
    pub fn mount_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Shutdown the server.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn build_handler(adapter: Arc<ElementsAdapter>) -> DavHandler {
    DavHandler::builder()
        .filesystem(Box::new(ElementsDavFs::new(adapter)))
        .locksystem(FakeLs::new()) // Fake locks for macOS/Windows compatibility
        .build_handler()
}

fn serve_connection(dav_server: DavHandler, stream: tokio::net::TcpStream) {
    let io = TokioIo::new(stream);

    tokio::spawn(async move {
        if let Err(err) = http1::Builder::new()
            .serve_connection(
                io,
                service_fn(move |req| {
                    let dav_server = dav_server.clone();
                    async move { Ok::<_, Infallible>(dav_server.handle(req).await) }
                }),
            )
            .await
        {
            error!("Connection error: {:?}", err);
        }
    });
}

/// Start a WebDAV server on `127.0.0.1:port` and block until the listener
/// fails.
///
/// # Example
///
/// ```ignore
/// use elements_fs::{webdav::serve, ElementsConfig};
/// use std::sync::Arc;
///
/// let adapter = Arc::new(ElementsConfig::load("elements.toml")?.build_adapter()?);
/// tokio::runtime::Runtime::new()?.block_on(serve(adapter, 4918))?;
/// ```
pub async fn serve(adapter: Arc<ElementsAdapter>, port: u16) -> io::Result<()> {
    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    let dav_server = build_handler(adapter);

    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    info!("WebDAV server listening on http://{}", local_addr);
    info!("To mount from terminal:");
    info!("  mkdir -p /tmp/elements");
    info!("  mount_webdav http://{} /tmp/elements", local_addr);
    info!("Press Ctrl+C to stop the server");

    loop {
        let (stream, remote_addr) = listener.accept().await?;
        debug!("Connection from {}", remote_addr);
        serve_connection(dav_server.clone(), stream);
    }
}

/// Start a WebDAV server in the background.
///
/// Returns a handle that can be used to get the server address and shut it
/// down. Pass port 0 to let the OS pick one.
pub async fn serve_background(
    adapter: Arc<ElementsAdapter>,
    port: u16,
) -> io::Result<ElementsWebDavServer> {
    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    let dav_server = build_handler(adapter);

    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    info!("WebDAV server started on http://{}", local_addr);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            debug!("Connection from {}", remote_addr);
                            serve_connection(dav_server.clone(), stream);
                        }
                        Err(e) => {
                            error!("Accept error: {:?}", e);
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    info!("WebDAV server shutting down");
                    break;
                }
            }
        }
    });

    Ok(ElementsWebDavServer {
        addr: local_addr,
        shutdown_tx: Some(shutdown_tx),
    })
}
