//! Local development server with live reload.
//!
//! Serves a directory tree over HTTP and tells connected browser tabs to
//! reload whenever an HTML, JavaScript or CSS file in the tree changes.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use hotserve_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         root: PathBuf::from("public"),
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config, |addr| println!("Serving at http://localhost:{}", addr.port()))
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum (one task per connection)
//!                        │
//!                        ├─► GET /_events ──► ReloadSession (one task per stream)
//!                        │                        │
//!                        │                        └─► ChangeTracker (blocking pool, every 500 ms)
//!                        │
//!                        ├─► /, *.html ──► read file, inject reload script
//!                        │
//!                        └─► anything else ──► tower-http ServeDir / directory listing
//! ```

mod app;
mod inject;
mod live_reload;
mod middleware;
mod router;
mod state;
mod static_files;
mod tracker;

use std::future::IntoFuture;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

pub use inject::{RELOAD_SCRIPT, inject_script};
pub use live_reload::{EVENTS_PATH, RELOAD_MESSAGE};
pub use tracker::{ChangeTracker, EXCLUDED_DIRS, Freshness, WATCHED_EXTENSIONS};

use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// First port to try.
    pub port: u16,
    /// Directory tree to serve and watch.
    pub root: PathBuf,
    /// File name served for `/`.
    pub default_document: String,
    /// Enable live reload.
    pub live_reload_enabled: bool,
    /// Delay between two freshness samples of one event stream.
    pub poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
            root: PathBuf::from("."),
            default_document: "index.html".to_owned(),
            live_reload_enabled: true,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Create server configuration from the loaded hotserve configuration.
#[must_use]
pub fn server_config_from_config(config: &hotserve_config::Config) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        root: config.site_resolved.root.clone(),
        default_document: config.site_resolved.default_document.clone(),
        live_reload_enabled: config.live_reload.enabled,
        poll_interval: config.live_reload.poll_interval(),
    }
}

/// Server error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// I/O error while binding or serving.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Binding failed for a reason other than the port being taken.
    #[error("Cannot bind {host}:{port}: {source}")]
    Bind {
        /// Host that was bound.
        host: String,
        /// Port that was tried.
        port: u16,
        /// Underlying error.
        source: io::Error,
    },
    /// Every port from the base port upwards is taken.
    #[error("No free port at or above {base_port}")]
    PortsExhausted {
        /// First port that was tried.
        base_port: u16,
    },
}

/// Bind to `host`, starting at `base_port` and moving to the next port while
/// the current one is unavailable.
///
/// # Errors
///
/// Returns an error if binding fails for another reason (e.g. an unknown
/// host) or if no port up to 65535 is free.
pub async fn bind_with_retry(
    host: &str,
    base_port: u16,
) -> Result<(TcpListener, SocketAddr), ServerError> {
    let mut port = base_port;
    loop {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => {
                let addr = listener.local_addr()?;
                return Ok((listener, addr));
            }
            Err(e) if is_port_unavailable(&e) => {
                tracing::debug!(port, error = %e, "Port unavailable, trying next");
                port = port
                    .checked_add(1)
                    .ok_or(ServerError::PortsExhausted { base_port })?;
            }
            Err(source) => {
                return Err(ServerError::Bind {
                    host: host.to_owned(),
                    port,
                    source,
                });
            }
        }
    }
}

fn is_port_unavailable(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::AddrInUse | io::ErrorKind::PermissionDenied
    )
}

/// Run the server until Ctrl-C.
///
/// `on_ready` is called once with the bound address, before the first
/// connection is accepted.
///
/// # Errors
///
/// Returns an error if the server fails to bind or to accept connections.
pub async fn run_server<F>(config: ServerConfig, on_ready: F) -> Result<(), ServerError>
where
    F: FnOnce(SocketAddr),
{
    let (listener, addr) = bind_with_retry(&config.host, config.port).await?;
    tracing::info!(
        address = %addr,
        root = %config.root.display(),
        live_reload = config.live_reload_enabled,
        "Starting server"
    );
    on_ready(addr);

    let app = app::create_router(Arc::new(AppState::new(&config)));

    // Event streams never finish, so shutdown drops connections instead of draining them
    tokio::select! {
        result = axum::serve(listener, app).into_future() => result?,
        () = shutdown_signal() => {}
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_server_config_from_config() {
        let config = hotserve_config::Config::default();

        let server_config = server_config_from_config(&config);

        assert_eq!(server_config.host, "127.0.0.1");
        assert_eq!(server_config.port, 8000);
        assert_eq!(server_config.default_document, "index.html");
        assert!(server_config.live_reload_enabled);
        assert_eq!(server_config.poll_interval, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_bind_with_retry_skips_taken_port() {
        let (taken, taken_addr) = bind_with_retry("127.0.0.1", 18_000).await.unwrap();

        let (_listener, addr) = bind_with_retry("127.0.0.1", taken_addr.port())
            .await
            .unwrap();

        assert!(addr.port() > taken_addr.port());
        drop(taken);
    }

    #[tokio::test]
    async fn test_bind_with_retry_unknown_host() {
        let err = bind_with_retry("host.invalid", 18_000).await.unwrap_err();

        assert!(matches!(err, ServerError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_streams_do_not_block_requests() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpStream;

        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("style.css"), "a{}").unwrap();
        let config = ServerConfig {
            root: temp_dir.path().to_path_buf(),
            port: 18_100,
            poll_interval: Duration::from_millis(20),
            ..ServerConfig::default()
        };
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
        tokio::spawn(run_server(config, move |addr| {
            let _ = ready_tx.send(addr);
        }));
        let addr = ready_rx.await.unwrap();

        // Two event streams that never finish
        let mut streams = Vec::new();
        for _ in 0..2 {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream
                .write_all(b"GET /_events HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .await
                .unwrap();
            streams.push(stream);
        }

        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"GET /style.css HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        tokio::time::timeout(Duration::from_secs(5), client.read_to_string(&mut response))
            .await
            .unwrap()
            .unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("a{}"));
    }
}
