//! Application state.
//!
//! Read-only state shared by every connection. Nothing in here is mutated
//! after startup, so handlers never take locks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tower_http::services::ServeDir;

use crate::ServerConfig;
use crate::tracker::ChangeTracker;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Served root directory.
    pub(crate) root: PathBuf,
    /// File name served for `/` when present in the root.
    pub(crate) default_document: String,
    /// Static delegate for everything that is not rewritten.
    pub(crate) static_files: ServeDir,
    /// Live reload settings (if enabled).
    pub(crate) live_reload: Option<LiveReload>,
}

/// Live reload settings handed to each event stream.
#[derive(Debug)]
pub(crate) struct LiveReload {
    /// Tracker sampled by every session.
    pub(crate) tracker: Arc<ChangeTracker>,
    /// Delay between two samples of one session.
    pub(crate) poll_interval: Duration,
}

impl AppState {
    /// Build state from server configuration.
    pub(crate) fn new(config: &ServerConfig) -> Self {
        let live_reload = config.live_reload_enabled.then(|| LiveReload {
            tracker: Arc::new(ChangeTracker::for_root(config.root.clone())),
            poll_interval: config.poll_interval,
        });

        Self {
            root: config.root.clone(),
            default_document: config.default_document.clone(),
            static_files: ServeDir::new(&config.root),
            live_reload,
        }
    }

    /// Check if live reload is enabled.
    #[must_use]
    pub(crate) fn live_reload_enabled(&self) -> bool {
        self.live_reload.is_some()
    }
}
