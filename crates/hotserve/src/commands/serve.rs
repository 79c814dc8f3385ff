//! `hotserve` serve command implementation.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Args;
use hotserve_config::{CliSettings, Config};
use hotserve_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for serving a directory.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Directory to serve (overrides config, default: current directory).
    root: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover hotserve.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// First port to try; the next free port is used if it is taken (overrides config).
    #[arg(short, long, env = "HOTSERVE_PORT")]
    port: Option<u16>,

    /// Document served for `/` (overrides config).
    #[arg(long)]
    default_document: Option<String>,

    /// Enable verbose output (debug logs).
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable live reload (default: enabled).
    #[arg(long)]
    live_reload: Option<bool>,

    /// Disable live reload.
    #[arg(long, conflicts_with = "live_reload")]
    no_live_reload: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let live_reload_enabled = self.resolve_live_reload_enabled();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            root: self.root,
            default_document: self.default_document,
            live_reload_enabled,
        };

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Serving directory: {}",
            config.site_resolved.root.display()
        ));
        if config.live_reload.enabled {
            output.info(&format!(
                "Live reload: enabled (polling every {} ms)",
                config.live_reload.poll_interval_ms
            ));
        } else {
            output.info("Live reload: disabled");
        }

        let server_config = server_config_from_config(&config);
        run_server(server_config, |addr| output.serving(&display_url(addr))).await?;

        output.stopped();
        Ok(())
    }

    /// Resolve `live_reload_enabled` from --live-reload/--no-live-reload flags.
    fn resolve_live_reload_enabled(&self) -> Option<bool> {
        self.no_live_reload.then_some(false).or(self.live_reload)
    }
}

/// URL to open in a browser for the bound address.
fn display_url(addr: SocketAddr) -> String {
    let ip = addr.ip();
    if ip.is_loopback() || ip.is_unspecified() {
        format!("http://localhost:{}", addr.port())
    } else {
        format!("http://{addr}")
    }
}
