//! # extdev
//!
//! Extension development server binary. Loads the developer config, starts
//! the HTTP/WebSocket server and the build watcher, and shuts both down on
//! Ctrl-C.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use extdev_core::StaticExtensionProvider;
use extdev_server::watch::BuildWatcher;
use extdev_server::{DevServer, ServerConfig};
use extdev_settings::{DevSettings, load_settings};
use tokio_util::sync::CancellationToken;

/// Local development server for UI extensions.
#[derive(Parser, Debug)]
#[command(name = "extdev", version, about = "Local development server for UI extensions")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the configured extensions.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Config file (YAML or JSON), or `-` to read it from stdin.
    config: PathBuf,

    /// Host to bind (overrides the config file).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides the config file).
    #[arg(long)]
    port: Option<u16>,
}

impl ServeArgs {
    /// Load settings and layer the command-line flags on top.
    fn resolve_settings(&self) -> Result<DevSettings> {
        let mut settings = load_settings(&self.config)
            .with_context(|| format!("Failed to load config: {}", self.config.display()))?;
        self.apply_overrides(&mut settings);
        Ok(settings)
    }

    fn apply_overrides(&self, settings: &mut DevSettings) {
        if let Some(host) = &self.host {
            settings.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
    }
}

/// Run the server and build watcher until `cancel` fires.
async fn serve(settings: DevSettings, cancel: CancellationToken) -> Result<()> {
    let provider = Arc::new(StaticExtensionProvider::new(
        settings.extensions.clone(),
        settings.version.clone(),
    ));
    let server = DevServer::new(ServerConfig::from(&settings), provider.clone());

    let (addr, handle) = server
        .listen(cancel.clone())
        .await
        .context("Failed to bind server")?;

    tracing::info!(
        extension_count = settings.extensions.len(),
        public_url = settings.public_url.as_deref().unwrap_or_default(),
        store = settings.store.as_deref().unwrap_or_default(),
        "extdev listening on http://{addr}/extensions/"
    );

    let watcher = BuildWatcher::new(
        provider,
        Arc::clone(server.broadcaster()),
        server.config().watch_interval(),
    );
    let watcher_handle = tokio::spawn(watcher.run(cancel.clone()));

    let result = handle.await.context("Server task panicked")?;
    // the watcher only stops on cancellation
    cancel.cancel();
    let _ = watcher_handle.await;
    result.context("Server failed")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Cancel `cancel` on Ctrl-C.
fn spawn_signal_handler(cancel: CancellationToken) {
    drop(tokio::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to listen for ctrl-c");
            return;
        }
        tracing::info!("Shutting down...");
        cancel.cancel();
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    extdev_core::logging::init_subscriber(&cli.log_level, cli.json_logs);

    match cli.command {
        Command::Serve(args) => {
            let settings = args.resolve_settings()?;
            let cancel = CancellationToken::new();
            spawn_signal_handler(cancel.clone());
            serve(settings, cancel).await
        }
    }
}
