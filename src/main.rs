//! Todo REST API (v1)
//!
//! A small REST backend for a to-do list, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────┐
//!                  │                    TODO API                      │
//!   Client         │  ┌──────────┐   ┌───────────────────────────┐    │
//!   ───────────────┼─▶│  http    │──▶│ /        root (landing or │    │
//!                  │  │  server  │   │          redirect)        │    │
//!                  │  │ + layers │   │ /api/    ResourceRouter   │    │
//!                  │  └──────────┘   │            └▶ TodoController │
//!                  │                 │                 └▶ TodoStore │
//!                  │                 │ /admin/  admin (bearer)   │    │
//!                  │                 └───────────────────────────┘    │
//!                  │                                                  │
//!                  │  config · observability · security · lifecycle   │
//!                  └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use todo_api::config::{load_config, AppConfig};
use todo_api::lifecycle::{signals::spawn_signal_listener, Shutdown};
use todo_api::observability::{logging::init_logging, metrics::init_metrics};
use todo_api::HttpServer;

#[derive(Parser)]
#[command(name = "todo-api", version, about = "REST backend for a to-do list")]
struct Args {
    /// Path to a TOML config file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    init_logging(&config.observability)?;

    tracing::info!("todo-api v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_file = ?args.config,
        bind_address = %config.listener.bind_address,
        root_mode = ?config.root.mode,
        data_file = ?config.storage.data_file,
        admin_enabled = config.admin.enabled,
        "Configuration loaded"
    );

    let metrics = if config.observability.metrics_enabled {
        match init_metrics() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!(error = %e, "Failed to install metrics recorder");
                None
            }
        }
    } else {
        None
    };

    // Listeners start last: traffic only once the store is loaded.
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::with_metrics(config, metrics)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
