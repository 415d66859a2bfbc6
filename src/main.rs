//! restroute server
//!
//! Serves a TOML routing table over HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum, request ID, tracing)
//!                         │
//!                         ▼
//!                     routing::Router ──▶ route_list scan ──▶ route score
//!                         │
//!                         ▼
//!                     selected route on_selected (base, attributes)
//!                         │
//!                         ▼
//!     Client Response ◀── target handler (fixed / echo / nested router)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use restroute::config::{load_config, ServerConfig};
use restroute::http::HttpServer;
use restroute::lifecycle::{signal, startup};
use restroute::observability::logging;

#[derive(Parser)]
#[command(name = "restroute")]
#[command(about = "Template-based request router", long_about = None)]
struct Cli {
    /// Routing table (TOML). Built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!("restroute v{} starting", env!("CARGO_PKG_VERSION"));

    let router = startup::build_router(&config)?;
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = router.routes().len(),
        routing_mode = ?config.router.routing_mode,
        "Configuration loaded"
    );

    if cli.check {
        println!("Configuration OK: {} route(s)", router.routes().len());
        return Ok(());
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(router, &config.listener);
    server.run(listener, signal::ctrl_c()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
