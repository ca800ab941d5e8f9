//! Pixel filter server.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http::server (accept loop, middleware)
//!                  │
//!                  ├── GET  /        → static upload page
//!                  ├── POST /upload  → pipeline::form  ─┐
//!                  └── POST /filter  → FilterRequest   ─┤
//!                                                       ▼
//!                            imaging::codec decode → imaging::filter apply
//!                                                       │
//!                            imaging::codec encode (PNG) ◀┘
//!                                                       ▼
//!   Client ◀── http::response ◀── pipeline::template (base64 data URL)
//! ```
//!
//! Usage: `pixel-filter-server [PORT]` (default 5001).

use clap::Parser;

use pixel_filter_server::config::{parse_port, ServerConfig};
use pixel_filter_server::http::HttpServer;
use pixel_filter_server::lifecycle::{signals, Shutdown};
use pixel_filter_server::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "pixel-filter-server")]
#[command(about = "Serve an image upload page and apply per-pixel filters", long_about = None)]
struct Cli {
    /// TCP port to listen on; falls back to 5001 when absent or not a valid port
    #[arg(allow_hyphen_values = true)]
    port: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = ServerConfig::default().with_port(parse_port(cli.port.as_deref()));

    logging::init_tracing(&config.observability);

    tracing::info!("pixel-filter-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        max_body_bytes = config.limits.max_body_bytes,
        processing_timeout_secs = config.timeouts.processing_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Some(addr) = config.observability.metrics_socket_addr() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let server = HttpServer::new(config).bind().await?;

    let shutdown = Shutdown::new();
    let serve_shutdown = shutdown.subscribe();
    tokio::spawn(signals::shutdown_on_signal(shutdown));

    server.serve(serve_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
