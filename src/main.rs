//! CORS Proxy
//!
//! A forwarding proxy that relaxes browser CORS restrictions, built with
//! Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                  CORS PROXY                   │
//!   GET /https://a.com/x  │  ┌────────┐   ┌──────────┐   ┌────────────┐  │
//!   ──────────────────────┼─▶│  http  │──▶│ forward  │──▶│   relay    │──┼──▶ https://a.com/x
//!                         │  │ server │   │  target  │   │ + encoding │  │
//!                         │  └───┬────┘   └────┬─────┘   └─────┬──────┘  │
//!                         │      │   not a     │               │         │
//!                         │      │   target    ▼               ▼         │
//!   200/400/500 + CORS    │  ┌───┴────┐   ┌──────────┐   ┌────────────┐  │
//!   ◀─────────────────────┼──│  cors  │◀──│   help   │   │  counter   │  │
//!                         │  └────────┘   └──────────┘   └────────────┘  │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cors_proxy::config::load_or_default;
use cors_proxy::http::HttpServer;
use cors_proxy::lifecycle::{wait_for_signal, Shutdown};
use cors_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "cors-proxy")]
#[command(about = "Forwarding proxy that adds permissive CORS headers", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("cors-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        counter_backend = ?config.counter.backend,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
