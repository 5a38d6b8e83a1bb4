//! Processing pool service.
//!
//! # Architecture Overview
//!
//! ```text
//!   HTTP client
//!       │
//!       ▼
//!   ┌────────┐   ask / tell   ┌─────────┐  round robin  ┌──────────────┐
//!   │  http  │ ─────────────▶ │ gateway │ ────────────▶ │ load_balancer│
//!   └────────┘                └─────────┘               │   router     │
//!       ▲                          ▲                    └──────┬───────┘
//!       │                          │ reply (direct)            │ mailbox
//!       │                          │                           ▼
//!       │                          │              ┌───────────────────────┐
//!       │                          └───────────── │ worker unit × N       │
//!       │                                         │  circuit breaker      │──▶ Processor
//!       │                                         └───────────────────────┘
//!       │                                                      ▲ restart / escalate
//!       │                                               ┌──────┴─────┐
//!       └──────────────── 503 once escalated ────────── │ supervision│
//!                                                       └────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use processing_pool::config::{load_config, PoolConfig};
use processing_pool::lifecycle::signals;
use processing_pool::observability::{logging, metrics};
use processing_pool::worker::{FixedStatusStore, StubProcessor};
use processing_pool::{HttpServer, PoolSettings, ProcessingPool, Shutdown};

#[derive(Parser)]
#[command(name = "processing-pool")]
#[command(about = "Fault-tolerant processing pool with an HTTP facade", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => PoolConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("processing-pool v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let pool = ProcessingPool::start(
        PoolSettings::from(&config),
        Arc::new(StubProcessor::default()),
        Arc::new(FixedStatusStore::default()),
        &shutdown,
    )?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(pool.gateway(), &config.gateway, shutdown.clone());
    let server_task = tokio::spawn(server.run(listener, shutdown.clone()));
    tokio::spawn(signals::trigger_on_signal(shutdown.clone()));

    let outcome = pool.join().await;
    if let Err(e) = &outcome {
        tracing::error!(error = %e, "Processing pool failed, shutting down");
    }
    shutdown.trigger();

    match server_task.await {
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server error"),
        Err(e) => tracing::error!(error = %e, "HTTP server task failed"),
        Ok(Ok(())) => {}
    }

    outcome?;
    tracing::info!("Shutdown complete");
    Ok(())
}
