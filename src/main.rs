// Allow dead code - accessors are kept for API completeness and tests
#![allow(dead_code)]

//! Consensus Monitor
//!
//! Self-contained simulator of a proof-of-stake master-node network that
//! streams health and security snapshots to live dashboards.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CONSENSUS MONITOR                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Simulation        ←── NetworkState + validator registry    │
//! │  Tick Scheduler    ←── one step every 2s, started lazily    │
//! │  Snapshot Builder  ←── Nakamoto, TPS, finality, sample      │
//! │  Broadcaster       ←── fan-out to connected subscribers     │
//! │  HTTP API (5000)   ←── /ws events, status and metrics       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod api;
mod broadcast;
mod config;
mod error;
mod nakamoto;
mod network_state;
mod registry;
mod scheduler;
mod simulation;
mod snapshot;
mod types;
mod violations;

#[cfg(test)]
mod tests;

use api::Metrics;
use broadcast::Broadcaster;
use config::MonitorConfig;

/// Consensus Monitor - simulated network health feed
#[derive(Parser, Debug)]
#[command(name = "consensus-monitor")]
#[command(version)]
#[command(about = "Simulated proof-of-stake network health feed for live dashboards", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "consensus-monitor.toml")]
    config: PathBuf,

    /// HTTP/WebSocket API port
    #[arg(long, default_value = "5000")]
    api_port: u16,

    /// Milliseconds between simulation ticks (overrides config file)
    #[arg(long)]
    tick_interval_ms: Option<u64>,

    /// RNG seed for a reproducible run (overrides config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write the effective configuration to the config path and exit
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into())
        )
        .init();

    info!("🌐 Consensus Monitor v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = if args.config.exists() {
        MonitorConfig::load(&args.config)?
    } else {
        warn!("Config file {:?} not found, using defaults", args.config);
        MonitorConfig::default()
    };

    // Override config with CLI args
    let config = config
        .with_api_port(args.api_port)
        .with_tick_interval_ms(args.tick_interval_ms)
        .with_rng_seed(args.seed);

    config.validate()?;

    if args.write_config {
        config.save(&args.config)?;
        info!("📝 Configuration written to {:?}", args.config);
        return Ok(());
    }

    info!("⚙️  Configuration:");
    info!("   API port: {}", config.api_port);
    info!("   Tick interval: {}ms", config.tick_interval_ms);
    info!("   Master nodes: {}", config.total_master_nodes);
    info!("   Starting round: {}", config.initial_round);
    if let Some(seed) = config.rng_seed {
        info!("   RNG seed: {}", seed);
    }

    let shared_config = Arc::new(config);
    let metrics = Arc::new(Metrics::new());
    let broadcaster = Arc::new(Broadcaster::new(&shared_config, metrics.clone()));
    info!("📦 Simulation initialized; tick loop starts on first subscriber");

    let shutdown = CancellationToken::new();

    let mut api_handle = tokio::spawn(api::run_api_server(
        shared_config.clone(),
        broadcaster.clone(),
        metrics.clone(),
        shutdown.clone(),
    ));

    info!("✅ Monitor started");
    info!("   Press Ctrl+C to shutdown gracefully");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Shutdown signal received");
        }
        result = &mut api_handle => {
            error!("HTTP API exited: {:?}", result);
        }
    }

    // Graceful shutdown: stop ticking, then drain the API
    broadcaster.shutdown().await;
    shutdown.cancel();
    if !api_handle.is_finished() {
        if let Err(e) = api_handle.await {
            error!("HTTP API task failed: {}", e);
        }
    }

    info!("👋 Consensus Monitor shutting down");
    Ok(())
}
