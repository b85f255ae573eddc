//! Grid bot entry point.
//!
//! Reads JSON-lines host events from a file (or stdin), runs them through
//! the strategy actor and writes order commands to stdout.

use anyhow::Result;
use clap::Parser;
use grid_bot::replay::{self, JsonlGateway};
use grid_bot::{AppConfig, GridStrategy, HostEvent, StrategyActor};
use tokio::io::BufReader;
use tracing::{debug, info};

/// Regime-adaptive grid strategy
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via GRID_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// JSON-lines event file. Reads stdin when omitted.
    #[arg(short, long)]
    events: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config path: CLI arg > GRID_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("GRID_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = AppConfig::from_file(&config_path)?;
    grid_telemetry::init_logging(&config.telemetry)?;

    info!("Starting grid bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = %config_path,
        symbol = %config.instrument.symbol,
        "Configuration loaded"
    );

    let strategy = GridStrategy::new(config.strategy.clone(), config.instrument.clone())?;
    let (actor, tx) = StrategyActor::new(
        strategy,
        Box::new(JsonlGateway::stdout()),
        config.runtime.channel_capacity,
    );
    let status = actor.status_handle();
    let actor_handle = tokio::spawn(actor.run());

    let feed = async {
        match &args.events {
            Some(path) => replay::feed_file(path, &tx).await,
            None => replay::feed_reader(BufReader::new(tokio::io::stdin()), &tx).await,
        }
    };

    tokio::select! {
        result = feed => {
            let sent = result?;
            info!(events = sent, "Event source exhausted");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    if tx.send(HostEvent::Shutdown).await.is_err() {
        debug!("Actor already stopped");
    }
    drop(tx);

    let stats = actor_handle.await??;
    let final_status = status.read().clone();
    info!(
        events = stats.events,
        commands = stats.commands,
        regime = ?final_status.regime,
        live_orders = final_status.live_orders,
        paused = final_status.risk.paused,
        realized_pnl = %final_status.risk.realized_pnl,
        "Shutting down"
    );

    Ok(())
}
