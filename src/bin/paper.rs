//! Paper-trading harness for the trader core.
//!
//! Wires the dispatcher to the built-in simulated session: a random-walk
//! future book, a spread-following ETF book, and a toy matcher. Useful for
//! watching the engine behave end to end without a venue.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use basis_maker::trader::{
    init_logging, LogConfig, LogFormat, QuotingMode, RecordingSink, SimSession, TraderConfig,
};
use basis_maker::{AutoTrader, Result};

#[derive(Parser)]
#[command(name = "paper")]
#[command(version, about = "Run the trader against a simulated session", long_about = None)]
struct Cli {
    /// Path to a JSON config file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the quoting mode (theo, ladder).
    #[arg(long)]
    mode: Option<String>,

    /// Simulation steps to run.
    #[arg(long, default_value_t = 2000)]
    steps: u32,

    /// Random seed for the simulated feed.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Starting future mid price in minor currency units.
    #[arg(long, default_value_t = 100_000)]
    start_mid: u64,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format (pretty, json, compact).
    #[arg(long, default_value = "pretty")]
    log_format: String,

    /// Directory for a daily-rolling log file (disabled when omitted).
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig {
        level: cli.log_level.clone(),
        format: match cli.log_format.as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        },
        file_dir: cli.log_dir.clone(),
    };
    let _guard = init_logging(&log_config);

    let mut config = match &cli.config {
        Some(path) => TraderConfig::from_file(path)?,
        None => TraderConfig::default(),
    };
    if let Some(mode) = &cli.mode {
        config.quoting = match mode.as_str() {
            "ladder" => QuotingMode::Ladder,
            _ => QuotingMode::Theo,
        };
    }

    info!(
        mode = ?config.quoting,
        steps = cli.steps,
        seed = cli.seed,
        "starting paper session"
    );

    let sink = Arc::new(RecordingSink::new());
    let mut trader = AutoTrader::new(config.clone(), sink.clone())?;
    let mut sim = SimSession::new(cli.seed, config.tick_size, cli.start_mid, config.position_limit);

    for step in 0..cli.steps {
        for event in sim.step() {
            trader.on_event(event).await;
        }
        for command in sink.drain() {
            sim.apply(command);
        }
        if step % 500 == 0 {
            info!(
                step,
                position = trader.position(),
                delta = trader.delta(),
                open_orders = trader.open_orders(),
                "session progress"
            );
        }
    }

    let metrics = trader.metrics();
    info!(
        inserts = metrics.inserts,
        cancels = metrics.cancels,
        hedges = metrics.hedges,
        arb_trades = metrics.arb_trades,
        throttled_skips = metrics.throttled_skips,
        stale_drops = metrics.stale_drops,
        errors_seen = metrics.errors_seen,
        position = trader.position(),
        delta = trader.delta(),
        "paper session complete"
    );
    Ok(())
}
