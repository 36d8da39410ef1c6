//! Run command
//!
//! Wires the paper gateway, the paper strategy module and the cycle
//! controller together and runs until the safety stop, Ctrl+C, or the
//! optional deadline.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use regime_trader::paper::{PaperGateway, PaperStrategy};
use regime_trader::report::LogReporter;
use regime_trader::strategies::StrategyRegistry;
use regime_trader::{Config, CycleController, ShutdownSignal, TerminationReason};

pub fn run(
    config_path: Option<String>,
    symbol_override: Option<String>,
    risk_override: Option<f64>,
    interval_override: Option<u64>,
    duration: Option<u64>,
) -> Result<()> {
    let mut config = Config::load(config_path.as_deref())?;

    if let Some(symbol) = symbol_override {
        info!("Overriding symbol to: {}", symbol);
        config.trading.symbol = symbol;
    }

    if let Some(risk) = risk_override {
        info!("Overriding base risk amount to: {:.2}", risk);
        config.trading.base_risk_amount = risk;
    }

    if let Some(interval) = interval_override {
        info!("Overriding cycle interval to: {}s", interval);
        config.trading.cycle_interval_secs = interval;
    }

    config.validate().context("Invalid configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(run_async(config, duration.map(Duration::from_secs)))
}

async fn run_async(config: Config, deadline: Option<Duration>) -> Result<()> {
    let symbol = config.trading.symbol();

    info!("{}", "=".repeat(60));
    info!("REGIME TRADER - PAPER MODE");
    info!("{}", "=".repeat(60));
    info!("Symbol:           {}", symbol);
    info!("Base risk:        {:.2}", config.trading.base_risk_amount);
    info!(
        "Volatility bands: {} / {} points",
        config.trading.low_vol_threshold, config.trading.high_vol_threshold
    );
    info!("News filter:      {}", config.trading.news_enabled);
    info!("Cycle interval:   {}s", config.trading.cycle_interval_secs);
    info!("{}", "=".repeat(60));

    let gateway = Arc::new(
        PaperGateway::new(symbol, config.paper.clone()).context("Failed to create paper gateway")?,
    );
    let strategy = Arc::new(PaperStrategy::new(gateway.clone()));
    let registry = StrategyRegistry::uniform(strategy);

    let controller = CycleController::new(&config, gateway, registry, Arc::new(LogReporter))
        .context("Failed to create cycle controller")?;

    let shutdown = ShutdownSignal::new();
    let _ctrl_c = shutdown.listen_for_ctrl_c();
    let _deadline = deadline.map(|d| shutdown.trigger_after(d));

    info!("Starting trading loop...");
    let summary = controller.run(&shutdown).await;

    match &summary.reason {
        TerminationReason::FatalError(msg) => {
            warn!("Run ended on error after {} cycles", summary.cycles);
            anyhow::bail!("Run failed: {}", msg)
        }
        reason => {
            info!(
                "Run ended ({}). Cumulative P&L: {:+.2}",
                reason, summary.cumulative_pnl
            );
            Ok(())
        }
    }
}
