//! Cycle and run reporting
//!
//! Reporters are sinks: they see every cycle result (with the run state
//! after the update) and the final summary, and must not influence the run.

use itertools::Itertools;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::controller::{RunState, RunSummary};
use crate::{CycleResult, Symbol, TerminationReason};

pub trait CycleReporter: Send + Sync {
    fn run_started(&self, symbol: &Symbol, initial_balance: f64);

    fn cycle_completed(&self, result: &CycleResult, state: &RunState);

    fn run_finished(&self, summary: &RunSummary);
}

/// One line per cycle
pub fn format_cycle(result: &CycleResult) -> String {
    format!(
        "Cycle {} [{}] pnl={:+.2} cumulative={:+.2} balance={:.2}",
        result.cycle_number,
        result.regime,
        result.realized_pnl,
        result.cumulative_pnl,
        result.balance_after
    )
}

/// Multi-line final report
pub fn format_summary(summary: &RunSummary) -> String {
    let balance = |b: Option<f64>| b.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v));
    let stats = &summary.statistics;

    let mut lines = vec![
        format!("Run summary for {}", summary.symbol),
        format!("  Termination:     {}", summary.reason),
        format!("  Cycles:          {}", summary.cycles),
        format!("  Initial balance: {}", balance(summary.initial_balance)),
        format!("  Final balance:   {}", balance(summary.final_balance)),
        format!("  Cumulative P&L:  {:+.2}", summary.cumulative_pnl),
        format!(
            "  Wins/Losses:     {}/{} ({:.1}% win rate)",
            stats.winning_cycles,
            stats.losing_cycles,
            stats.win_rate() * 100.0
        ),
        format!("  Max drawdown:    {:.2}", stats.max_drawdown),
    ];

    if !stats.cycles_by_regime.is_empty() {
        let regimes = stats
            .cycles_by_regime
            .iter()
            .map(|(regime, count)| format!("{}={}", regime, count))
            .join(", ");
        lines.push(format!("  Regimes:         {}", regimes));
    }

    lines.join("\n")
}

/// Writes through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl CycleReporter for LogReporter {
    fn run_started(&self, symbol: &Symbol, initial_balance: f64) {
        info!(
            symbol = %symbol,
            balance = initial_balance,
            "Starting regime dispatcher on {} (balance {:.2})",
            symbol,
            initial_balance
        );
    }

    fn cycle_completed(&self, result: &CycleResult, _state: &RunState) {
        info!("{}", format_cycle(result));
    }

    fn run_finished(&self, summary: &RunSummary) {
        let report = format_summary(summary);
        match summary.reason {
            TerminationReason::FatalError(_) => {
                for line in report.lines() {
                    warn!("{}", line);
                }
            }
            _ => {
                for line in report.lines() {
                    info!("{}", line);
                }
            }
        }
    }
}

/// Event stream for a host process
#[derive(Debug, Clone)]
pub enum RunEvent {
    Started { symbol: Symbol, initial_balance: f64 },
    Cycle(CycleResult),
    Finished(Box<RunSummary>),
}

/// Forwards every report as a [`RunEvent`]. A dropped receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CycleReporter for ChannelReporter {
    fn run_started(&self, symbol: &Symbol, initial_balance: f64) {
        let _ = self.tx.send(RunEvent::Started {
            symbol: symbol.clone(),
            initial_balance,
        });
    }

    fn cycle_completed(&self, result: &CycleResult, _state: &RunState) {
        let _ = self.tx.send(RunEvent::Cycle(result.clone()));
    }

    fn run_finished(&self, summary: &RunSummary) {
        let _ = self.tx.send(RunEvent::Finished(Box::new(summary.clone())));
    }
}
