//! Cross-cycle P&L accounting and the safety stop
//!
//! The safety stop is a cumulative-loss circuit breaker:
//!
//! ```text
//! halt when cumulative_pnl < -(base_risk_amount * 5)
//! ```
//!
//! The comparison is strict, so a loss of exactly five risk units still
//! allows another cycle. The ledger keeps the append-only sequence of cycle
//! results and derives run statistics from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{CycleResult, Regime};

/// Risk units of cumulative loss tolerated before the run halts
pub const SAFETY_STOP_RISK_MULTIPLE: f64 = 5.0;

/// Cumulative-loss circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyStop {
    max_loss: f64,
}

impl SafetyStop {
    pub fn new(base_risk_amount: f64) -> Self {
        Self {
            max_loss: base_risk_amount * SAFETY_STOP_RISK_MULTIPLE,
        }
    }

    /// Largest tolerated cumulative loss, as a positive number
    pub fn max_loss(&self) -> f64 {
        self.max_loss
    }

    pub fn is_tripped(&self, cumulative_pnl: f64) -> bool {
        cumulative_pnl < -self.max_loss
    }
}

/// Aggregates derived from the cycle results of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total_cycles: usize,
    pub winning_cycles: usize,
    pub losing_cycles: usize,
    pub best_cycle_pnl: f64,
    pub worst_cycle_pnl: f64,
    /// Highest cumulative P&L reached (never below zero, the starting point)
    pub peak_cumulative_pnl: f64,
    /// Largest fall of cumulative P&L from its running peak
    pub max_drawdown: f64,
    pub cycles_by_regime: BTreeMap<Regime, usize>,
}

impl RunStatistics {
    pub fn win_rate(&self) -> f64 {
        if self.total_cycles == 0 {
            0.0
        } else {
            self.winning_cycles as f64 / self.total_cycles as f64
        }
    }
}

/// Append-only record of cycle results
#[derive(Debug, Clone, Default)]
pub struct PnlLedger {
    results: Vec<CycleResult>,
    stats: RunStatistics,
}

impl PnlLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result. Results must arrive in cycle order.
    pub fn record(&mut self, result: CycleResult) {
        debug_assert!(
            self.results
                .last()
                .map_or(true, |last| last.cycle_number < result.cycle_number),
            "cycle results out of order"
        );

        let stats = &mut self.stats;
        let pnl = result.realized_pnl;

        if stats.total_cycles == 0 {
            stats.best_cycle_pnl = pnl;
            stats.worst_cycle_pnl = pnl;
        } else {
            stats.best_cycle_pnl = stats.best_cycle_pnl.max(pnl);
            stats.worst_cycle_pnl = stats.worst_cycle_pnl.min(pnl);
        }
        stats.total_cycles += 1;

        if pnl > 0.0 {
            stats.winning_cycles += 1;
        } else if pnl < 0.0 {
            stats.losing_cycles += 1;
        }

        stats.peak_cumulative_pnl = stats.peak_cumulative_pnl.max(result.cumulative_pnl);
        let drawdown = stats.peak_cumulative_pnl - result.cumulative_pnl;
        stats.max_drawdown = stats.max_drawdown.max(drawdown);

        *stats.cycles_by_regime.entry(result.regime).or_insert(0) += 1;

        self.results.push(result);
    }

    pub fn results(&self) -> &[CycleResult] {
        &self.results
    }

    /// Sum of realized P&L over every recorded cycle
    pub fn total_pnl(&self) -> f64 {
        self.results.iter().map(|r| r.realized_pnl).sum()
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn into_parts(self) -> (Vec<CycleResult>, RunStatistics) {
        (self.results, self.stats)
    }
}
