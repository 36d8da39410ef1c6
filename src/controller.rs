//! Cycle controller
//!
//! Runs `snapshot -> classify -> dispatch -> account -> pause` until one of
//! three things happens:
//!
//! - cumulative loss trips the safety stop (no cleanup)
//! - the shutdown signal fires (one emergency close)
//! - any step fails (one emergency close, run state preserved)
//!
//! `run` is the single error boundary. It never returns an error; the
//! termination reason and P&L reached so far are always in the summary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::dispatcher::StrategyDispatcher;
use crate::error::TraderError;
use crate::gateway::{fetch_snapshot, TradingGateway};
use crate::regime::{classify, ClassifierConfig};
use crate::report::CycleReporter;
use crate::risk::{PnlLedger, RunStatistics, SafetyStop};
use crate::shutdown::ShutdownSignal;
use crate::strategies::StrategyRegistry;
use crate::{CycleResult, Symbol, TerminationReason};

/// Mutable per-run state, owned by a single `run` call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub cumulative_pnl: f64,
    /// Number of the cycle in progress (or last started)
    pub cycle_number: u64,
    /// Set once the run has reached a terminal state; no cycle starts after
    pub stopped: bool,
}

/// Final report of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub symbol: Symbol,
    /// `None` when the balance could not be read at start
    pub initial_balance: Option<f64>,
    /// Balance after the last completed cycle, else the initial balance
    pub final_balance: Option<f64>,
    pub cumulative_pnl: f64,
    /// Completed cycles
    pub cycles: u64,
    pub reason: TerminationReason,
    pub emergency_close_attempted: bool,
    pub statistics: RunStatistics,
    pub results: Vec<CycleResult>,
}

pub struct CycleController {
    symbol: Symbol,
    classifier: ClassifierConfig,
    dispatcher: StrategyDispatcher,
    safety: SafetyStop,
    cycle_interval: Duration,
    gateway: Arc<dyn TradingGateway>,
    reporter: Arc<dyn CycleReporter>,
    clock: Arc<dyn Clock>,
}

impl CycleController {
    pub fn new(
        config: &Config,
        gateway: Arc<dyn TradingGateway>,
        registry: StrategyRegistry,
        reporter: Arc<dyn CycleReporter>,
    ) -> Result<Self, TraderError> {
        config.validate()?;

        let dispatch = config.dispatch();
        Ok(Self {
            symbol: dispatch.symbol.clone(),
            classifier: config.classifier(),
            safety: SafetyStop::new(dispatch.base_risk_amount),
            dispatcher: StrategyDispatcher::new(dispatch, registry),
            cycle_interval: config.trading.cycle_interval(),
            gateway,
            reporter,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cycle_interval(mut self, interval: Duration) -> Self {
        self.cycle_interval = interval;
        self
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn safety_stop(&self) -> SafetyStop {
        self.safety
    }

    /// Run until safety stop, cancellation, or failure
    pub async fn run(&self, shutdown: &ShutdownSignal) -> RunSummary {
        let mut state = RunState::default();
        let mut ledger = PnlLedger::new();
        let mut initial_balance = None;

        let reason = match self
            .run_cycles(shutdown, &mut state, &mut ledger, &mut initial_balance)
            .await
        {
            Ok(reason) => reason,
            Err(e) => {
                error!("Run on {} failed: {:#}", self.symbol, e);
                state.stopped = true;
                TerminationReason::FatalError(format!("{:#}", e))
            }
        };

        let emergency_close_attempted = matches!(
            reason,
            TerminationReason::Cancelled | TerminationReason::FatalError(_)
        );
        if emergency_close_attempted {
            self.emergency_close().await;
        }

        // Last balance seen by the run, no extra account query
        let final_balance = ledger
            .results()
            .last()
            .map(|r| r.balance_after)
            .or(initial_balance);

        let (results, statistics) = ledger.into_parts();
        let summary = RunSummary {
            symbol: self.symbol.clone(),
            initial_balance,
            final_balance,
            cumulative_pnl: state.cumulative_pnl,
            cycles: results.len() as u64,
            reason,
            emergency_close_attempted,
            statistics,
            results,
        };

        self.reporter.run_finished(&summary);
        summary
    }

    async fn run_cycles(
        &self,
        shutdown: &ShutdownSignal,
        state: &mut RunState,
        ledger: &mut PnlLedger,
        initial_balance: &mut Option<f64>,
    ) -> Result<TerminationReason> {
        let mut last_balance = self
            .gateway
            .get_balance()
            .await
            .context("Failed to fetch initial balance")?;
        *initial_balance = Some(last_balance);
        self.reporter.run_started(&self.symbol, last_balance);

        let mut reason = TerminationReason::Cancelled;
        while !state.stopped {
            if let Some(stop) = self
                .run_cycle(shutdown, state, ledger, &mut last_balance)
                .await?
            {
                state.stopped = true;
                reason = stop;
            }
        }
        Ok(reason)
    }

    /// One cycle plus the pause after it. `Some` ends the run.
    async fn run_cycle(
        &self,
        shutdown: &ShutdownSignal,
        state: &mut RunState,
        ledger: &mut PnlLedger,
        last_balance: &mut f64,
    ) -> Result<Option<TerminationReason>> {
        if shutdown.is_triggered() {
            return Ok(Some(TerminationReason::Cancelled));
        }

        state.cycle_number += 1;
        let cycle = state.cycle_number;

        let snapshot = fetch_snapshot(self.gateway.as_ref(), &self.symbol)
            .await
            .with_context(|| format!("Cycle {}: market snapshot failed", cycle))?;

        if shutdown.is_triggered() {
            return Ok(Some(TerminationReason::Cancelled));
        }

        let now = self.clock.now();
        let decision = classify(&snapshot, now, &self.classifier);
        info!(
            cycle,
            regime = %decision.regime,
            spread = decision.spread_points,
            "Regime: {}",
            decision.rationale
        );

        let pnl = self
            .dispatcher
            .dispatch(&decision, now)
            .await
            .with_context(|| format!("Cycle {}: {} strategy failed", cycle, decision.regime))?;

        state.cumulative_pnl += pnl;

        // Balance is informational; an estimate keeps the run going.
        let balance_after = match self.gateway.get_balance().await {
            Ok(balance) => balance,
            Err(e) => {
                warn!("Cycle {}: balance unavailable, estimating: {:#}", cycle, e);
                *last_balance + pnl
            }
        };
        *last_balance = balance_after;

        let result = CycleResult {
            cycle_number: cycle,
            regime: decision.regime,
            realized_pnl: pnl,
            balance_after,
            cumulative_pnl: state.cumulative_pnl,
            completed_at: self.clock.now(),
        };
        ledger.record(result.clone());

        let tripped = self.safety.is_tripped(state.cumulative_pnl);
        state.stopped = tripped;
        self.reporter.cycle_completed(&result, state);

        if tripped {
            warn!(
                "Safety stop: cumulative P&L {:.2} is below -{:.2}",
                state.cumulative_pnl,
                self.safety.max_loss()
            );
            return Ok(Some(TerminationReason::SafetyStop));
        }

        if shutdown.is_triggered() {
            return Ok(Some(TerminationReason::Cancelled));
        }

        debug!("Pausing {:?} before cycle {}", self.cycle_interval, cycle + 1);
        if !shutdown.sleep(self.cycle_interval).await {
            return Ok(Some(TerminationReason::Cancelled));
        }

        Ok(None)
    }

    async fn emergency_close(&self) {
        warn!("Emergency close of all {} positions", self.symbol);
        match self.gateway.close_all(&self.symbol).await {
            Ok(closed) => info!("Emergency close done: {} position(s) closed", closed),
            Err(e) => error!("Emergency close failed for {}: {:#}", self.symbol, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{AccountPort, EmergencyClosePort, MarketDataPort};
    use crate::report::LogReporter;
    use crate::strategies::{StrategyModule, StrategyParams};
    use crate::Tick;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fixed quote; `balance: None` makes every balance read fail
    struct StubGateway {
        balance: Option<f64>,
        closes: AtomicUsize,
    }

    impl StubGateway {
        fn new(balance: Option<f64>) -> Self {
            Self {
                balance,
                closes: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketDataPort for StubGateway {
        async fn get_tick(&self, _symbol: &Symbol) -> Result<Tick> {
            Ok(Tick {
                bid: 1.1,
                ask: 1.10001,
                time: Utc::now(),
            })
        }

        async fn get_point_size(&self, _symbol: &Symbol) -> Result<f64> {
            Ok(0.00001)
        }
    }

    #[async_trait]
    impl AccountPort for StubGateway {
        async fn get_balance(&self) -> Result<f64> {
            self.balance
                .ok_or_else(|| anyhow!("account service unavailable"))
        }
    }

    #[async_trait]
    impl EmergencyClosePort for StubGateway {
        async fn close_all(&self, _symbol: &Symbol) -> Result<usize> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }
    }

    struct Flat;

    #[async_trait]
    impl StrategyModule for Flat {
        fn name(&self) -> &'static str {
            "flat"
        }

        async fn execute(&self, _params: &StrategyParams) -> Result<f64> {
            Ok(0.0)
        }
    }

    struct Losing(f64);

    #[async_trait]
    impl StrategyModule for Losing {
        fn name(&self) -> &'static str {
            "losing"
        }

        async fn execute(&self, _params: &StrategyParams) -> Result<f64> {
            Ok(-self.0)
        }
    }

    /// Keeps a copy of the run state seen with each cycle
    #[derive(Default)]
    struct StateRecorder {
        states: Mutex<Vec<RunState>>,
    }

    impl CycleReporter for StateRecorder {
        fn run_started(&self, _symbol: &Symbol, _initial_balance: f64) {}

        fn cycle_completed(&self, _result: &CycleResult, state: &RunState) {
            self.states.lock().unwrap().push(state.clone());
        }

        fn run_finished(&self, _summary: &RunSummary) {}
    }

    #[tokio::test]
    async fn test_stopped_is_set_on_the_cycle_that_trips_safety_stop() {
        let recorder = Arc::new(StateRecorder::default());
        // Default base risk 20 gives a 100 limit: -60, -120
        let controller = CycleController::new(
            &Config::default(),
            Arc::new(StubGateway::new(Some(10_000.0))),
            StrategyRegistry::uniform(Arc::new(Losing(60.0))),
            recorder.clone(),
        )
        .unwrap()
        .with_cycle_interval(Duration::from_millis(1));

        let summary = controller.run(&ShutdownSignal::new()).await;

        assert_eq!(summary.reason, TerminationReason::SafetyStop);
        assert!(!summary.emergency_close_attempted);

        let states = recorder.states.lock().unwrap();
        assert_eq!(states.len(), 2);
        assert!(!states[0].stopped);
        assert_eq!(states[0].cycle_number, 1);
        assert!(states[1].stopped);
        assert_eq!(states[1].cumulative_pnl, -120.0);
    }

    #[tokio::test]
    async fn test_initial_balance_failure_is_contained() {
        let gateway = Arc::new(StubGateway::new(None));
        let controller = CycleController::new(
            &Config::default(),
            gateway.clone(),
            StrategyRegistry::uniform(Arc::new(Flat)),
            Arc::new(LogReporter),
        )
        .unwrap();

        let summary = controller.run(&ShutdownSignal::new()).await;

        assert!(matches!(summary.reason, TerminationReason::FatalError(_)));
        assert_eq!(summary.initial_balance, None);
        assert_eq!(summary.final_balance, None);
        assert_eq!(summary.cycles, 0);
        assert!(summary.emergency_close_attempted);
        assert_eq!(gateway.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = Config::default();
        config.trading.base_risk_amount = -1.0;

        let result = CycleController::new(
            &config,
            Arc::new(StubGateway::new(None)),
            StrategyRegistry::uniform(Arc::new(Flat)),
            Arc::new(LogReporter),
        );
        assert!(matches!(result, Err(TraderError::InvalidConfig(_))));
    }

    #[test]
    fn test_safety_stop_derived_from_config() {
        let controller = CycleController::new(
            &Config::default(),
            Arc::new(StubGateway::new(None)),
            StrategyRegistry::uniform(Arc::new(Flat)),
            Arc::new(LogReporter),
        )
        .unwrap();
        assert_eq!(controller.safety_stop().max_loss(), 100.0);
        assert_eq!(controller.symbol().as_str(), "EURUSD");
    }
}
