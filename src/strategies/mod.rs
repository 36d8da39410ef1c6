//! Strategy modules
//!
//! The dispatcher only knows strategies through one contract: execute with a
//! fixed parameter set and report the realized P&L. What happens in between
//! (order placement, fills, waiting) belongs to the module.
//!
//! - [`StrategyModule`]: the execution contract
//! - [`StrategyParams`]: one parameter set per regime
//! - [`StrategyRegistry`]: regime -> module, exhaustive by construction

pub mod breakout;
pub mod grid;
pub mod hedge;
pub mod news;
pub mod scalping;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::{Regime, Symbol};

pub use breakout::BreakoutParams;
pub use grid::GridParams;
pub use hedge::HedgeParams;
pub use news::NewsStraddleParams;
pub use scalping::ScalpingParams;

// =============================================================================
// Strategy Trait - The contract all modules implement
// =============================================================================

/// A bounded unit of trading work.
///
/// `execute` may block for as long as the module's own timing limits allow;
/// the caller never times it out or interrupts it. Errors propagate to the
/// caller untouched.
#[async_trait]
pub trait StrategyModule: Send + Sync {
    /// Module identifier for logs
    fn name(&self) -> &'static str;

    /// Run the strategy to completion and return the realized P&L
    async fn execute(&self, params: &StrategyParams) -> Result<f64>;
}

// =============================================================================
// Parameter sets
// =============================================================================

/// Parameters handed to a module, tagged by the regime they were built for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyParams {
    Grid(GridParams),
    Scalping(ScalpingParams),
    Hedge(HedgeParams),
    NewsStraddle(NewsStraddleParams),
    Breakout(BreakoutParams),
}

impl StrategyParams {
    pub fn regime(&self) -> Regime {
        match self {
            StrategyParams::Grid(_) => Regime::Grid,
            StrategyParams::Scalping(_) => Regime::Scalping,
            StrategyParams::Hedge(_) => Regime::HighVolatilityHedge,
            StrategyParams::NewsStraddle(_) => Regime::News,
            StrategyParams::Breakout(_) => Regime::Breakout,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        match self {
            StrategyParams::Grid(p) => &p.symbol,
            StrategyParams::Scalping(p) => &p.symbol,
            StrategyParams::Hedge(p) => &p.symbol,
            StrategyParams::NewsStraddle(p) => &p.symbol,
            StrategyParams::Breakout(p) => &p.symbol,
        }
    }

    pub fn stop_loss_points(&self) -> f64 {
        match self {
            StrategyParams::Grid(p) => p.stop_loss_points,
            StrategyParams::Scalping(p) => p.stop_loss_points,
            StrategyParams::Hedge(p) => p.stop_loss_points,
            StrategyParams::NewsStraddle(p) => p.stop_loss_points,
            StrategyParams::Breakout(p) => p.stop_loss_points,
        }
    }

    pub fn take_profit_points(&self) -> f64 {
        match self {
            StrategyParams::Grid(p) => p.take_profit_points,
            StrategyParams::Scalping(p) => p.take_profit_points,
            StrategyParams::Hedge(p) => p.take_profit_points,
            StrategyParams::NewsStraddle(p) => p.take_profit_points,
            StrategyParams::Breakout(p) => p.take_profit_points,
        }
    }

    /// Upper bound on how long the module waits for its setup, if it has one
    pub fn time_limit(&self) -> Option<Duration> {
        match self {
            StrategyParams::NewsStraddle(p) => Some(p.time_limit()),
            StrategyParams::Breakout(p) => Some(p.time_limit()),
            _ => None,
        }
    }
}

// =============================================================================
// Strategy Registry
// =============================================================================

/// One module per regime.
///
/// A struct rather than a map so a missing regime is a compile error, not a
/// lookup failure at dispatch time.
#[derive(Clone)]
pub struct StrategyRegistry {
    grid: Arc<dyn StrategyModule>,
    scalping: Arc<dyn StrategyModule>,
    hedge: Arc<dyn StrategyModule>,
    news: Arc<dyn StrategyModule>,
    breakout: Arc<dyn StrategyModule>,
}

impl StrategyRegistry {
    pub fn new(
        grid: Arc<dyn StrategyModule>,
        scalping: Arc<dyn StrategyModule>,
        hedge: Arc<dyn StrategyModule>,
        news: Arc<dyn StrategyModule>,
        breakout: Arc<dyn StrategyModule>,
    ) -> Self {
        Self {
            grid,
            scalping,
            hedge,
            news,
            breakout,
        }
    }

    /// Route every regime to the same module
    pub fn uniform(module: Arc<dyn StrategyModule>) -> Self {
        Self::new(
            module.clone(),
            module.clone(),
            module.clone(),
            module.clone(),
            module,
        )
    }

    pub fn module_for(&self, regime: Regime) -> &Arc<dyn StrategyModule> {
        match regime {
            Regime::Grid => &self.grid,
            Regime::Scalping => &self.scalping,
            Regime::HighVolatilityHedge => &self.hedge,
            Regime::News => &self.news,
            Regime::Breakout => &self.breakout,
        }
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("grid", &self.grid.name())
            .field("scalping", &self.scalping.name())
            .field("hedge", &self.hedge.name())
            .field("news", &self.news.name())
            .field("breakout", &self.breakout.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl StrategyModule for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn execute(&self, _params: &StrategyParams) -> Result<f64> {
            Ok(0.0)
        }
    }

    #[test]
    fn test_registry_routes_each_regime() {
        let registry = StrategyRegistry::new(
            Arc::new(Named("grid")),
            Arc::new(Named("scalping")),
            Arc::new(Named("hedge")),
            Arc::new(Named("news")),
            Arc::new(Named("breakout")),
        );

        assert_eq!(registry.module_for(Regime::Grid).name(), "grid");
        assert_eq!(registry.module_for(Regime::Scalping).name(), "scalping");
        assert_eq!(
            registry.module_for(Regime::HighVolatilityHedge).name(),
            "hedge"
        );
        assert_eq!(registry.module_for(Regime::News).name(), "news");
        assert_eq!(registry.module_for(Regime::Breakout).name(), "breakout");
    }

    #[test]
    fn test_params_report_their_regime() {
        let symbol = Symbol::new("EURUSD");
        assert_eq!(
            StrategyParams::Grid(GridParams::new(symbol.clone())).regime(),
            Regime::Grid
        );
        assert_eq!(
            StrategyParams::NewsStraddle(NewsStraddleParams::new(symbol.clone())).regime(),
            Regime::News
        );
        assert_eq!(
            StrategyParams::Breakout(BreakoutParams::new(symbol)).time_limit(),
            Some(Duration::from_secs(180))
        );
    }

    #[test]
    fn test_params_serialize_with_strategy_tag() {
        let params = StrategyParams::Grid(GridParams::new(Symbol::new("EURUSD")));
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["strategy"], "grid");
        assert_eq!(json["levels"], 3);
    }
}
