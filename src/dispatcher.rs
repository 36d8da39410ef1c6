//! Regime -> strategy dispatch
//!
//! Builds the fixed, regime-optimized parameter set and hands it to the
//! module registered for the regime. No retries: a module error goes back to
//! the caller as-is. A NaN or infinite result is an error too.

use anyhow::{bail, Result};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::strategies::{
    BreakoutParams, GridParams, HedgeParams, NewsStraddleParams, ScalpingParams, StrategyParams,
    StrategyRegistry,
};
use crate::{Regime, RegimeDecision, Side, Symbol};

/// Run-level inputs every parameter set is derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub symbol: Symbol,
    pub base_risk_amount: f64,
}

/// Parameter set for `regime`.
///
/// Deterministic apart from the direction of scalping and hedging, which
/// follows the parity of `now`'s second.
pub fn parameters_for(regime: Regime, config: &DispatchConfig, now: DateTime<Utc>) -> StrategyParams {
    let symbol = config.symbol.clone();
    let side = Side::from_second_parity(now.second());

    match regime {
        Regime::Grid => StrategyParams::Grid(GridParams::new(symbol)),
        Regime::Scalping => StrategyParams::Scalping(ScalpingParams::new(
            symbol,
            config.base_risk_amount,
            side,
        )),
        Regime::HighVolatilityHedge => StrategyParams::Hedge(HedgeParams::new(
            symbol,
            config.base_risk_amount,
            side == Side::Buy,
        )),
        Regime::News => StrategyParams::NewsStraddle(NewsStraddleParams::new(symbol)),
        Regime::Breakout => StrategyParams::Breakout(BreakoutParams::new(symbol)),
    }
}

/// Resolves a regime decision to a module invocation
#[derive(Debug, Clone)]
pub struct StrategyDispatcher {
    config: DispatchConfig,
    registry: StrategyRegistry,
}

impl StrategyDispatcher {
    pub fn new(config: DispatchConfig, registry: StrategyRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn build_params(&self, regime: Regime, now: DateTime<Utc>) -> StrategyParams {
        parameters_for(regime, &self.config, now)
    }

    /// Execute the module for `decision` and return its realized P&L
    pub async fn dispatch(&self, decision: &RegimeDecision, now: DateTime<Utc>) -> Result<f64> {
        let params = self.build_params(decision.regime, now);
        let module = self.registry.module_for(decision.regime);

        info!(
            regime = %decision.regime,
            module = module.name(),
            sl = params.stop_loss_points(),
            tp = params.take_profit_points(),
            "Dispatching strategy"
        );
        debug!(?params, "Strategy parameters");

        let pnl = module.execute(&params).await?;
        if !pnl.is_finite() {
            bail!("{} module returned non-finite P&L {}", module.name(), pnl);
        }

        debug!(regime = %decision.regime, pnl, "Strategy finished");
        Ok(pnl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn config() -> DispatchConfig {
        DispatchConfig {
            symbol: Symbol::new("EURUSD"),
            base_risk_amount: 20.0,
        }
    }

    fn at_second(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 3, 0, second).unwrap()
    }

    #[test]
    fn test_grid_parameters() {
        let StrategyParams::Grid(p) = parameters_for(Regime::Grid, &config(), at_second(0)) else {
            panic!("expected grid parameters");
        };
        assert_eq!(p.levels, 3);
        assert_eq!(p.spacing_points, 20.0);
        assert_eq!(p.volume_per_level, 0.01);
        assert_eq!(p.stop_loss_points, 30.0);
        assert_eq!(p.take_profit_points, 50.0);
        assert_eq!(p.symbol.as_str(), "EURUSD");
    }

    #[test]
    fn test_scalping_parameters_follow_second_parity() {
        let StrategyParams::Scalping(even) =
            parameters_for(Regime::Scalping, &config(), at_second(10))
        else {
            panic!("expected scalping parameters");
        };
        assert_eq!(even.risk_amount, 20.0);
        assert_eq!(even.stop_loss_points, 15.0);
        assert_eq!(even.take_profit_points, 25.0);
        assert_eq!(even.side, Side::Buy);

        let StrategyParams::Scalping(odd) =
            parameters_for(Regime::Scalping, &config(), at_second(11))
        else {
            panic!("expected scalping parameters");
        };
        assert_eq!(odd.side, Side::Sell);
    }

    #[test]
    fn test_hedge_parameters() {
        let StrategyParams::Hedge(p) =
            parameters_for(Regime::HighVolatilityHedge, &config(), at_second(3))
        else {
            panic!("expected hedge parameters");
        };
        assert_relative_eq!(p.risk_amount, 14.0, epsilon = 1e-9);
        assert_eq!(p.stop_loss_points, 25.0);
        assert_eq!(p.take_profit_points, 40.0);
        assert_eq!(p.hedge_trigger_points, 15.0);
        assert!(!p.open_buy_first);
    }

    #[test]
    fn test_news_parameters() {
        let StrategyParams::NewsStraddle(p) = parameters_for(Regime::News, &config(), at_second(0))
        else {
            panic!("expected news parameters");
        };
        assert_eq!(p.straddle_distance_points, 15.0);
        assert_eq!(p.volume, 0.02);
        assert_eq!(p.stop_loss_points, 20.0);
        assert_eq!(p.take_profit_points, 40.0);
        assert_eq!(p.countdown_secs, 30);
        assert_eq!(p.max_wait_after_news_secs, 120);
    }

    #[test]
    fn test_breakout_parameters() {
        let StrategyParams::Breakout(p) =
            parameters_for(Regime::Breakout, &config(), at_second(0))
        else {
            panic!("expected breakout parameters");
        };
        assert_eq!(p.volume, 0.01);
        assert_eq!(p.breakout_distance_points, 20.0);
        assert_eq!(p.stop_loss_points, 20.0);
        assert_eq!(p.take_profit_points, 40.0);
        assert_eq!(p.max_wait_secs, 180);
    }

    struct Returns(f64);

    #[async_trait::async_trait]
    impl crate::strategies::StrategyModule for Returns {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn execute(&self, _params: &StrategyParams) -> Result<f64> {
            Ok(self.0)
        }
    }

    fn decision(regime: Regime) -> RegimeDecision {
        RegimeDecision {
            regime,
            spread_points: 1.0,
            volatility_points: 10.0,
            rationale: String::new(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_returns_module_pnl() {
        let dispatcher = StrategyDispatcher::new(
            config(),
            StrategyRegistry::uniform(std::sync::Arc::new(Returns(-12.5))),
        );
        let pnl = dispatcher
            .dispatch(&decision(Regime::Grid), at_second(0))
            .await
            .unwrap();
        assert_eq!(pnl, -12.5);
    }

    #[tokio::test]
    async fn test_dispatch_rejects_non_finite_pnl() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let dispatcher = StrategyDispatcher::new(
                config(),
                StrategyRegistry::uniform(std::sync::Arc::new(Returns(bad))),
            );
            let err = dispatcher
                .dispatch(&decision(Regime::Scalping), at_second(0))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("non-finite"));
        }
    }

    #[test]
    fn test_every_regime_maps_to_matching_parameters() {
        for regime in Regime::ALL {
            assert_eq!(parameters_for(regime, &config(), at_second(0)).regime(), regime);
        }
    }
}
