//! Paper strategy module
//!
//! One module for all five parameter sets. Entry and exit are sampled from
//! the paper gateway around a hold period and the move between them is
//! settled as a bracket trade.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::gateway::PaperGateway;
use crate::gateway::MarketDataPort;
use crate::strategies::{StrategyModule, StrategyParams};
use crate::Side;

/// Smallest tradable volume step in lots
const VOLUME_STEP: f64 = 0.01;

/// Volume that loses `risk_amount` at the stop loss, floored to the volume
/// step and never below one step
pub fn risk_volume(risk_amount: f64, stop_loss_points: f64, point_value_per_lot: f64) -> f64 {
    let raw = risk_amount / (stop_loss_points * point_value_per_lot);
    let steps = (raw / VOLUME_STEP + 1e-9).floor();
    (steps * VOLUME_STEP).max(VOLUME_STEP)
}

/// Realized P&L of one bracket given the price move in points.
///
/// `grid_side` is the side the grid ladder leans, which depends on where the
/// entry sits relative to the anchor price.
pub fn bracket_pnl(
    params: &StrategyParams,
    move_points: f64,
    grid_side: Side,
    point_value_per_lot: f64,
) -> f64 {
    let sl = params.stop_loss_points();
    let tp = params.take_profit_points();

    let (points, volume) = match params {
        StrategyParams::Grid(p) => (grid_side.sign() * move_points, p.total_volume()),
        StrategyParams::Scalping(p) => (
            p.side.sign() * move_points,
            risk_volume(p.risk_amount, p.stop_loss_points, point_value_per_lot),
        ),
        StrategyParams::Hedge(p) => {
            let signed = p.first_side().sign() * move_points;
            (
                signed.max(-p.hedge_trigger_points),
                risk_volume(p.risk_amount, p.stop_loss_points, point_value_per_lot),
            )
        }
        StrategyParams::NewsStraddle(p) => (
            pending_fill(move_points, p.straddle_distance_points),
            p.volume,
        ),
        StrategyParams::Breakout(p) => (
            pending_fill(move_points, p.breakout_distance_points),
            p.volume,
        ),
    };

    let pnl = points.clamp(-sl, tp) * volume * point_value_per_lot;
    (pnl * 100.0).round() / 100.0
}

/// Points gained by a pending order `distance` away that fills in the
/// direction of the move; zero when neither side triggers
fn pending_fill(move_points: f64, distance: f64) -> f64 {
    if move_points.abs() >= distance {
        move_points.abs() - distance
    } else {
        0.0
    }
}

pub struct PaperStrategy {
    gateway: Arc<PaperGateway>,
    hold: Duration,
    point_value_per_lot: f64,
}

impl PaperStrategy {
    pub fn new(gateway: Arc<PaperGateway>) -> Self {
        let hold = gateway.config().hold();
        let point_value_per_lot = gateway.config().point_value_per_lot;
        Self {
            gateway,
            hold,
            point_value_per_lot,
        }
    }

    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }
}

#[async_trait]
impl StrategyModule for PaperStrategy {
    fn name(&self) -> &'static str {
        "paper"
    }

    async fn execute(&self, params: &StrategyParams) -> Result<f64> {
        let symbol = params.symbol();
        let point = self.gateway.get_point_size(symbol).await?;
        let anchor = self.gateway.config().start_price;

        let entry = self.gateway.get_tick(symbol).await?;
        self.gateway.open_position()?;

        let hold = params
            .time_limit()
            .map_or(self.hold, |limit| limit.min(self.hold));
        tokio::time::sleep(hold).await;

        let exit = self.gateway.get_tick(symbol).await?;
        self.gateway.close_position()?;

        let move_points = (exit.mid() - entry.mid()) / point;
        // Lean against the displacement from the anchor
        let grid_side = if entry.mid() > anchor {
            Side::Sell
        } else {
            Side::Buy
        };

        let pnl = bracket_pnl(params, move_points, grid_side, self.point_value_per_lot);
        let balance = self.gateway.settle(pnl)?;

        debug!(move_points, "Paper bracket closed");
        info!(
            regime = %params.regime(),
            pnl,
            balance,
            "Paper {} trade settled",
            params.regime()
        );

        Ok(pnl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaperConfig;
    use crate::gateway::AccountPort;
    use crate::strategies::{
        BreakoutParams, GridParams, HedgeParams, NewsStraddleParams, ScalpingParams,
    };
    use crate::Symbol;
    use approx::assert_relative_eq;

    fn symbol() -> Symbol {
        Symbol::new("EURUSD")
    }

    #[test]
    fn test_risk_volume() {
        assert_relative_eq!(risk_volume(20.0, 15.0, 1.0), 1.33, epsilon = 1e-9);
        assert_relative_eq!(risk_volume(14.0, 25.0, 1.0), 0.56, epsilon = 1e-9);
        assert_relative_eq!(risk_volume(0.01, 15.0, 1.0), 0.01, epsilon = 1e-9);
    }

    #[test]
    fn test_scalping_bracket_clamped_to_take_profit() {
        let params = StrategyParams::Scalping(ScalpingParams::new(symbol(), 20.0, Side::Buy));
        // 1.33 lots * 25 points
        assert_relative_eq!(bracket_pnl(&params, 60.0, Side::Buy, 1.0), 33.25, epsilon = 1e-9);
        // Sell side takes the stop loss on the same move
        let params = StrategyParams::Scalping(ScalpingParams::new(symbol(), 20.0, Side::Sell));
        assert_relative_eq!(bracket_pnl(&params, 60.0, Side::Buy, 1.0), -19.95, epsilon = 1e-9);
    }

    #[test]
    fn test_grid_leans_with_given_side() {
        let params = StrategyParams::Grid(GridParams::new(symbol()));
        // 0.03 lots * 10 points
        assert_relative_eq!(bracket_pnl(&params, 10.0, Side::Buy, 1.0), 0.3, epsilon = 1e-9);
        assert_relative_eq!(bracket_pnl(&params, 10.0, Side::Sell, 1.0), -0.3, epsilon = 1e-9);
    }

    #[test]
    fn test_hedge_caps_adverse_move_at_trigger() {
        let params = StrategyParams::Hedge(HedgeParams::new(symbol(), 20.0, true));
        // 0.56 lots * -15 points instead of -25
        assert_relative_eq!(bracket_pnl(&params, -30.0, Side::Buy, 1.0), -8.4, epsilon = 1e-9);
        assert_relative_eq!(bracket_pnl(&params, 10.0, Side::Buy, 1.0), 5.6, epsilon = 1e-9);
    }

    #[test]
    fn test_pending_orders_need_the_distance() {
        let news = StrategyParams::NewsStraddle(NewsStraddleParams::new(symbol()));
        assert_eq!(bracket_pnl(&news, 14.0, Side::Buy, 1.0), 0.0);
        // Fills 15 points away and rides 10 more, in either direction
        assert_relative_eq!(bracket_pnl(&news, -25.0, Side::Buy, 1.0), 0.2, epsilon = 1e-9);

        let breakout = StrategyParams::Breakout(BreakoutParams::new(symbol()));
        assert_eq!(bracket_pnl(&breakout, 19.0, Side::Buy, 1.0), 0.0);
        // 80 - 20 = 60, capped at the 40 point take profit
        assert_relative_eq!(bracket_pnl(&breakout, 80.0, Side::Buy, 1.0), 0.4, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_execute_settles_on_gateway() {
        let gateway = Arc::new(PaperGateway::new(symbol(), PaperConfig::default()).unwrap());
        let strategy = PaperStrategy::new(gateway.clone()).with_hold(Duration::ZERO);

        let params = StrategyParams::Scalping(ScalpingParams::new(symbol(), 20.0, Side::Buy));
        let pnl = strategy.execute(&params).await.unwrap();

        let balance = gateway.get_balance().await.unwrap();
        assert_relative_eq!(balance, 10_000.0 + pnl, epsilon = 1e-9);
        assert_eq!(gateway.open_positions().unwrap(), 0);
    }
}
