//! Hedge parameters - high volatility markets
//!
//! Opens one leg, and an opposite leg once price runs the trigger distance
//! against it.

use serde::{Deserialize, Serialize};

use crate::{Side, Symbol};

/// Fraction of the base risk committed while hedging
pub const HEDGE_RISK_FACTOR: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeParams {
    pub symbol: Symbol,

    /// Base risk scaled by [`HEDGE_RISK_FACTOR`]
    pub risk_amount: f64,

    /// Stop loss in points (default: 25)
    pub stop_loss_points: f64,

    /// Take profit in points (default: 40)
    pub take_profit_points: f64,

    /// Adverse move in points that opens the hedge leg (default: 15)
    pub hedge_trigger_points: f64,

    pub open_buy_first: bool,
}

impl HedgeParams {
    pub fn new(symbol: Symbol, base_risk_amount: f64, open_buy_first: bool) -> Self {
        Self {
            symbol,
            risk_amount: base_risk_amount * HEDGE_RISK_FACTOR,
            stop_loss_points: 25.0,
            take_profit_points: 40.0,
            hedge_trigger_points: 15.0,
            open_buy_first,
        }
    }

    pub fn first_side(&self) -> Side {
        if self.open_buy_first {
            Side::Buy
        } else {
            Side::Sell
        }
    }
}
