//! Scalping parameters - medium volatility markets

use serde::{Deserialize, Serialize};

use crate::{Side, Symbol};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalpingParams {
    pub symbol: Symbol,

    /// Account currency put at risk; the module sizes volume from it
    pub risk_amount: f64,

    /// Stop loss in points (default: 15)
    pub stop_loss_points: f64,

    /// Take profit in points (default: 25)
    pub take_profit_points: f64,

    pub side: Side,
}

impl ScalpingParams {
    pub fn new(symbol: Symbol, risk_amount: f64, side: Side) -> Self {
        Self {
            symbol,
            risk_amount,
            stop_loss_points: 15.0,
            take_profit_points: 25.0,
            side,
        }
    }
}
