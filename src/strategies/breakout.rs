//! Pending breakout parameters - spread blowouts

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Symbol;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakoutParams {
    pub symbol: Symbol,

    /// Volume in lots (default: 0.01)
    pub volume: f64,

    /// Distance of the stop entries from the price in points (default: 20)
    pub breakout_distance_points: f64,

    /// Stop loss in points (default: 20)
    pub stop_loss_points: f64,

    /// Take profit in points (default: 40)
    pub take_profit_points: f64,

    /// Seconds to wait for a fill before cancelling (default: 180)
    pub max_wait_secs: u64,
}

impl BreakoutParams {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            volume: 0.01,
            breakout_distance_points: 20.0,
            stop_loss_points: 20.0,
            take_profit_points: 40.0,
            max_wait_secs: 180,
        }
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}
