//! News straddle parameters
//!
//! Pending orders either side of the price shortly before a release, one of
//! which is expected to fill on the move.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Symbol;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsStraddleParams {
    pub symbol: Symbol,

    /// Distance of each pending order from the price in points (default: 15)
    pub straddle_distance_points: f64,

    /// Volume per pending order in lots (default: 0.02)
    pub volume: f64,

    /// Stop loss in points (default: 20)
    pub stop_loss_points: f64,

    /// Take profit in points (default: 40)
    pub take_profit_points: f64,

    /// Seconds before the release at which orders are placed (default: 30)
    pub countdown_secs: u64,

    /// Seconds to wait for a fill after the release (default: 120)
    pub max_wait_after_news_secs: u64,
}

impl NewsStraddleParams {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            straddle_distance_points: 15.0,
            volume: 0.02,
            stop_loss_points: 20.0,
            take_profit_points: 40.0,
            countdown_secs: 30,
            max_wait_after_news_secs: 120,
        }
    }

    /// Longest the module may run
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.countdown_secs + self.max_wait_after_news_secs)
    }
}
