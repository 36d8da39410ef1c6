//! Grid parameters - ranging, low volatility markets

use serde::{Deserialize, Serialize};

use crate::Symbol;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    pub symbol: Symbol,

    /// Orders on each side of the current price (default: 3)
    pub levels: u32,

    /// Distance between levels in points (default: 20)
    pub spacing_points: f64,

    /// Volume per level in lots (default: 0.01)
    pub volume_per_level: f64,

    /// Stop loss in points (default: 30)
    pub stop_loss_points: f64,

    /// Take profit in points (default: 50)
    pub take_profit_points: f64,
}

impl GridParams {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            levels: 3,
            spacing_points: 20.0,
            volume_per_level: 0.01,
            stop_loss_points: 30.0,
            take_profit_points: 50.0,
        }
    }

    pub fn total_volume(&self) -> f64 {
        f64::from(self.levels) * self.volume_per_level
    }
}
