//! Core data types used across the dispatcher

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TraderError, TraderResult};

/// Trading symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Symbol(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Low-stakes direction signal: Buy on an even second, Sell on an odd one.
    pub fn from_second_parity(second: u32) -> Self {
        if second % 2 == 0 {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    /// +1.0 for Buy, -1.0 for Sell
    pub fn sign(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

/// Raw quote as returned by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub bid: f64,
    pub ask: f64,
    pub time: DateTime<Utc>,
}

impl Tick {
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }
}

/// Market conditions sampled once per cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub bid: f64,
    pub ask: f64,
    /// Minimum tradable price increment of the symbol
    pub point_size: f64,
    pub observed_at: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Build a snapshot, rejecting quotes the classifier cannot work with.
    pub fn new(
        bid: f64,
        ask: f64,
        point_size: f64,
        observed_at: DateTime<Utc>,
    ) -> TraderResult<Self> {
        if !point_size.is_finite() || point_size <= 0.0 {
            return Err(TraderError::InvalidPointSize(point_size));
        }
        if !bid.is_finite() || !ask.is_finite() || ask < bid {
            return Err(TraderError::InvalidQuote { bid, ask });
        }

        Ok(MarketSnapshot {
            bid,
            ask,
            point_size,
            observed_at,
        })
    }

    pub fn from_tick(tick: Tick, point_size: f64) -> TraderResult<Self> {
        Self::new(tick.bid, tick.ask, point_size, tick.time)
    }

    /// Current spread expressed in price increments.
    ///
    /// Quotes sit on the point grid, so the quotient is rounded to six
    /// decimals to strip binary floating point noise from the division.
    pub fn spread_points(&self) -> f64 {
        let raw = (self.ask - self.bid) / self.point_size;
        (raw * 1e6).round() / 1e6
    }
}

/// Market regime, one per cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Regime {
    Grid,
    Scalping,
    HighVolatilityHedge,
    News,
    Breakout,
}

impl Regime {
    pub const ALL: [Regime; 5] = [
        Regime::Grid,
        Regime::Scalping,
        Regime::HighVolatilityHedge,
        Regime::News,
        Regime::Breakout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Grid => "grid",
            Regime::Scalping => "scalping",
            Regime::HighVolatilityHedge => "high_volatility_hedge",
            Regime::News => "news",
            Regime::Breakout => "breakout",
        }
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeDecision {
    pub regime: Regime,
    pub spread_points: f64,
    /// Spread-derived volatility proxy, `spread_points * 10`
    pub volatility_points: f64,
    pub rationale: String,
}

/// Outcome of one completed cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleResult {
    pub cycle_number: u64,
    pub regime: Regime,
    pub realized_pnl: f64,
    pub balance_after: f64,
    pub cumulative_pnl: f64,
    pub completed_at: DateTime<Utc>,
}

/// Why a run ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// Cumulative loss crossed the safety limit
    SafetyStop,
    Cancelled,
    FatalError(String),
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::SafetyStop => write!(f, "safety stop"),
            TerminationReason::Cancelled => write!(f, "cancelled"),
            TerminationReason::FatalError(msg) => write!(f, "fatal error: {}", msg),
        }
    }
}
