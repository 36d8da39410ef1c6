//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files with environment
//! variable overrides. Every field has a default so a partial file (or no
//! file at all) yields a runnable paper setup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::dispatcher::DispatchConfig;
use crate::error::{TraderError, TraderResult};
use crate::regime::ClassifierConfig;
use crate::Symbol;

/// Environment variable that overrides `trading.symbol`
pub const SYMBOL_ENV_VAR: &str = "REGIME_TRADER_SYMBOL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub paper: PaperConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let mut config = Self::from_json(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from `path`, or start from defaults when no file is given
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                Self::from_file(path).with_context(|| format!("Failed to load config from {}", path))
            }
            None => {
                let mut config = Self::default();
                config.apply_env_overrides();
                Ok(config)
            }
        }
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(symbol) = std::env::var(SYMBOL_ENV_VAR) {
            if !symbol.trim().is_empty() {
                self.trading.symbol = symbol;
            }
        }
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Failed to parse config JSON")
    }

    /// Reject settings the run loop cannot operate with
    pub fn validate(&self) -> TraderResult<()> {
        let t = &self.trading;

        if t.symbol.trim().is_empty() {
            return Err(TraderError::InvalidConfig("symbol must not be empty".into()));
        }
        if !t.base_risk_amount.is_finite() || t.base_risk_amount <= 0.0 {
            return Err(TraderError::InvalidConfig(format!(
                "base_risk_amount must be positive, got {}",
                t.base_risk_amount
            )));
        }
        if t.low_vol_threshold <= 0.0 || t.high_vol_threshold <= 0.0 {
            return Err(TraderError::InvalidConfig(
                "volatility thresholds must be positive".into(),
            ));
        }
        if t.low_vol_threshold >= t.high_vol_threshold {
            return Err(TraderError::InvalidConfig(format!(
                "low_vol_threshold ({}) must be below high_vol_threshold ({})",
                t.low_vol_threshold, t.high_vol_threshold
            )));
        }

        self.paper.validate()
    }

    pub fn classifier(&self) -> ClassifierConfig {
        ClassifierConfig {
            low_vol_threshold: self.trading.low_vol_threshold,
            high_vol_threshold: self.trading.high_vol_threshold,
            news_enabled: self.trading.news_enabled,
            minutes_before_news: self.trading.minutes_before_news,
        }
    }

    pub fn dispatch(&self) -> DispatchConfig {
        DispatchConfig {
            symbol: self.trading.symbol(),
            base_risk_amount: self.trading.base_risk_amount,
        }
    }
}

/// Trading configuration, immutable for the duration of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    pub symbol: String,
    /// Risk budget per trade in account currency. The safety stop trips at
    /// five times this amount of cumulative loss.
    pub base_risk_amount: f64,
    /// Volatility proxy (points) below which the market is treated as ranging
    pub low_vol_threshold: f64,
    /// Volatility proxy (points) at or above which hedging takes over
    pub high_vol_threshold: f64,
    pub news_enabled: bool,
    pub minutes_before_news: u32,
    /// Pause between cycles
    pub cycle_interval_secs: u64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        TradingConfig {
            symbol: "EURUSD".to_string(),
            base_risk_amount: 20.0,
            low_vol_threshold: 15.0,
            high_vol_threshold: 40.0,
            news_enabled: true,
            minutes_before_news: 5,
            cycle_interval_secs: 30,
        }
    }
}

impl TradingConfig {
    pub fn symbol(&self) -> Symbol {
        Symbol::new(self.symbol.clone())
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }
}

/// Paper gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    pub initial_balance: f64,
    pub start_price: f64,
    pub point_size: f64,
    /// Narrowest simulated spread in points
    pub min_spread_points: f64,
    /// Widest simulated spread in points
    pub max_spread_points: f64,
    /// Quotes needed for the spread to sweep from min to max and back
    pub spread_cycle_ticks: u64,
    /// Amplitude of the simulated mid price swing in points
    pub price_amplitude_points: f64,
    /// Quotes per full mid price oscillation
    pub price_cycle_ticks: u64,
    /// Account currency value of one point for one lot
    pub point_value_per_lot: f64,
    /// How long a paper strategy holds before settling
    pub hold_secs: u64,
}

impl Default for PaperConfig {
    fn default() -> Self {
        PaperConfig {
            initial_balance: 10_000.0,
            start_price: 1.10000,
            point_size: 0.00001,
            min_spread_points: 0.5,
            max_spread_points: 6.0,
            spread_cycle_ticks: 24,
            price_amplitude_points: 60.0,
            price_cycle_ticks: 17,
            point_value_per_lot: 1.0,
            hold_secs: 5,
        }
    }
}

impl PaperConfig {
    pub fn hold(&self) -> Duration {
        Duration::from_secs(self.hold_secs)
    }

    pub fn validate(&self) -> TraderResult<()> {
        if self.point_size <= 0.0 {
            return Err(TraderError::InvalidConfig(
                "paper.point_size must be positive".into(),
            ));
        }
        if self.min_spread_points < 0.0 || self.max_spread_points < self.min_spread_points {
            return Err(TraderError::InvalidConfig(format!(
                "paper spread range [{}, {}] is invalid",
                self.min_spread_points, self.max_spread_points
            )));
        }
        if self.spread_cycle_ticks == 0 || self.price_cycle_ticks == 0 {
            return Err(TraderError::InvalidConfig(
                "paper cycle tick counts must be non-zero".into(),
            ));
        }
        if self.point_value_per_lot <= 0.0 {
            return Err(TraderError::InvalidConfig(
                "paper.point_value_per_lot must be positive".into(),
            ));
        }
        Ok(())
    }
}
