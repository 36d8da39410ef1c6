//! In-memory gateway
//!
//! Every `get_tick` advances the quote path one step:
//!
//! ```text
//! mid    = start + amplitude * point * sin(2π * step / price_cycle)
//! spread = triangle wave between min and max over spread_cycle steps
//! bid    = mid - spread * point / 2
//! ask    = mid + spread * point / 2
//! ```

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::f64::consts::PI;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::config::PaperConfig;
use crate::gateway::{AccountPort, EmergencyClosePort, MarketDataPort};
use crate::{Symbol, Tick, TraderResult};

#[derive(Debug, Default)]
struct PaperState {
    step: u64,
    balance: f64,
    open_positions: usize,
}

#[derive(Debug)]
pub struct PaperGateway {
    symbol: Symbol,
    config: PaperConfig,
    state: Mutex<PaperState>,
}

impl PaperGateway {
    pub fn new(symbol: Symbol, config: PaperConfig) -> TraderResult<Self> {
        config.validate()?;
        let state = PaperState {
            balance: config.initial_balance,
            ..PaperState::default()
        };
        Ok(Self {
            symbol,
            config,
            state: Mutex::new(state),
        })
    }

    pub fn config(&self) -> &PaperConfig {
        &self.config
    }

    fn state(&self) -> Result<MutexGuard<'_, PaperState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("paper gateway state poisoned"))
    }

    fn check_symbol(&self, symbol: &Symbol) -> Result<()> {
        if *symbol != self.symbol {
            bail!("Unknown symbol {} (paper gateway trades {})", symbol, self.symbol);
        }
        Ok(())
    }

    /// Quote at `step` of the path
    pub fn quote_at(&self, step: u64) -> (f64, f64) {
        let c = &self.config;

        let angle = 2.0 * PI * (step % c.price_cycle_ticks) as f64 / c.price_cycle_ticks as f64;
        let mid = c.start_price + c.price_amplitude_points * c.point_size * angle.sin();

        let spread = spread_at(step, c.min_spread_points, c.max_spread_points, c.spread_cycle_ticks);
        let half = spread * c.point_size / 2.0;

        (mid - half, mid + half)
    }

    /// Apply a strategy result to the balance
    pub fn settle(&self, pnl: f64) -> Result<f64> {
        let mut state = self.state()?;
        state.balance += pnl;
        Ok(state.balance)
    }

    pub fn open_position(&self) -> Result<()> {
        self.state()?.open_positions += 1;
        Ok(())
    }

    pub fn close_position(&self) -> Result<()> {
        let mut state = self.state()?;
        state.open_positions = state.open_positions.saturating_sub(1);
        Ok(())
    }

    pub fn open_positions(&self) -> Result<usize> {
        Ok(self.state()?.open_positions)
    }
}

/// Triangle wave: `min` at step 0, `max` half a cycle later
fn spread_at(step: u64, min: f64, max: f64, cycle: u64) -> f64 {
    if cycle < 2 {
        return min;
    }
    let phase = (step % cycle) as f64;
    let half = cycle as f64 / 2.0;
    let frac = if phase <= half {
        phase / half
    } else {
        (cycle as f64 - phase) / half
    };
    min + (max - min) * frac
}

#[async_trait]
impl MarketDataPort for PaperGateway {
    async fn get_tick(&self, symbol: &Symbol) -> Result<Tick> {
        self.check_symbol(symbol)?;

        let step = {
            let mut state = self.state()?;
            let step = state.step;
            state.step += 1;
            step
        };

        let (bid, ask) = self.quote_at(step);
        debug!(step, bid, ask, "Paper quote");

        Ok(Tick {
            bid,
            ask,
            time: Utc::now(),
        })
    }

    async fn get_point_size(&self, symbol: &Symbol) -> Result<f64> {
        self.check_symbol(symbol)?;
        Ok(self.config.point_size)
    }
}

#[async_trait]
impl AccountPort for PaperGateway {
    async fn get_balance(&self) -> Result<f64> {
        Ok(self.state()?.balance)
    }
}

#[async_trait]
impl EmergencyClosePort for PaperGateway {
    async fn close_all(&self, symbol: &Symbol) -> Result<usize> {
        self.check_symbol(symbol)?;
        let mut state = self.state()?;
        Ok(std::mem::take(&mut state.open_positions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TraderError;
    use approx::assert_relative_eq;

    fn gateway() -> PaperGateway {
        PaperGateway::new(Symbol::new("EURUSD"), PaperConfig::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_zero_cycle_lengths() {
        let config = PaperConfig {
            price_cycle_ticks: 0,
            ..PaperConfig::default()
        };
        let result = PaperGateway::new(Symbol::new("EURUSD"), config);
        assert!(matches!(result, Err(TraderError::InvalidConfig(_))));

        let config = PaperConfig {
            spread_cycle_ticks: 0,
            ..PaperConfig::default()
        };
        assert!(PaperGateway::new(Symbol::new("EURUSD"), config).is_err());
    }

    #[test]
    fn test_spread_triangle_wave() {
        assert_relative_eq!(spread_at(0, 0.5, 6.0, 24), 0.5);
        assert_relative_eq!(spread_at(12, 0.5, 6.0, 24), 6.0);
        assert_relative_eq!(spread_at(6, 0.5, 6.0, 24), 3.25);
        assert_relative_eq!(spread_at(18, 0.5, 6.0, 24), 3.25);
        assert_relative_eq!(spread_at(24, 0.5, 6.0, 24), 0.5);
    }

    #[test]
    fn test_quote_is_never_crossed() {
        let gw = gateway();
        for step in 0..200 {
            let (bid, ask) = gw.quote_at(step);
            assert!(ask >= bid, "crossed at step {}", step);
        }
    }

    #[tokio::test]
    async fn test_ticks_advance_and_balance_settles() {
        let gw = gateway();
        let symbol = Symbol::new("EURUSD");

        let first = gw.get_tick(&symbol).await.unwrap();
        let second = gw.get_tick(&symbol).await.unwrap();
        assert_ne!(first.mid(), second.mid());
        assert_eq!(gw.get_point_size(&symbol).await.unwrap(), 0.00001);

        gw.settle(-12.5).unwrap();
        assert_relative_eq!(gw.get_balance().await.unwrap(), 9_987.5);
    }

    #[tokio::test]
    async fn test_unknown_symbol_rejected() {
        let gw = gateway();
        assert!(gw.get_tick(&Symbol::new("GBPUSD")).await.is_err());
        assert!(gw.close_all(&Symbol::new("GBPUSD")).await.is_err());
    }

    #[tokio::test]
    async fn test_close_all_flattens_open_positions() {
        let gw = gateway();
        let symbol = Symbol::new("EURUSD");
        gw.open_position().unwrap();
        gw.open_position().unwrap();

        assert_eq!(gw.close_all(&symbol).await.unwrap(), 2);
        assert_eq!(gw.close_all(&symbol).await.unwrap(), 0);
    }
}
