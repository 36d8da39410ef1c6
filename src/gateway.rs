//! Trading gateway ports
//!
//! The dispatcher never talks to a broker directly. Connection handling,
//! authentication, and retry/timeout policy live behind these traits in the
//! host's gateway client.

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::{MarketSnapshot, Symbol, Tick};

/// Quotes and symbol metadata
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    async fn get_tick(&self, symbol: &Symbol) -> Result<Tick>;

    /// Minimum price increment of the symbol
    async fn get_point_size(&self, symbol: &Symbol) -> Result<f64>;
}

/// Account queries, used for reporting only
#[async_trait]
pub trait AccountPort: Send + Sync {
    async fn get_balance(&self) -> Result<f64>;
}

/// Flatten everything open on a symbol
#[async_trait]
pub trait EmergencyClosePort: Send + Sync {
    /// Returns the number of positions closed
    async fn close_all(&self, symbol: &Symbol) -> Result<usize>;
}

/// Everything the cycle controller needs from a gateway
pub trait TradingGateway: MarketDataPort + AccountPort + EmergencyClosePort {}

impl<T> TradingGateway for T where T: MarketDataPort + AccountPort + EmergencyClosePort {}

/// Sample a fresh snapshot for `symbol`
pub async fn fetch_snapshot<P>(port: &P, symbol: &Symbol) -> Result<MarketSnapshot>
where
    P: MarketDataPort + ?Sized,
{
    let tick = port
        .get_tick(symbol)
        .await
        .with_context(|| format!("Failed to fetch tick for {}", symbol))?;
    let point_size = port
        .get_point_size(symbol)
        .await
        .with_context(|| format!("Failed to fetch point size for {}", symbol))?;

    Ok(MarketSnapshot::from_tick(tick, point_size)?)
}
