//! Regime Trader
//!
//! A regime-driven strategy dispatcher: each cycle samples the spread,
//! classifies the market into one of five regimes, hands a fixed parameter
//! set to the matching strategy module and accumulates the realized P&L
//! until a cumulative-loss safety stop, cancellation, or a failure ends the
//! run.

pub mod clock;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod paper;
pub mod regime;
pub mod report;
pub mod risk;
pub mod shutdown;
pub mod strategies;
pub mod types;

pub use config::Config;
pub use controller::{CycleController, RunState, RunSummary};
pub use error::{TraderError, TraderResult};
pub use shutdown::ShutdownSignal;
pub use types::*;
