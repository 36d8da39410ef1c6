//! Paper trading
//!
//! An in-memory gateway with a deterministic quote path and a strategy module
//! that settles simple brackets against it. Enough to drive the dispatcher
//! end to end without a broker.

pub mod gateway;
pub mod strategy;

pub use gateway::PaperGateway;
pub use strategy::{bracket_pnl, risk_volume, PaperStrategy};
