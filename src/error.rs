//! Typed failures raised by the dispatcher itself
//!
//! Port and strategy failures travel as `anyhow::Error`; these are the
//! cases the crate detects on its own.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraderError {
    #[error("invalid point size {0}: must be a positive finite number")]
    InvalidPointSize(f64),

    #[error("invalid quote bid={bid} ask={ask}")]
    InvalidQuote { bid: f64, ask: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type TraderResult<T> = Result<T, TraderError>;
