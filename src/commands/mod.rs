//! Command implementations for the CLI

pub mod classify;
pub mod params;
pub mod run;
