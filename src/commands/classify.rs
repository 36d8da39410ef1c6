//! Classify command

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveTime, Utc};
use serde_json::json;
use tracing::debug;

use regime_trader::dispatcher::parameters_for;
use regime_trader::regime::classify;
use regime_trader::{Config, MarketSnapshot};

pub fn run(
    config_path: Option<String>,
    bid: f64,
    ask: f64,
    point: f64,
    time: Option<String>,
) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    config.validate().context("Invalid configuration")?;

    let now = match time {
        Some(time) => at_time_of_day(&time)?,
        None => Utc::now(),
    };
    debug!("Classifying at {}", now);

    let snapshot = MarketSnapshot::new(bid, ask, point, now)?;
    let decision = classify(&snapshot, now, &config.classifier());
    let params = parameters_for(decision.regime, &config.dispatch(), now);

    let output = json!({
        "time": now.to_rfc3339(),
        "decision": decision,
        "parameters": params,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Today's date at `HH:MM` UTC
fn at_time_of_day(time: &str) -> Result<DateTime<Utc>> {
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .with_context(|| format!("Invalid time '{}', expected HH:MM", time))?;
    Ok(Utc::now().date_naive().and_time(time).and_utc())
}
