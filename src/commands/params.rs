//! Params command

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;

use regime_trader::dispatcher::parameters_for;
use regime_trader::{Config, Regime};

pub fn run(config_path: Option<String>) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    config.validate().context("Invalid configuration")?;

    let dispatch = config.dispatch();
    let now = Utc::now();

    let sets: serde_json::Map<String, serde_json::Value> = Regime::ALL
        .iter()
        .map(|regime| {
            let params = parameters_for(*regime, &dispatch, now);
            serde_json::to_value(&params).map(|value| (regime.as_str().to_string(), value))
        })
        .collect::<Result<_, _>>()
        .context("Failed to serialize parameter sets")?;

    let output = json!({
        "symbol": dispatch.symbol,
        "base_risk_amount": dispatch.base_risk_amount,
        "parameters": sets,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
