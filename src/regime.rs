//! Market regime classification
//!
//! Maps a single quote snapshot and the wall-clock time to one of five
//! mutually exclusive regimes. The signals are cheap proxies:
//!
//! - volatility is the current spread in points times ten, not a statistical
//!   estimator such as ATR;
//! - news is a fixed daily schedule of release times compared on hour and
//!   minute only (no date awareness, a run spanning midnight is not special).
//!
//! Priority chain, first match wins:
//!
//! ```text
//! news window  ->  News
//! spread > 3   ->  Breakout
//! vol < low    ->  Grid
//! vol < high   ->  Scalping
//! otherwise    ->  HighVolatilityHedge
//! ```

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{MarketSnapshot, Regime, RegimeDecision};

/// Spread (in points) above which the market is treated as breaking out
pub const BREAKOUT_SPREAD_POINTS: f64 = 3.0;

/// Fixed multiplier turning spread points into the volatility proxy
pub const VOLATILITY_MULTIPLIER: f64 = 10.0;

/// Minutes after a scheduled release during which the news regime holds
pub const MINUTES_AFTER_NEWS: i64 = 15;

/// Scheduled releases (UTC hour, minute)
pub const NEWS_SCHEDULE: [(u32, u32); 5] = [(8, 30), (12, 30), (14, 0), (18, 0), (19, 0)];

/// Classifier inputs taken from the run configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub low_vol_threshold: f64,
    pub high_vol_threshold: f64,
    pub news_enabled: bool,
    pub minutes_before_news: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            low_vol_threshold: 15.0,
            high_vol_threshold: 40.0,
            news_enabled: true,
            minutes_before_news: 5,
        }
    }
}

/// Classify the current market regime. Pure and non-blocking.
pub fn classify(
    snapshot: &MarketSnapshot,
    now: DateTime<Utc>,
    config: &ClassifierConfig,
) -> RegimeDecision {
    let spread_points = snapshot.spread_points();
    let volatility_points = spread_points * VOLATILITY_MULTIPLIER;

    let decision = |regime: Regime, rationale: String| RegimeDecision {
        regime,
        spread_points,
        volatility_points,
        rationale,
    };

    if config.news_enabled {
        if let Some(release) = active_news_release(now, config.minutes_before_news) {
            return decision(
                Regime::News,
                format!(
                    "news window: {} UTC release (from {} min before to {} min after)",
                    release.format("%H:%M"),
                    config.minutes_before_news,
                    MINUTES_AFTER_NEWS
                ),
            );
        }
    }

    if spread_points > BREAKOUT_SPREAD_POINTS {
        return decision(
            Regime::Breakout,
            format!(
                "breakout: spread {:.1} points exceeds {:.1}",
                spread_points, BREAKOUT_SPREAD_POINTS
            ),
        );
    }

    if volatility_points < config.low_vol_threshold {
        decision(
            Regime::Grid,
            format!(
                "low volatility: {:.1} points below {:.1}",
                volatility_points, config.low_vol_threshold
            ),
        )
    } else if volatility_points < config.high_vol_threshold {
        decision(
            Regime::Scalping,
            format!(
                "medium volatility: {:.1} points in [{:.1}, {:.1})",
                volatility_points, config.low_vol_threshold, config.high_vol_threshold
            ),
        )
    } else {
        decision(
            Regime::HighVolatilityHedge,
            format!(
                "high volatility: {:.1} points at or above {:.1}",
                volatility_points, config.high_vol_threshold
            ),
        )
    }
}

/// Scheduled release whose window contains `now`, if any.
///
/// The window is `[release - minutes_before, release + 15]` in minutes of
/// the day. The lead-in is configurable, the lag-out is not.
pub fn active_news_release(now: DateTime<Utc>, minutes_before: u32) -> Option<NaiveTime> {
    let now_minute = i64::from(now.hour()) * 60 + i64::from(now.minute());

    NEWS_SCHEDULE.iter().find_map(|&(hour, minute)| {
        let release = i64::from(hour) * 60 + i64::from(minute);
        let start = release - i64::from(minutes_before);
        let end = release + MINUTES_AFTER_NEWS;

        if (start..=end).contains(&now_minute) {
            NaiveTime::from_hms_opt(hour, minute, 0)
        } else {
            None
        }
    })
}
