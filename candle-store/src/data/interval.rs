//! Candle intervals and provider request limits

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bar duration supported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "2m")]
    TwoMinutes,
    #[serde(rename = "3m")]
    ThreeMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "10m")]
    TenMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "2h")]
    TwoHours,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    Day,
    #[serde(rename = "1w")]
    Week,
    #[serde(rename = "1mo")]
    Month,
}

impl CandleInterval {
    pub const ALL: [CandleInterval; 13] = [
        Self::OneMinute,
        Self::TwoMinutes,
        Self::ThreeMinutes,
        Self::FiveMinutes,
        Self::TenMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::Hour,
        Self::TwoHours,
        Self::FourHours,
        Self::Day,
        Self::Week,
        Self::Month,
    ];

    /// Short code used in config files ("1m", "1h", "1d", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::TwoMinutes => "2m",
            Self::ThreeMinutes => "3m",
            Self::FiveMinutes => "5m",
            Self::TenMinutes => "10m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::Hour => "1h",
            Self::TwoHours => "2h",
            Self::FourHours => "4h",
            Self::Day => "1d",
            Self::Week => "1w",
            Self::Month => "1mo",
        }
    }

    /// Enum name expected by the provider API
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::OneMinute => "CANDLE_INTERVAL_1_MIN",
            Self::TwoMinutes => "CANDLE_INTERVAL_2_MIN",
            Self::ThreeMinutes => "CANDLE_INTERVAL_3_MIN",
            Self::FiveMinutes => "CANDLE_INTERVAL_5_MIN",
            Self::TenMinutes => "CANDLE_INTERVAL_10_MIN",
            Self::FifteenMinutes => "CANDLE_INTERVAL_15_MIN",
            Self::ThirtyMinutes => "CANDLE_INTERVAL_30_MIN",
            Self::Hour => "CANDLE_INTERVAL_HOUR",
            Self::TwoHours => "CANDLE_INTERVAL_2_HOUR",
            Self::FourHours => "CANDLE_INTERVAL_4_HOUR",
            Self::Day => "CANDLE_INTERVAL_DAY",
            Self::Week => "CANDLE_INTERVAL_WEEK",
            Self::Month => "CANDLE_INTERVAL_MONTH",
        }
    }

    /// Longest `[from, to)` span the provider serves in a single request
    pub fn max_request_span(&self) -> Duration {
        match self {
            Self::OneMinute
            | Self::TwoMinutes
            | Self::ThreeMinutes
            | Self::FiveMinutes
            | Self::TenMinutes
            | Self::FifteenMinutes => Duration::days(1),
            Self::ThirtyMinutes => Duration::days(2),
            Self::Hour => Duration::weeks(1),
            Self::TwoHours | Self::FourHours => Duration::days(30),
            Self::Day => Duration::days(365),
            Self::Week => Duration::days(365 * 2),
            Self::Month => Duration::days(365 * 10),
        }
    }

    /// Split `[from, to)` into consecutive windows no longer than [`Self::max_request_span`].
    /// An empty or inverted range yields no windows.
    pub fn request_windows(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let span = self.max_request_span();
        let mut windows = Vec::new();
        let mut start = from;
        while start < to {
            let end = (start + span).min(to);
            windows.push((start, end));
            start = end;
        }
        windows
    }
}

impl FromStr for CandleInterval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|interval| interval.as_str() == code)
            .ok_or_else(|| anyhow::anyhow!("Unsupported interval: {}", s))
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
