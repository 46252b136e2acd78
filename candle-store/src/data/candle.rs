//! OHLCV candle data structures

use crate::data::Quotation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One price bar as served by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Opening price
    pub open: Quotation,
    /// High price
    pub high: Quotation,
    /// Low price
    pub low: Quotation,
    /// Closing price
    pub close: Quotation,
    /// Volume in lots
    pub volume: i64,
    /// Bar start time
    pub time: DateTime<Utc>,
    /// False while the bar is still forming
    pub is_complete: bool,
}

impl Candle {
    /// Create a new candle
    pub fn new(
        open: Quotation,
        high: Quotation,
        low: Quotation,
        close: Quotation,
        volume: i64,
        time: DateTime<Utc>,
        is_complete: bool,
    ) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
            time,
            is_complete,
        }
    }

    /// Bar time as persisted (Unix seconds)
    pub fn unix_time(&self) -> i64 {
        self.time.timestamp()
    }
}
