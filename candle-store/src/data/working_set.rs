//! In-memory working set and range queries

use crate::data::Candle;
use crate::error::StorageError;
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Ordered candles of one instrument plus the time window they cover
#[derive(Debug, Clone)]
pub struct CandleWindow {
    covered_from: DateTime<Utc>,
    covered_to: DateTime<Utc>,
    candles: Vec<Candle>,
}

impl CandleWindow {
    /// `candles` must be sorted by time without duplicates
    pub fn new(covered_from: DateTime<Utc>, covered_to: DateTime<Utc>, candles: Vec<Candle>) -> Self {
        Self {
            covered_from,
            covered_to,
            candles,
        }
    }

    pub fn covered_from(&self) -> DateTime<Utc> {
        self.covered_from
    }

    pub fn covered_to(&self) -> DateTime<Utc> {
        self.covered_to
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Append bars newer than the current last bar and extend coverage to `covered_to`.
    /// Bars at or before the last stored time are already persisted and are skipped.
    pub fn append(&mut self, candles: Vec<Candle>, covered_to: DateTime<Utc>) -> usize {
        let before = self.candles.len();
        for candle in candles {
            match self.candles.last() {
                Some(last) if candle.time <= last.time => continue,
                _ => self.candles.push(candle),
            }
        }
        self.covered_to = self.covered_to.max(covered_to);
        self.candles.len() - before
    }

    /// Candles with `from < time < to`.
    ///
    /// Returns `None` when `from` lies outside `[covered_from, covered_to)` or
    /// nothing is loaded; a covered window without bars is an empty slice.
    pub fn range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Option<&[Candle]> {
        if self.candles.is_empty() || from < self.covered_from || from >= self.covered_to {
            return None;
        }
        let lower = self.candles.partition_point(|c| c.time <= from);
        let upper = self.candles.partition_point(|c| c.time < to).max(lower);
        Some(&self.candles[lower..upper])
    }
}

/// Working set of all loaded instruments
#[derive(Debug, Default)]
pub struct WorkingSet {
    windows: HashMap<String, CandleWindow>,
}

impl WorkingSet {
    /// Create new working set
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
        }
    }

    /// Replace the window of an instrument
    pub fn insert(&mut self, instrument: &str, window: CandleWindow) {
        self.windows.insert(instrument.to_string(), window);
    }

    /// Append freshly committed bars to an instrument's window, creating it when missing
    pub fn append(
        &mut self,
        instrument: &str,
        candles: Vec<Candle>,
        covered_from: DateTime<Utc>,
        covered_to: DateTime<Utc>,
    ) -> usize {
        self.windows
            .entry(instrument.to_string())
            .or_insert_with(|| CandleWindow::new(covered_from, covered_to, Vec::new()))
            .append(candles, covered_to)
    }

    pub fn get(&self, instrument: &str) -> Option<&CandleWindow> {
        self.windows.get(instrument)
    }

    /// Candles of `instrument` strictly between `from` and `to`
    pub fn range(&self, instrument: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<&[Candle]> {
        let window = self
            .windows
            .get(instrument)
            .ok_or_else(|| StorageError::InstrumentUnknown {
                instrument: instrument.to_string(),
            })?;
        window.range(from, to).ok_or_else(|| StorageError::RangeNotCovered {
            instrument: instrument.to_string(),
            from,
        })
    }

    /// Get number of loaded candles
    pub fn len(&self) -> usize {
        self.windows.values().map(|w| w.len()).sum()
    }

    /// Check if no candles are loaded, even when empty windows exist
    pub fn is_empty(&self) -> bool {
        self.windows.values().all(|w| w.is_empty())
    }

    /// Get number of instruments with a loaded window
    pub fn instrument_count(&self) -> usize {
        self.windows.len()
    }
}
