//! Shared fixtures for candle-store integration tests

#![allow(dead_code)]

use anyhow::bail;
use async_trait::async_trait;
use candle_store::prelude::*;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Mutex;
use tempfile::TempDir;

/// Start of the fixture history
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Hourly bar `i` of the fixture history
pub fn candle_at(i: i64) -> Candle {
    let price = Quotation::new(100 + i / 100, ((i % 100) * 10_000_000) as i32);
    Candle::new(price, price, price, price, 10 + i, t0() + Duration::hours(i), true)
}

/// Hourly candles `[0, count)` starting at [`t0`]
pub fn hourly_candles(count: i64) -> Vec<Candle> {
    (0..count).map(candle_at).collect()
}

pub fn instrument(uid: &str, from: DateTime<Utc>) -> InstrumentConfig {
    InstrumentConfig {
        uid: uid.to_string(),
        ticker: uid.to_uppercase(),
        interval: CandleInterval::Hour,
        price_step: Decimal::new(1, 2),
        from,
    }
}

pub fn checkpoint(uid: &str, first: DateTime<Utc>, last: DateTime<Utc>) -> SyncCheckpoint {
    SyncCheckpoint {
        instrument_id: uid.to_string(),
        first_synced: first,
        last_synced: last,
    }
}

/// Temporary SQLite file path, removed with the returned dir
pub fn temp_db() -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("candles.db").to_string_lossy().to_string();
    (dir, path)
}

/// In-memory provider serving a fixed history and recording every request
pub struct MockSource {
    candles: Mutex<Vec<Candle>>,
    failing: HashSet<String>,
    requests: Mutex<Vec<CandlesRequest>>,
}

impl MockSource {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles: Mutex::new(candles),
            failing: HashSet::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_for(mut self, uid: &str) -> Self {
        self.failing.insert(uid.to_string());
        self
    }

    /// Make a new bar available to later requests
    pub fn publish(&self, candle: Candle) {
        self.candles.lock().unwrap().push(candle);
    }

    pub fn requests(&self) -> Vec<CandlesRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, uid: &str) -> Vec<CandlesRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.instrument_id == uid)
            .collect()
    }
}

#[async_trait]
impl CandleSource for MockSource {
    async fn historic_candles(&self, request: &CandlesRequest) -> anyhow::Result<Vec<Candle>> {
        self.requests.lock().unwrap().push(request.clone());
        if self.failing.contains(&request.instrument_id) {
            bail!("provider unavailable for {}", request.instrument_id);
        }
        Ok(self
            .candles
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.time >= request.from && c.time < request.to)
            .cloned()
            .collect())
    }
}
