//! Remote candle source capability

use crate::data::{Candle, CandleInterval};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Historic candles request for `[from, to)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandlesRequest {
    pub instrument_id: String,
    pub interval: CandleInterval,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Provider of historic candles
///
/// Implementations return bars inside `[from, to)` ordered by time. Any retry
/// policy lives in the implementation; callers treat each call as final.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn historic_candles(&self, request: &CandlesRequest) -> anyhow::Result<Vec<Candle>>;
}

#[async_trait]
impl<T: CandleSource + ?Sized> CandleSource for Arc<T> {
    async fn historic_candles(&self, request: &CandlesRequest) -> anyhow::Result<Vec<Candle>> {
        (**self).historic_candles(request).await
    }
}
