//! Error taxonomy for the candle store

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Candle storage unavailable at {path}: {source}")]
    StoreUnavailable {
        path: String,
        #[source]
        source: DbErr,
    },

    #[error("Failed to fetch candles for {instrument} in [{from}, {to}): {source}")]
    RemoteFetchFailed {
        instrument: String,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to commit candles for {instrument}: {source}")]
    CommitFailed {
        instrument: String,
        #[source]
        source: DbErr,
    },

    /// Candles are durable but the checkpoint still shows the previous coverage.
    #[error("Candles for {instrument} committed but checkpoint (last synced {last_synced}) was not saved: {source}")]
    CheckpointInconsistent {
        instrument: String,
        last_synced: DateTime<Utc>,
        #[source]
        source: DbErr,
    },

    #[error("{instrument} not found in candle storage, load its history first")]
    InstrumentUnknown { instrument: String },

    #[error("{instrument} candles not found in storage from {from}, run a backfill or update first")]
    RangeNotCovered {
        instrument: String,
        from: DateTime<Utc>,
    },

    #[error("Failed to read candles for {instrument}: {source}")]
    Query {
        instrument: String,
        #[source]
        source: DbErr,
    },

    #[error("Stored price {value} for {instrument} cannot be quantized")]
    InvalidPrice { instrument: String, value: f64 },

    #[error("Price step {value} for {instrument} is not a valid quotation")]
    InvalidPriceStep { instrument: String, value: Decimal },

    #[error("Stored time {value} for {instrument} is out of range")]
    InvalidTimestamp { instrument: String, value: i64 },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl StorageError {
    /// Warning-class errors leave the store consistent enough to continue;
    /// the next reconciliation re-fetches the span and deduplicates it.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::CheckpointInconsistent { .. })
    }

    /// Whether the candles of the failed operation reached durable storage.
    pub fn candles_committed(&self) -> bool {
        self.is_warning()
    }
}
