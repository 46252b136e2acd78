use crate::data::{Candle, Quotation, SyncCheckpoint};
use crate::error::StorageError;
use crate::Result;
use chrono::{DateTime, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select, TransactionTrait,
};
use shared::entity::{candles, sync_checkpoints};
use shared::{get_db_connection, sqlite_url};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of one transactional candle commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitSummary {
    /// New rows written
    pub inserted: usize,
    /// Bars already present for the same instrument and time
    pub skipped: usize,
}

/// Durable store for candles and sync checkpoints
pub struct CandleRepository {
    db: Arc<DatabaseConnection>,
}

impl CandleRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Open or create the SQLite file at `path`, check the connection is alive
    /// and bring both tables up to date.
    pub async fn initialize(path: &str) -> Result<Self> {
        let unavailable = |source: DbErr| StorageError::StoreUnavailable {
            path: path.to_string(),
            source,
        };

        let db = get_db_connection(&sqlite_url(path))
            .await
            .map_err(unavailable)?;
        db.ping().await.map_err(unavailable)?;
        Migrator::up(&db, None).await.map_err(unavailable)?;

        info!("database initialized");
        Ok(Self::new(Arc::new(db)))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Insert a batch in one transaction, ignoring bars that are already stored,
    /// then record `checkpoint` as the instrument's coverage.
    ///
    /// Any non-conflict insert error rolls back the whole batch. The checkpoint is
    /// written only after the candles are committed.
    pub async fn commit_candles(
        &self,
        checkpoint: &SyncCheckpoint,
        batch: &[Candle],
    ) -> Result<CommitSummary> {
        let instrument = checkpoint.instrument_id.as_str();
        let commit_failed = |source: DbErr| StorageError::CommitFailed {
            instrument: instrument.to_string(),
            source,
        };

        let txn = self.db.begin().await.map_err(commit_failed)?;
        let mut summary = CommitSummary::default();

        for candle in batch {
            let inserted = candles::Entity::insert(Self::active_model(instrument, candle))
                .on_conflict(
                    OnConflict::columns([candles::Column::InstrumentId, candles::Column::Time])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await;

            match inserted {
                Ok(0) => summary.skipped += 1,
                Ok(_) => summary.inserted += 1,
                Err(source) => {
                    if let Err(rollback) = txn.rollback().await {
                        error!("Rollback failed for {}: {}", instrument, rollback);
                    }
                    return Err(commit_failed(source));
                }
            }
        }

        txn.commit().await.map_err(commit_failed)?;
        info!(
            "{} {} candles uploaded in storage ({} already present)",
            instrument, summary.inserted, summary.skipped
        );

        self.save_checkpoint(checkpoint).await?;
        Ok(summary)
    }

    /// Upsert the checkpoint row of one instrument
    async fn save_checkpoint(&self, checkpoint: &SyncCheckpoint) -> Result<()> {
        let model = sync_checkpoints::ActiveModel {
            instrument_id: ActiveValue::Set(checkpoint.instrument_id.clone()),
            first_time: ActiveValue::Set(checkpoint.first_synced.timestamp()),
            last_time: ActiveValue::Set(checkpoint.last_synced.timestamp()),
        };

        sync_checkpoints::Entity::insert(model)
            .on_conflict(
                OnConflict::column(sync_checkpoints::Column::InstrumentId)
                    .update_columns([
                        sync_checkpoints::Column::FirstTime,
                        sync_checkpoints::Column::LastTime,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|source| {
                warn!(
                    "Checkpoint for {} not saved, coverage will be re-fetched: {}",
                    checkpoint.instrument_id, source
                );
                StorageError::CheckpointInconsistent {
                    instrument: checkpoint.instrument_id.clone(),
                    last_synced: checkpoint.last_synced,
                    source,
                }
            })?;
        Ok(())
    }

    /// Every committed checkpoint keyed by instrument uid
    pub async fn read_checkpoints(&self) -> Result<HashMap<String, SyncCheckpoint>> {
        info!("reading sync checkpoints from storage...");
        let rows = sync_checkpoints::Entity::find()
            .all(self.db.as_ref())
            .await?;

        let mut checkpoints = HashMap::with_capacity(rows.len());
        for row in rows {
            let first_synced = timestamp(&row.instrument_id, row.first_time)?;
            let last_synced = timestamp(&row.instrument_id, row.last_time)?;
            checkpoints.insert(
                row.instrument_id.clone(),
                SyncCheckpoint {
                    instrument_id: row.instrument_id,
                    first_synced,
                    last_synced,
                },
            );
        }
        Ok(checkpoints)
    }

    /// All stored candles of an instrument, oldest first
    pub async fn read_all_candles(&self, instrument: &str, price_step: Quotation) -> Result<Vec<Candle>> {
        let query = candles::Entity::find().filter(candles::Column::InstrumentId.eq(instrument));
        self.load(instrument, price_step, query).await
    }

    /// Stored candles with `from <= time <= to`, oldest first
    pub async fn read_candles_in_range(
        &self,
        instrument: &str,
        price_step: Quotation,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candle>> {
        let query = candles::Entity::find()
            .filter(candles::Column::InstrumentId.eq(instrument))
            .filter(candles::Column::Time.between(from.timestamp(), to.timestamp()));
        self.load(instrument, price_step, query).await
    }

    /// Number of stored candles for an instrument
    pub async fn count_candles(&self, instrument: &str) -> Result<u64> {
        let count = candles::Entity::find()
            .filter(candles::Column::InstrumentId.eq(instrument))
            .count(self.db.as_ref())
            .await
            .map_err(|source| StorageError::Query {
                instrument: instrument.to_string(),
                source,
            })?;
        Ok(count)
    }

    /// Release the connection pool
    pub async fn close(self) -> Result<()> {
        match Arc::try_unwrap(self.db) {
            Ok(db) => db.close().await?,
            Err(_) => warn!("Database connection still shared, pool stays open until last handle drops"),
        }
        Ok(())
    }

    async fn load(
        &self,
        instrument: &str,
        price_step: Quotation,
        query: Select<candles::Entity>,
    ) -> Result<Vec<Candle>> {
        let rows = query
            .order_by_asc(candles::Column::Time)
            .all(self.db.as_ref())
            .await
            .map_err(|source| StorageError::Query {
                instrument: instrument.to_string(),
                source,
            })?;

        let candles = rows
            .into_iter()
            .map(|row| Self::to_candle(instrument, price_step, row))
            .collect::<Result<Vec<_>>>()?;
        info!("{} {} candles downloaded from storage", instrument, candles.len());
        Ok(candles)
    }

    fn active_model(instrument: &str, candle: &Candle) -> candles::ActiveModel {
        candles::ActiveModel {
            instrument_id: ActiveValue::Set(instrument.to_string()),
            open: ActiveValue::Set(candle.open.to_f64()),
            close: ActiveValue::Set(candle.close.to_f64()),
            high: ActiveValue::Set(candle.high.to_f64()),
            low: ActiveValue::Set(candle.low.to_f64()),
            volume: ActiveValue::Set(candle.volume),
            time: ActiveValue::Set(candle.unix_time()),
            is_complete: ActiveValue::Set(candle.is_complete),
            ..Default::default()
        }
    }

    fn to_candle(instrument: &str, price_step: Quotation, row: candles::Model) -> Result<Candle> {
        let price = |value: f64| {
            Quotation::from_f64(value, price_step).ok_or_else(|| StorageError::InvalidPrice {
                instrument: instrument.to_string(),
                value,
            })
        };

        Ok(Candle {
            open: price(row.open)?,
            high: price(row.high)?,
            low: price(row.low)?,
            close: price(row.close)?,
            volume: row.volume,
            time: timestamp(instrument, row.time)?,
            is_complete: row.is_complete,
        })
    }
}

fn timestamp(instrument: &str, secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| StorageError::InvalidTimestamp {
        instrument: instrument.to_string(),
        value: secs,
    })
}
