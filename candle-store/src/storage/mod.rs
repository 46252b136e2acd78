//! Candle storage session
//!
//! [`CandleStorage`] owns the durable store, the remote source, the table of
//! known instruments and the working set. Writes happen only through
//! `&mut self` methods, so a refresh can never overlap a range query.

mod plan;

pub use plan::*;

use crate::data::{Candle, CandleWindow, Instrument, InstrumentConfig, SyncCheckpoint, WorkingSet};
use crate::error::StorageError;
use crate::exchange::{CandleSource, CandlesRequest};
use crate::repositories::{CandleRepository, CommitSummary};
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, error, info};

/// Parameters for [`CandleStorage::open`]
#[derive(Debug, Clone)]
pub struct OpenRequest {
    /// SQLite file path or `sqlite:` URL
    pub db_path: String,
    /// Instruments to reconcile, processed in order
    pub instruments: Vec<InstrumentConfig>,
    /// Also fetch everything from each instrument's last sync up to now
    pub update: bool,
    /// Working set window start
    pub from: DateTime<Utc>,
    /// Working set window end
    pub to: DateTime<Utc>,
}

pub struct CandleStorage<S> {
    repository: CandleRepository,
    source: S,
    instruments: HashMap<String, Instrument>,
    working_set: WorkingSet,
}

impl<S: CandleSource> CandleStorage<S> {
    /// Open the store, reconcile every requested instrument against its
    /// checkpoint, optionally refresh up to now, then load the working set.
    ///
    /// Stops at the first failing instrument; instruments handled before it
    /// stay committed.
    pub async fn open(request: OpenRequest, source: S) -> Result<Self> {
        let repository = CandleRepository::initialize(&request.db_path).await?;
        let mut storage = Self::with_repository(repository, source);

        let checkpoints = storage.repository.read_checkpoints().await?;
        info!("got {} unique instruments from storage", checkpoints.len());

        let now = Utc::now();
        for config in &request.instruments {
            // a uid listed twice plans against what the first entry committed
            let checkpoint = storage
                .instruments
                .get(&config.uid)
                .map(Instrument::checkpoint)
                .or_else(|| checkpoints.get(&config.uid).cloned());
            storage
                .sync_instrument(config, checkpoint.as_ref(), now)
                .await?;
        }

        if request.update {
            for config in &request.instruments {
                storage.update_history(&config.uid).await?;
            }
        }

        for config in &request.instruments {
            storage.reload(&config.uid, request.from, request.to).await?;
        }
        Ok(storage)
    }

    /// Session over an already initialized repository, with nothing loaded
    pub fn with_repository(repository: CandleRepository, source: S) -> Self {
        Self {
            repository,
            source,
            instruments: HashMap::new(),
            working_set: WorkingSet::new(),
        }
    }

    /// Fetch `[last_synced, now)` for a known instrument, commit it and append
    /// the new bars to its loaded window.
    pub async fn update_history(&mut self, uid: &str) -> Result<()> {
        info!("{} candles updating...", self.ticker(uid));
        let instrument = self.known(uid)?.clone();

        let now = Utc::now();
        let candles = self.fetch(&instrument, instrument.last_synced, now).await?;
        let updated = Instrument {
            last_synced: now.max(instrument.last_synced),
            ..instrument
        };
        let (first_synced, last_synced) = (updated.first_synced, updated.last_synced);

        let outcome = self.commit(updated, &candles).await;
        if candles_durable(&outcome) {
            let appended = self
                .working_set
                .append(uid, candles, first_synced, last_synced);
            debug!("{} {} candles appended to working set", self.ticker(uid), appended);
        }
        outcome.map(|_| ())
    }

    /// Bring one instrument into an open storage: reconcile it against its
    /// checkpoint and load everything from `config.from` up to now.
    pub async fn load_history(&mut self, config: &InstrumentConfig) -> Result<()> {
        let checkpoint = match self.instruments.get(&config.uid) {
            Some(known) => Some(known.checkpoint()),
            None => self.repository.read_checkpoints().await?.remove(&config.uid),
        };

        let now = Utc::now();
        self.sync_instrument(config, checkpoint.as_ref(), now).await?;
        self.reload(&config.uid, config.from, now).await
    }

    async fn sync_instrument(
        &mut self,
        config: &InstrumentConfig,
        checkpoint: Option<&SyncCheckpoint>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let action = plan_sync(config.from, checkpoint, now);
        let (first_synced, last_synced) = action.synced_range();
        let instrument = Instrument::from_config(config, first_synced, last_synced)?;

        let Some((from, to)) = action.fetch_range() else {
            debug!(
                "{} already synced from {} to {}",
                config.ticker, first_synced, last_synced
            );
            self.instruments.insert(config.uid.clone(), instrument);
            return Ok(());
        };

        match action {
            SyncAction::FillOlderGap { .. } => {
                info!("older candles for {} not found, downloading...", config.ticker)
            }
            _ => info!("candles for {} not found, downloading...", config.ticker),
        }
        let candles = self.fetch(&instrument, from, to).await?;
        self.commit(instrument, &candles).await?;
        Ok(())
    }

    async fn fetch(
        &self,
        instrument: &Instrument,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candle>> {
        let request = CandlesRequest {
            instrument_id: instrument.uid.clone(),
            interval: instrument.interval,
            from,
            to,
        };
        self.source
            .historic_candles(&request)
            .await
            .map_err(|source| {
                error!("Failed to fetch candles for {}: {:#}", instrument.ticker, source);
                StorageError::RemoteFetchFailed {
                    instrument: instrument.uid.clone(),
                    from,
                    to,
                    source,
                }
            })
    }

    /// Commit candles with `instrument`'s checkpoint; the descriptor is recorded
    /// once the candles are durable.
    async fn commit(&mut self, instrument: Instrument, candles: &[Candle]) -> Result<CommitSummary> {
        let outcome = self
            .repository
            .commit_candles(&instrument.checkpoint(), candles)
            .await;
        if candles_durable(&outcome) {
            self.instruments.insert(instrument.uid.clone(), instrument);
        }
        outcome
    }
}

impl<S> CandleStorage<S> {
    /// Rebuild an instrument's working set from the store for `[from, to]`
    pub async fn reload(&mut self, uid: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<()> {
        let (price_step, first_synced, last_synced) = {
            let instrument = self.known(uid)?;
            (instrument.price_step, instrument.first_synced, instrument.last_synced)
        };

        let candles = self
            .repository
            .read_candles_in_range(uid, price_step, from, to)
            .await?;
        let window = CandleWindow::new(from.max(first_synced), to.min(last_synced), candles);
        self.working_set.insert(uid, window);
        Ok(())
    }

    /// Loaded candles with `from < time < to`, without touching the store
    pub fn candles(&self, uid: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<&[Candle]> {
        self.working_set.range(uid, from, to)
    }

    /// Every stored candle of a known instrument, read from the store
    pub async fn candles_all(&self, uid: &str) -> Result<Vec<Candle>> {
        let instrument = self.known(uid)?;
        self.repository
            .read_all_candles(uid, instrument.price_step)
            .await
    }

    pub fn instrument(&self, uid: &str) -> Option<&Instrument> {
        self.instruments.get(uid)
    }

    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.values()
    }

    /// Display ticker of an instrument, for log lines
    pub fn ticker(&self, uid: &str) -> &str {
        self.instruments
            .get(uid)
            .map(|i| i.ticker.as_str())
            .unwrap_or("not found")
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    pub fn repository(&self) -> &CandleRepository {
        &self.repository
    }

    /// Release the store; the working set is dropped with the session
    pub async fn close(self) -> Result<()> {
        self.repository.close().await
    }

    fn known(&self, uid: &str) -> Result<&Instrument> {
        self.instruments
            .get(uid)
            .ok_or_else(|| StorageError::InstrumentUnknown {
                instrument: uid.to_string(),
            })
    }
}

fn candles_durable(outcome: &Result<CommitSummary>) -> bool {
    match outcome {
        Ok(_) => true,
        Err(err) => err.candles_committed(),
    }
}
