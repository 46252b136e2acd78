//! Per-instrument sync decision

use crate::data::SyncCheckpoint;
use chrono::{DateTime, Utc};

/// What the reconciler has to fetch for one instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Nothing stored yet: fetch `[from, to)` and cover exactly that range
    Backfill {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    /// History older than the checkpoint is wanted: fetch `[from, to)` where `to`
    /// is the checkpoint's first synced time; the forward boundary stays put
    FillOlderGap {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        last_synced: DateTime<Utc>,
    },
    /// Checkpoint already covers the wanted start
    UpToDate {
        first_synced: DateTime<Utc>,
        last_synced: DateTime<Utc>,
    },
}

impl SyncAction {
    /// Range to request from the remote source, if any
    pub fn fetch_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match *self {
            Self::Backfill { from, to } | Self::FillOlderGap { from, to, .. } => Some((from, to)),
            Self::UpToDate { .. } => None,
        }
    }

    /// `(first_synced, last_synced)` once the action has been committed
    pub fn synced_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        match *self {
            Self::Backfill { from, to } => (from, to),
            Self::FillOlderGap {
                from, last_synced, ..
            } => (from, last_synced),
            Self::UpToDate {
                first_synced,
                last_synced,
            } => (first_synced, last_synced),
        }
    }
}

/// Decide how to bring an instrument's stored history back to `want_from`
pub fn plan_sync(
    want_from: DateTime<Utc>,
    checkpoint: Option<&SyncCheckpoint>,
    now: DateTime<Utc>,
) -> SyncAction {
    match checkpoint {
        None => SyncAction::Backfill {
            from: want_from,
            to: now,
        },
        Some(cp) if want_from >= cp.first_synced => SyncAction::UpToDate {
            first_synced: cp.first_synced,
            last_synced: cp.last_synced,
        },
        Some(cp) => SyncAction::FillOlderGap {
            from: want_from,
            to: cp.first_synced,
            last_synced: cp.last_synced,
        },
    }
}
