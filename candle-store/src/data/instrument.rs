//! Instrument descriptors and sync checkpoints

use crate::data::{CandleInterval, Quotation};
use crate::error::StorageError;
use crate::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Instrument requested by a caller, with the oldest history it wants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Provider instrument uid
    pub uid: String,
    /// Display ticker
    pub ticker: String,
    pub interval: CandleInterval,
    /// Minimum price increment
    pub price_step: Decimal,
    /// Desired start of the stored history
    pub from: DateTime<Utc>,
}

/// Instrument known to the storage, with the range already synced
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub uid: String,
    pub ticker: String,
    pub interval: CandleInterval,
    pub price_step: Quotation,
    /// Oldest timestamp ever fetched
    pub first_synced: DateTime<Utc>,
    /// Newest timestamp fetched or updated through
    pub last_synced: DateTime<Utc>,
}

impl Instrument {
    /// Descriptor for a config whose history covers `[first_synced, last_synced]`.
    ///
    /// A negative price step, or one that does not fit a [`Quotation`], is rejected.
    pub fn from_config(
        config: &InstrumentConfig,
        first_synced: DateTime<Utc>,
        last_synced: DateTime<Utc>,
    ) -> Result<Self> {
        let price_step = Quotation::from_decimal(config.price_step)
            .filter(|_| !config.price_step.is_sign_negative())
            .ok_or_else(|| StorageError::InvalidPriceStep {
                instrument: config.uid.clone(),
                value: config.price_step,
            })?;

        Ok(Self {
            uid: config.uid.clone(),
            ticker: config.ticker.clone(),
            interval: config.interval,
            price_step,
            first_synced,
            last_synced,
        })
    }

    pub fn checkpoint(&self) -> SyncCheckpoint {
        SyncCheckpoint {
            instrument_id: self.uid.clone(),
            first_synced: self.first_synced,
            last_synced: self.last_synced,
        }
    }
}

/// Durably recorded coverage of one instrument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCheckpoint {
    pub instrument_id: String,
    pub first_synced: DateTime<Utc>,
    pub last_synced: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(price_step: Decimal) -> InstrumentConfig {
        InstrumentConfig {
            uid: "uid-1".to_string(),
            ticker: "SBER".to_string(),
            interval: CandleInterval::Hour,
            price_step,
            from: Utc::now(),
        }
    }

    #[test]
    fn test_from_config_converts_price_step() {
        let now = Utc::now();
        let instrument = Instrument::from_config(&config(Decimal::new(1, 2)), now, now).unwrap();
        assert_eq!(instrument.price_step, Quotation::new(0, 10_000_000));
        assert_eq!(instrument.checkpoint().instrument_id, "uid-1");
    }

    #[test]
    fn test_from_config_rejects_bad_price_step() {
        let now = Utc::now();
        let err = Instrument::from_config(&config(Decimal::MAX), now, now).unwrap_err();
        assert!(matches!(err, StorageError::InvalidPriceStep { .. }));

        let err = Instrument::from_config(&config(Decimal::new(-1, 2)), now, now).unwrap_err();
        assert!(matches!(err, StorageError::InvalidPriceStep { .. }));
    }
}
