//! Candle Store: a local, durable mirror of historical candles
//!
//! The store keeps a SQLite copy of provider candles per instrument and
//! fetches only what is missing:
//!
//! - **Durable Store**: candles plus one sync checkpoint per instrument,
//!   written through [`repositories::CandleRepository`]
//! - **Reconciler**: decides between initial backfill, older-gap backfill
//!   and no-op for each instrument, then optionally refreshes up to now
//! - **Working Set**: in-memory ordered candles per instrument, used to
//!   answer range queries without I/O
//! - **Remote Source**: the [`exchange::CandleSource`] trait and a REST
//!   client for the provider gateway
//!
//! # Example
//!
//! ```no_run
//! use candle_store::prelude::*;
//! use chrono::{Duration, Utc};
//!
//! # async fn run(instruments: Vec<InstrumentConfig>) -> anyhow::Result<()> {
//! let source = InvestRestClient::new("https://invest-public-api.tinkoff.ru/rest", "token");
//! let now = Utc::now();
//! let storage = CandleStorage::open(
//!     OpenRequest {
//!         db_path: "./candles.db".to_string(),
//!         instruments,
//!         update: true,
//!         from: now - Duration::days(7),
//!         to: now,
//!     },
//!     source,
//! )
//! .await?;
//! let last_day = storage.candles("e6123145-9665-43e0-8413-cd61b8aa9b13", now - Duration::days(1), now)?;
//! println!("{} candles", last_day.len());
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod error;
pub mod exchange;
pub mod repositories;
pub mod storage;

// Re-export commonly used types
pub mod prelude {
    pub use crate::data::*;
    pub use crate::error::*;
    pub use crate::exchange::*;
    pub use crate::repositories::*;
    pub use crate::storage::*;
}

/// Result type alias
pub type Result<T> = std::result::Result<T, error::StorageError>;
