//! Remote candle source module
//!
//! The storage only needs one capability from the market-data provider:
//! historic candles for an instrument, interval and time range.

pub mod rest;
pub mod source;

pub use rest::*;
pub use source::*;
