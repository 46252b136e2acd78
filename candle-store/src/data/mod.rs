//! Data management module
//!
//! Candle, instrument and price types plus the in-memory working set.

pub mod candle;
pub mod instrument;
pub mod interval;
pub mod quotation;
pub mod working_set;

pub use candle::*;
pub use instrument::*;
pub use interval::*;
pub use quotation::*;
pub use working_set::*;
