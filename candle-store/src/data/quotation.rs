//! Provider price representation and price-step quantization

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const NANO_SCALE: u32 = 9;
const NANOS_PER_UNIT: i64 = 1_000_000_000;

/// Fixed-point price: `units + nano * 1e-9`, both parts carry the same sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Quotation {
    /// Whole part
    pub units: i64,
    /// Fractional part in billionths
    pub nano: i32,
}

impl Quotation {
    pub const ZERO: Quotation = Quotation { units: 0, nano: 0 };

    pub fn new(units: i64, nano: i32) -> Self {
        Self { units, nano }
    }

    pub fn is_zero(&self) -> bool {
        self.units == 0 && self.nano == 0
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::from(self.units) + Decimal::new(self.nano as i64, NANO_SCALE)
    }

    /// Split a decimal into units and nanos; digits beyond 1e-9 are rounded.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        let units = value.trunc();
        let nano = round_half_away((value - units) * Decimal::from(NANOS_PER_UNIT));
        Some(Self {
            units: units.to_i64()?,
            nano: nano.to_i32()?,
        })
    }

    /// Value as persisted in the `real` candle columns
    pub fn to_f64(&self) -> f64 {
        self.units as f64 + self.nano as f64 / NANOS_PER_UNIT as f64
    }

    /// Rebuild a quotation from a stored real number, snapping it to the nearest
    /// multiple of `step`. A zero step keeps the value as is.
    ///
    /// Returns `None` for NaN, infinities, values outside the `i64` unit range
    /// and values whose step count overflows a `Decimal`.
    pub fn from_f64(value: f64, step: Quotation) -> Option<Self> {
        let value = Decimal::from_f64(value)?;
        if step.is_zero() {
            return Self::from_decimal(value);
        }
        let step = step.to_decimal();
        let steps = round_half_away(value.checked_div(step)?);
        Self::from_decimal(steps.checked_mul(step)?)
    }
}

fn round_half_away(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

impl From<Quotation> for Decimal {
    fn from(quotation: Quotation) -> Self {
        quotation.to_decimal()
    }
}

impl TryFrom<Decimal> for Quotation {
    type Error = rust_decimal::Error;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value).ok_or(rust_decimal::Error::ExceedsMaximumPossibleValue)
    }
}

impl FromStr for Quotation {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())?.try_into()
    }
}

impl fmt::Display for Quotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal().normalize())
    }
}
