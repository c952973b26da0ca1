//! Value Objects for promotional pricing

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places kept for percentages and money amounts.
pub const SCALE: u32 = 2;

/// Rounds an amount to cents, half-up at the cent boundary.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Discount percentage value object.
///
/// Always within `[0, 100]` and rounded to two decimal places, so any
/// `Percentage` can be used in a computation or shown to a shopper as-is.
/// Raw editor input goes through [`Percentage::clamped`], which maps NaN
/// to zero and out-of-range values to the nearest bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Percentage(Decimal);

impl Percentage {
    pub const ZERO: Percentage = Percentage(Decimal::ZERO);
    pub const FULL: Percentage = Percentage(Decimal::ONE_HUNDRED);

    pub fn clamped(raw: f64) -> Self {
        if raw.is_nan() || raw <= 0.0 { return Self::ZERO; }
        if raw >= 100.0 { return Self::FULL; }
        Decimal::from_f64(raw).map(Self::from_decimal).unwrap_or(Self::ZERO)
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Self(round_cents(value).clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
    }

    pub fn value(&self) -> Decimal { self.0 }
    pub fn to_f64(&self) -> f64 { self.0.to_f64().unwrap_or(0.0) }
    pub fn is_zero(&self) -> bool { self.0.is_zero() }

    /// Share of the price that remains after this discount, e.g. `0.85` for 15%.
    pub fn remaining_fraction(&self) -> Decimal {
        Decimal::ONE - self.0 / Decimal::ONE_HUNDRED
    }
}

impl From<f64> for Percentage {
    fn from(raw: f64) -> Self { Self::clamped(raw) }
}

impl From<Percentage> for f64 {
    fn from(p: Percentage) -> Self { p.to_f64() }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}%", self.0.normalize()) }
}
