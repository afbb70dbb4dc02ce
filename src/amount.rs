use serde::Serialize;
use std::fmt;

use crate::error::{LedgerError, Result};

/// Fixed-point money value with 2 decimal places, stored as integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(into = "f64")]
pub struct Amount(i64);

impl Amount {
    const SCALE: i64 = 100;

    /// Largest value a `numeric(10,2)` balance column can hold.
    pub const MAX: Amount = Amount(9_999_999_999);

    pub const ZERO: Amount = Amount(0);

    pub fn from_cents(cents: i64) -> Self {
        Amount(cents)
    }

    /// Validate a user-supplied amount and round it to 2 decimal places.
    ///
    /// The value must be finite, strictly positive after rounding and no larger
    /// than [`Amount::MAX`].
    pub fn from_input(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(LedgerError::invalid_amount(format!("{value} is not a finite number")));
        }
        if value <= 0.0 {
            return Err(LedgerError::invalid_amount(format!("{value} is not positive")));
        }

        let scaled = (value * Self::SCALE as f64).round();
        if scaled > Self::MAX.0 as f64 {
            return Err(LedgerError::invalid_amount(format!(
                "{value} exceeds the maximum of {}",
                Self::MAX
            )));
        }

        let amount = Amount(scaled as i64);
        if amount.is_zero() {
            return Err(LedgerError::invalid_amount(format!(
                "{value} rounds to zero"
            )));
        }
        Ok(amount)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let whole = abs / Self::SCALE;
        let frac = abs % Self::SCALE;
        write!(f, "{sign}{whole}.{frac:02}")
    }
}

impl From<Amount> for f64 {
    fn from(amount: Amount) -> Self {
        amount.to_f64()
    }
}

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, amount| acc + amount)
    }
}
