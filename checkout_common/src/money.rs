use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of decimal places used for minor units when no currency-specific scale is configured.
pub const DEFAULT_CURRENCY_SCALE: u32 = 2;

/// The largest scale we accept. 10^18 still fits comfortably in an i64 multiplier.
const MAX_SCALE: u32 = 18;

//--------------------------------------       Money        ---------------------------------------------------------
/// An amount of money expressed as an integer number of currency minor units (e.g. cents).
///
/// `Money` carries no currency of its own. The currency code and its scale travel alongside it on the owning record.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Value cannot be represented in currency minor units: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {value} is too large to convert to Money")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format_with_scale(DEFAULT_CURRENCY_SCALE))
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// `None` if the sum does not fit in an i64.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `None` if the product does not fit in an i64.
    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    /// Converts a decimal amount into minor units, rounding half away from zero at `scale` decimal places.
    ///
    /// `Money::from_decimal(dec!(5.505), 2)` is 551 minor units.
    pub fn from_decimal(amount: Decimal, scale: u32) -> Result<Self, MoneyConversionError> {
        if scale > MAX_SCALE {
            return Err(MoneyConversionError(format!("Currency scale {scale} is not supported")));
        }
        let rounded = amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
        let multiplier = Decimal::from(10i64.pow(scale));
        rounded
            .checked_mul(multiplier)
            .and_then(|v| v.to_i64())
            .map(Self)
            .ok_or_else(|| MoneyConversionError(format!("{amount} overflows at scale {scale}")))
    }

    /// The amount as a decimal number of major units.
    pub fn to_decimal(&self, scale: u32) -> Decimal {
        Decimal::new(self.0, scale.min(MAX_SCALE))
    }

    /// Renders the amount in major units, e.g. `311.00` for 31100 minor units at scale 2.
    pub fn format_with_scale(&self, scale: u32) -> String {
        self.to_decimal(scale).to_string()
    }
}
