//! Integer minor-unit money.
//!
//! Every balance and amount inside the ledger is an `i64` count of minor
//! units (paise). Decimal major units only exist at the API boundary and are
//! converted exactly once, through [`Money::from_major`] and
//! [`Money::to_major`].

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::error::DomainError;

/// Minor units in one major unit (100 paise to the rupee).
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Decimal places carried by major-unit values.
pub const DECIMAL_PLACES: u32 = 2;

/// Non-negative amount of money in minor units.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Compile-time constructor for constants.
    pub const fn from_const(minor: i64) -> Self {
        assert!(minor >= 0, "money constants must be non-negative");
        Self(minor)
    }

    /// Creates a Money value from minor units. Zero is allowed.
    pub fn from_minor(minor: i64) -> Result<Self, DomainError> {
        if minor < 0 {
            return Err(DomainError::NegativeAmount);
        }
        Ok(Self(minor))
    }

    /// Creates a strictly positive transfer amount from minor units.
    pub fn positive(minor: i64) -> Result<Self, DomainError> {
        if minor <= 0 {
            return Err(DomainError::InvalidAmount(format!(
                "amount must be positive, got {} minor units",
                minor
            )));
        }
        Ok(Self(minor))
    }

    /// Converts a decimal major-unit amount into minor units.
    ///
    /// Rejects zero, negative values and anything finer than one minor unit;
    /// there is no rounding.
    pub fn from_major(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidAmount(format!(
                "amount must be positive, got {}",
                value
            )));
        }
        Self::convert(value)
    }

    /// Like [`Money::from_major`] but accepts zero. Used for configured caps.
    pub fn from_major_or_zero(value: Decimal) -> Result<Self, DomainError> {
        if value < Decimal::ZERO {
            return Err(DomainError::NegativeAmount);
        }
        Self::convert(value)
    }

    fn convert(value: Decimal) -> Result<Self, DomainError> {
        let minor = value
            .checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))
            .ok_or_else(|| DomainError::InvalidAmount(format!("amount {} is too large", value)))?;

        if !minor.fract().is_zero() {
            return Err(DomainError::InvalidAmount(format!(
                "amount {} has more than {} decimal places",
                value, DECIMAL_PLACES
            )));
        }

        minor
            .to_i64()
            .map(Self)
            .ok_or_else(|| DomainError::InvalidAmount(format!("amount {} is too large", value)))
    }

    /// Converts back to a decimal major-unit value with two decimal places.
    pub fn to_major(self) -> Decimal {
        Decimal::new(self.0, DECIMAL_PLACES)
    }

    /// Returns the amount in minor units.
    pub fn minor(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition; overflow is reported as an invalid amount.
    pub fn checked_add(self, other: Money) -> Result<Money, DomainError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::InvalidAmount("balance overflow".into()))
    }

    /// Checked subtraction; never produces a negative value.
    pub fn checked_sub(self, other: Money) -> Result<Money, DomainError> {
        if self.0 < other.0 {
            return Err(DomainError::InsufficientBalance {
                available: self.0,
                requested: other.0,
            });
        }
        Ok(Money(self.0 - other.0))
    }

    /// Scales a cap by a window multiplier, saturating at `i64::MAX`.
    pub fn times(self, factor: i64) -> Money {
        Money(self.0.saturating_mul(factor))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let major = self.0 / MINOR_UNITS_PER_MAJOR;
        let minor = self.0 % MINOR_UNITS_PER_MAJOR;
        write!(f, "₹{}.{:02}", major, minor)
    }
}
