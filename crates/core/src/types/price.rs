//! Money amounts for buy/sale prices.
//!
//! Prices travel as decimal strings (form input, TEXT columns) and must
//! never pick up binary floating point rounding, so the wrapper is a
//! [`rust_decimal::Decimal`] underneath.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a price from its string form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("invalid price: {0}")]
    Invalid(String),
    #[error("price may not be negative: {0}")]
    Negative(Decimal),
}

/// A non-negative money amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Parse a decimal string such as `"12.50"`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Invalid`] when the text is not a decimal
    /// number, or [`PriceError::Negative`] when it is below zero.
    pub fn parse(text: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(text.trim())
            .map_err(|_| PriceError::Invalid(text.to_owned()))?;
        Self::new(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Line total for a quantity of units at this price.
    #[must_use]
    pub fn extended(&self, qty: i64) -> Decimal {
        self.0 * Decimal::from(qty)
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let price = Price::parse("12.50").expect("valid price");
        assert_eq!(price.to_string(), "12.50");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert!(Price::parse("  3.99 ").is_ok());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(Price::parse("free"), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert!(matches!(Price::parse("-1.00"), Err(PriceError::Negative(_))));
    }

    #[test]
    fn test_extended_total() {
        let price = Price::parse("2.50").expect("valid price");
        assert_eq!(price.extended(4).to_string(), "10.00");
    }
}
