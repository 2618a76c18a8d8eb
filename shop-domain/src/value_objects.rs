//! Value Objects for the Shop Domain
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain errors for value object validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Price must be non-negative
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Quantity must be positive
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Unknown order status
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// Malformed order request (empty item set, bad references)
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}

// =============================================================================
// Price
// =============================================================================

/// Price of a catalog product
///
/// # Invariants
/// - Must be >= 0 (free items are allowed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPrice` if value < 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value < Decimal::ZERO {
            return Err(DomainError::InvalidPrice("Price must not be negative".to_string()));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Zero price
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// Number of units of a product on an order line
///
/// # Invariants
/// - Must be > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// Create a new Quantity with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidQuantity` if value <= 0
    pub fn new(value: i32) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::InvalidQuantity(format!(
                "Quantity must be positive, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Get the underlying integer value
    pub fn get(&self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for Quantity {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_accepts_zero_and_positive() {
        assert_eq!(Price::new(dec!(0)).unwrap(), Price::zero());
        assert_eq!(Price::new(dec!(19.99)).unwrap().as_decimal(), dec!(19.99));
    }

    #[test]
    fn test_price_rejects_negative() {
        let result = Price::new(dec!(-0.01));
        assert!(matches!(result, Err(DomainError::InvalidPrice(_))));
    }

    #[test]
    fn test_price_deserialize_validates() {
        let price: Price = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(price.as_decimal(), dec!(12.50));

        let negative: Result<Price, _> = serde_json::from_str("\"-1\"");
        assert!(negative.is_err());
    }

    #[test]
    fn test_quantity_validation() {
        assert_eq!(Quantity::new(3).unwrap().get(), 3);
        assert!(matches!(Quantity::new(0), Err(DomainError::InvalidQuantity(_))));
        assert!(matches!(Quantity::new(-2), Err(DomainError::InvalidQuantity(_))));
    }

    #[test]
    fn test_quantity_deserialize_rejects_zero() {
        let ok: Quantity = serde_json::from_str("4").unwrap();
        assert_eq!(ok.get(), 4);

        let zero: Result<Quantity, _> = serde_json::from_str("0");
        assert!(zero.is_err());
    }
}
