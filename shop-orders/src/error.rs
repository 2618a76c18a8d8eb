//! Order engine error types.

use shop_domain::{DomainError, ProductId};
use shop_store::StoreError;
use thiserror::Error;

/// Errors returned by order creation, queries and status updates.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Input rejected before the store was touched
    #[error("Invalid order: {0}")]
    Validation(String),

    /// A product cannot cover the requested quantity.
    ///
    /// Recoverable by the client (order less, or later).
    #[error("insufficient quantity for product {product_id}: available {available}, required {requested}")]
    InsufficientStock {
        /// Product whose stock was too low
        product_id: ProductId,
        /// Stock observed under the row lock
        available: i32,
        /// Quantity requested by the order line
        requested: i32,
    },

    /// Order, customer or product does not exist
    #[error("{entity_type} not found: {id}")]
    NotFound {
        /// Type of entity (order, customer, product)
        entity_type: String,
        /// Entity ID
        id: String,
    },

    /// Lock-wait timeout, deadlock or lost connection. Retrying may succeed.
    #[error("Transient store failure: {0}")]
    Transient(StoreError),

    /// Unexpected store failure
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl OrderError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderError::Transient(_))
    }
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity_type, id } => OrderError::NotFound { entity_type, id },
            err if err.is_transient() => OrderError::Transient(err),
            err => OrderError::Store(err),
        }
    }
}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        OrderError::Validation(err.to_string())
    }
}

/// Result type for order operations.
pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_routing() {
        let err: OrderError = StoreError::not_found("order", 7).into();
        assert!(matches!(err, OrderError::NotFound { ref entity_type, ref id }
            if entity_type == "order" && id == "7"));

        let err: OrderError = StoreError::lock_timeout("product", 1).into();
        assert!(matches!(err, OrderError::Transient(StoreError::LockTimeout { .. })));
        assert!(err.is_retryable());

        let err: OrderError = StoreError::Conflict("deadlock detected".into()).into();
        assert!(matches!(err, OrderError::Transient(_)));

        let err: OrderError = StoreError::ConstraintViolation("stock".into()).into();
        assert!(matches!(err, OrderError::Store(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_insufficient_stock_message() {
        let err = OrderError::InsufficientStock {
            product_id: 4,
            available: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "insufficient quantity for product 4: available 2, required 3"
        );
    }

    #[test]
    fn test_domain_error_is_validation() {
        let err: OrderError = DomainError::InvalidQuantity("0".into()).into();
        assert!(matches!(err, OrderError::Validation(_)));
    }
}
