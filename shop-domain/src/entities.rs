//! Domain Entities for the Shop
//!
//! Catalog, customer and order entities. Identifiers are assigned by the
//! store on insertion, so entities are only constructed from persisted rows;
//! the `New*` types describe rows that do not exist yet.

use crate::value_objects::{DomainError, Price, Quantity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Identifiers
// =============================================================================

/// Unique identifier for a Product
pub type ProductId = i64;

/// Unique identifier for a Customer
pub type CustomerId = i64;

/// Unique identifier for a User (owner of a customer profile)
pub type UserId = i64;

/// Unique identifier for an Order
pub type OrderId = i64;

/// Unique identifier for an Order Item
pub type OrderItemId = i64;

// =============================================================================
// Product
// =============================================================================

/// Catalog product. `stock` is the contended field decremented by orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Store-assigned id
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Catalog category
    pub category: String,
    /// Unit price
    pub price: Price,
    /// Units on hand, never negative
    pub stock: i32,
}

/// Product row to insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Catalog category
    pub category: String,
    /// Unit price
    pub price: Price,
    /// Initial units on hand
    pub stock: i32,
}

impl NewProduct {
    /// Create a new product description with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidQuantity` if stock is negative
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        price: Price,
        stock: i32,
    ) -> Result<Self, DomainError> {
        if stock < 0 {
            return Err(DomainError::InvalidQuantity(format!(
                "Stock must not be negative, got {}",
                stock
            )));
        }
        Ok(Self {
            name: name.into(),
            description: String::new(),
            category: category.into(),
            price,
            stock,
        })
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Customer profile, owned by exactly one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Store-assigned id
    pub id: CustomerId,
    /// Owning user
    pub user_id: UserId,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact phone
    pub phone_number: String,
}

/// Customer row to insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    /// Owning user
    pub user_id: UserId,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact phone
    pub phone_number: String,
}

// =============================================================================
// Order Status
// =============================================================================

/// Order status
///
/// Intended lifecycle: Pending → Completed, Pending → Cancelled.
/// The store persists whatever status is written; the request layer decides
/// which values it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, not yet fulfilled
    Pending,
    /// Fulfilled
    Completed,
    /// Cancelled by the customer or an operator
    Cancelled,
}

impl OrderStatus {
    /// Lowercase name, as persisted
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Check if this is a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::InvalidStatus(format!(
                "{}. Expected: pending, completed, cancelled",
                other
            ))),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order with its line items
///
/// Orders returned by customer listings carry an empty `items` vector;
/// only single-order reads load the items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned id
    pub id: OrderId,
    /// Customer that placed the order
    pub customer_id: CustomerId,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Creation time, set by the store
    pub created_at: DateTime<Utc>,
    /// Line items (empty when only the header was loaded)
    #[serde(rename = "order_items")]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Total units across all line items
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i64::from(i.quantity.get())).sum()
    }
}

/// A line item. Created only together with its order and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Store-assigned id
    pub id: OrderItemId,
    /// Parent order
    pub order_id: OrderId,
    /// Ordered product
    pub product_id: ProductId,
    /// Ordered units
    pub quantity: Quantity,
}

// =============================================================================
// Order creation input
// =============================================================================

/// Unvalidated order placement input, as received from the request layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Customer placing the order
    pub customer_id: CustomerId,
    /// Initial status
    pub status: OrderStatus,
    /// Requested lines
    #[serde(rename = "order_items")]
    pub items: Vec<NewOrderItem>,
}

/// Unvalidated line of a `NewOrder`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    /// Requested product
    pub product_id: ProductId,
    /// Requested units (validated later)
    pub quantity: i32,
}

/// Validated line: positive quantity, positive product id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    /// Product to reserve
    pub product_id: ProductId,
    /// Units to reserve
    pub quantity: Quantity,
}

/// Order input that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    /// Customer placing the order
    pub customer_id: CustomerId,
    /// Initial status
    pub status: OrderStatus,
    /// Lines in submission order
    pub lines: Vec<OrderLine>,
}

impl NewOrder {
    /// Validate the input without touching any store.
    ///
    /// # Errors
    /// - `DomainError::InvalidOrder` for an empty item set or non-positive ids
    /// - `DomainError::InvalidQuantity` for a non-positive quantity
    pub fn validate(&self) -> Result<ValidatedOrder, DomainError> {
        if self.customer_id <= 0 {
            return Err(DomainError::InvalidOrder(format!(
                "Invalid customer id: {}",
                self.customer_id
            )));
        }
        if self.items.is_empty() {
            return Err(DomainError::InvalidOrder("Order must contain at least one item".to_string()));
        }

        let lines = self
            .items
            .iter()
            .map(|item| {
                if item.product_id <= 0 {
                    return Err(DomainError::InvalidOrder(format!(
                        "Invalid product id: {}",
                        item.product_id
                    )));
                }
                Ok(OrderLine {
                    product_id: item.product_id,
                    quantity: Quantity::new(item.quantity)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedOrder {
            customer_id: self.customer_id,
            status: self.status,
            lines,
        })
    }
}

impl ValidatedOrder {
    /// Lines sorted by ascending product id.
    ///
    /// Row locks are acquired in this order so that two orders touching the
    /// same products can never wait on each other in a cycle. The sort is
    /// stable: repeated products keep their submission order.
    pub fn lines_in_lock_order(&self) -> Vec<OrderLine> {
        let mut lines = self.lines.clone();
        lines.sort_by_key(|line| line.product_id);
        lines
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_order(items: Vec<(ProductId, i32)>) -> NewOrder {
        NewOrder {
            customer_id: 1,
            status: OrderStatus::Pending,
            items: items
                .into_iter()
                .map(|(product_id, quantity)| NewOrderItem { product_id, quantity })
                .collect(),
        }
    }

    #[test]
    fn test_order_status_roundtrip() {
        for status in [OrderStatus::Pending, OrderStatus::Completed, OrderStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_serde_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        let parsed: OrderStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, OrderStatus::Completed);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_validate_accepts_well_formed_order() {
        let validated = new_order(vec![(3, 1), (1, 2)]).validate().unwrap();
        assert_eq!(validated.customer_id, 1);
        assert_eq!(validated.lines.len(), 2);
        assert_eq!(validated.lines[0].product_id, 3);
    }

    #[test]
    fn test_validate_rejects_empty_items() {
        let result = new_order(vec![]).validate();
        assert!(matches!(result, Err(DomainError::InvalidOrder(_))));
    }

    #[test]
    fn test_validate_rejects_non_positive_quantity() {
        let result = new_order(vec![(1, 2), (2, 0)]).validate();
        assert!(matches!(result, Err(DomainError::InvalidQuantity(_))));

        let result = new_order(vec![(1, -5)]).validate();
        assert!(matches!(result, Err(DomainError::InvalidQuantity(_))));
    }

    #[test]
    fn test_validate_rejects_bad_ids() {
        let mut order = new_order(vec![(1, 1)]);
        order.customer_id = 0;
        assert!(matches!(order.validate(), Err(DomainError::InvalidOrder(_))));

        let order = new_order(vec![(-4, 1)]);
        assert!(matches!(order.validate(), Err(DomainError::InvalidOrder(_))));
    }

    #[test]
    fn test_lock_order_is_ascending_and_stable() {
        let validated = new_order(vec![(7, 1), (2, 5), (7, 3), (4, 1)]).validate().unwrap();
        let lines = validated.lines_in_lock_order();

        let ids: Vec<_> = lines.iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![2, 4, 7, 7]);
        // Repeated product keeps submission order
        assert_eq!(lines[2].quantity.get(), 1);
        assert_eq!(lines[3].quantity.get(), 3);
    }

    #[test]
    fn test_new_product_rejects_negative_stock() {
        let price = Price::new(dec!(9.99)).unwrap();
        assert!(NewProduct::new("Mug", "kitchen", price, -1).is_err());

        let product = NewProduct::new("Mug", "kitchen", price, 10)
            .unwrap()
            .with_description("Ceramic, 300ml");
        assert_eq!(product.description, "Ceramic, 300ml");
    }

    #[test]
    fn test_order_serializes_items_as_order_items() {
        let order = Order {
            id: 1,
            customer_id: 2,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            items: vec![OrderItem {
                id: 10,
                order_id: 1,
                product_id: 5,
                quantity: Quantity::new(2).unwrap(),
            }],
        };

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["order_items"][0]["quantity"], 2);
        assert_eq!(order.total_quantity(), 2);
    }
}
