//! Shop Domain Layer
//!
//! Pure domain logic with zero I/O dependencies.
//! Contains entities, value objects, and order input validation.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod entities;
pub mod value_objects;

// Re-export commonly used types
pub use entities::{
    Customer, CustomerId, NewCustomer, NewOrder, NewOrderItem, NewProduct, Order, OrderId,
    OrderItem, OrderItemId, OrderLine, OrderStatus, Product, ProductId, UserId, ValidatedOrder,
};
pub use value_objects::{DomainError, Price, Quantity};
