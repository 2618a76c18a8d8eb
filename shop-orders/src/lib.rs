//! Shop order engine
//!
//! Atomic order creation with stock reservation, plus the order read side.
//!
//! # Architecture
//!
//! ```text
//! Request layer → OrderService → OrderCoordinator → Store::begin → UnitOfWork → commit
//!                              → OrderQueryService → OrderRepository
//! ```
//!
//! # Components
//!
//! - **Coordinator**: creates an order, its items and the stock decrements in
//!   one unit of work; rolls everything back on any failure
//! - **Query**: order by id (with items), orders by customer (headers), owner lookup
//! - **Service**: facade over both, plus status updates
//!
//! # Example
//!
//! ```rust,ignore
//! use shop_orders::OrderService;
//! use shop_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let service = OrderService::new(Arc::new(MemoryStore::new()));
//! let order = service.create_order(new_order).await?;
//! ```

#![warn(clippy::all)]

pub mod coordinator;
pub mod error;
pub mod query;
pub mod service;

// Re-exports for convenience
pub use coordinator::OrderCoordinator;
pub use error::{OrderError, OrderResult};
pub use query::OrderQueryService;
pub use service::OrderService;
