//! Shop Storage Layer
//!
//! Inventory and order persistence for the order engine.
//!
//! # Architecture
//!
//! - **Repository traits**: Define the storage interface (ports)
//! - **Unit of work**: Atomic multi-row writes with row-level stock locks
//! - **In-memory store**: Fast implementation for testing
//! - **PostgreSQL store**: Production implementation (feature `postgres`)
//!
//! # Usage
//!
//! ```rust
//! use shop_store::{MemoryStore, Store};
//! use shop_domain::{NewProduct, Price, Quantity};
//! use rust_decimal::Decimal;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new();
//!
//!     let product = NewProduct::new("Mug", "kitchen", Price::new(Decimal::TEN).unwrap(), 5).unwrap();
//!     let product = store.products().insert(&product).await.unwrap();
//!
//!     // Lock the row, check and decrement inside one unit of work
//!     let mut uow = store.begin().await.unwrap();
//!     let available = uow.lock_and_read_stock(product.id).await.unwrap();
//!     assert_eq!(available, 5);
//!     uow.decrement_stock(product.id, Quantity::new(2).unwrap()).await.unwrap();
//!     uow.commit().await.unwrap();
//!
//!     let product = store.products().find_by_id(product.id).await.unwrap().unwrap();
//!     assert_eq!(product.stock, 3);
//! }
//! ```

#![warn(clippy::all)]

// Modules
mod error;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod repository;

// Re-exports
pub use error::StoreError;
pub use memory::{MemoryStore, MemoryUnitOfWork, DEFAULT_LOCK_TIMEOUT};
#[cfg(feature = "postgres")]
pub use postgres::{PgStore, PgUnitOfWork};
pub use repository::{
    CustomerRepository, OrderRepository, ProductRepository, Store, UnitOfWork,
};
