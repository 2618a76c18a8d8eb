//! Repository trait definitions (Ports)
//!
//! These traits define the storage interface for the order engine.
//! Implementations can be PostgreSQL, in-memory, or mock for testing.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shop_domain::{
    Customer, CustomerId, NewCustomer, NewProduct, Order, OrderId, OrderItem, OrderItemId,
    OrderStatus, Product, ProductId, Quantity, UserId,
};

/// Repository for catalog products.
///
/// Only what the order path and its tests need; catalog management lives
/// outside this workspace.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a product and return it with its assigned id
    async fn insert(&self, product: &NewProduct) -> Result<Product, StoreError>;

    /// Find a product by ID (plain read, never blocks on row locks)
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// List all products ordered by id
    async fn find_all(&self) -> Result<Vec<Product>, StoreError>;
}

/// Repository for customer profiles
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Insert a customer and return it with its assigned id
    async fn insert(&self, customer: &NewCustomer) -> Result<Customer, StoreError>;

    /// Find a customer by ID
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, StoreError>;
}

/// Read side of the order store, plus the single-row status write
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Fetch an order header. The returned order has no items.
    async fn fetch_order_header(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Fetch all items belonging to an order
    async fn fetch_items_by_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError>;

    /// Fetch all order headers of a customer (items not loaded)
    async fn fetch_orders_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, StoreError>;

    /// Resolve the user owning an order through its customer
    async fn resolve_owner_user_id(&self, order_id: OrderId) -> Result<Option<UserId>, StoreError>;

    /// Overwrite the status of an order.
    ///
    /// Returns `false` when no order with this id exists.
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<bool, StoreError>;
}

/// An open atomic unit of work.
///
/// Everything done through a unit of work becomes visible to others only on
/// `commit`. Dropping it without committing rolls everything back and
/// releases all row locks it holds.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Read a product's stock while taking an exclusive lock on its row.
    ///
    /// The lock is held until this unit of work ends. Waiting for another
    /// holder is bounded by the store's lock timeout
    /// (`StoreError::LockTimeout`). Fails with `NotFound` for unknown products.
    async fn lock_and_read_stock(&mut self, product_id: ProductId) -> Result<i32, StoreError>;

    /// Decrement a product's stock.
    ///
    /// Fails with `ConstraintViolation` if stock would become negative.
    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), StoreError>;

    /// Insert an order header, returning the store-assigned id and creation time
    async fn insert_order_header(
        &mut self,
        customer_id: CustomerId,
        status: OrderStatus,
    ) -> Result<(OrderId, DateTime<Utc>), StoreError>;

    /// Insert an order item
    async fn insert_order_item(
        &mut self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<OrderItemId, StoreError>;

    /// Make all changes visible and release locks
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard all changes and release locks
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Combined store interface
#[async_trait]
pub trait Store: Send + Sync {
    /// Get product repository
    fn products(&self) -> &dyn ProductRepository;

    /// Get customer repository
    fn customers(&self) -> &dyn CustomerRepository;

    /// Get order repository
    fn orders(&self) -> &dyn OrderRepository;

    /// Begin an atomic unit of work
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;
}
