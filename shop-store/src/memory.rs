//! In-memory store implementation
//!
//! Used for testing and development without a database.
//!
//! Committed rows live behind `RwLock`s. A unit of work takes per-product row
//! locks (`tokio::sync::Mutex` owned guards) and stages every write; `commit`
//! applies the staged writes in one step, and dropping the unit of work
//! releases its locks and discards whatever was staged.

use crate::error::StoreError;
use crate::repository::{
    CustomerRepository, OrderRepository, ProductRepository, Store, UnitOfWork,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shop_domain::{
    Customer, CustomerId, NewCustomer, NewProduct, Order, OrderId, OrderItem, OrderItemId,
    OrderStatus, Product, ProductId, Quantity, UserId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

/// Default upper bound on waiting for a product row lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// In-memory store for testing
pub struct MemoryStore {
    state: Arc<MemoryState>,
    lock_timeout: Duration,
}

/// Committed state shared by the store and its open units of work
#[derive(Default)]
struct MemoryState {
    products: RwLock<BTreeMap<ProductId, Product>>,
    customers: RwLock<BTreeMap<CustomerId, Customer>>,
    orders: RwLock<BTreeMap<OrderId, OrderRow>>,
    items: RwLock<Vec<OrderItem>>,
    row_locks: Mutex<HashMap<ProductId, Arc<tokio::sync::Mutex<()>>>>,
    product_seq: AtomicI64,
    customer_seq: AtomicI64,
    order_seq: AtomicI64,
    item_seq: AtomicI64,
}

/// Order header as stored
#[derive(Debug, Clone)]
struct OrderRow {
    id: OrderId,
    customer_id: CustomerId,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn to_header(&self) -> Order {
        Order {
            id: self.id,
            customer_id: self.customer_id,
            status: self.status,
            created_at: self.created_at,
            items: Vec::new(),
        }
    }
}

impl MemoryState {
    fn next_id(seq: &AtomicI64) -> i64 {
        seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn row_lock(&self, product_id: ProductId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.row_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(product_id).or_default().clone()
    }

    fn committed_stock(&self, product_id: ProductId) -> Option<i32> {
        let products = self.products.read().unwrap_or_else(PoisonError::into_inner);
        products.get(&product_id).map(|p| p.stock)
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Create a store whose units of work give up waiting for a row lock
    /// after `lock_timeout`
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            state: Arc::new(MemoryState::default()),
            lock_timeout,
        }
    }

    /// Get the number of products
    pub fn product_count(&self) -> usize {
        self.state.products.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Get the number of committed orders
    pub fn order_count(&self) -> usize {
        self.state.orders.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Get the number of committed order items
    pub fn item_count(&self) -> usize {
        self.state.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Clear all data (useful for test setup)
    pub fn clear(&self) {
        self.state.products.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.state.customers.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.state.orders.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.state.items.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Product Repository Implementation
// =============================================================================

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn insert(&self, product: &NewProduct) -> Result<Product, StoreError> {
        if product.stock < 0 {
            return Err(StoreError::ConstraintViolation(format!(
                "product stock must not be negative: {}",
                product.stock
            )));
        }
        let row = Product {
            id: MemoryState::next_id(&self.state.product_seq),
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            price: product.price,
            stock: product.stock,
        };
        let mut products = self.state.products.write().unwrap_or_else(PoisonError::into_inner);
        products.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let products = self.state.products.read().unwrap_or_else(PoisonError::into_inner);
        Ok(products.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        let products = self.state.products.read().unwrap_or_else(PoisonError::into_inner);
        Ok(products.values().cloned().collect())
    }
}

// =============================================================================
// Customer Repository Implementation
// =============================================================================

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn insert(&self, customer: &NewCustomer) -> Result<Customer, StoreError> {
        let mut customers = self.state.customers.write().unwrap_or_else(PoisonError::into_inner);
        if customers.values().any(|c| c.user_id == customer.user_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "user {} already has a customer profile",
                customer.user_id
            )));
        }
        let row = Customer {
            id: MemoryState::next_id(&self.state.customer_seq),
            user_id: customer.user_id,
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            phone_number: customer.phone_number.clone(),
        };
        customers.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let customers = self.state.customers.read().unwrap_or_else(PoisonError::into_inner);
        Ok(customers.get(&id).cloned())
    }
}

// =============================================================================
// Order Repository Implementation
// =============================================================================

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn fetch_order_header(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let orders = self.state.orders.read().unwrap_or_else(PoisonError::into_inner);
        Ok(orders.get(&id).map(OrderRow::to_header))
    }

    async fn fetch_items_by_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        let items = self.state.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items.iter().filter(|i| i.order_id == order_id).cloned().collect())
    }

    async fn fetch_orders_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, StoreError> {
        let orders = self.state.orders.read().unwrap_or_else(PoisonError::into_inner);
        Ok(orders
            .values()
            .filter(|o| o.customer_id == customer_id)
            .map(OrderRow::to_header)
            .collect())
    }

    async fn resolve_owner_user_id(&self, order_id: OrderId) -> Result<Option<UserId>, StoreError> {
        let customer_id = {
            let orders = self.state.orders.read().unwrap_or_else(PoisonError::into_inner);
            match orders.get(&order_id) {
                Some(order) => order.customer_id,
                None => return Ok(None),
            }
        };
        let customers = self.state.customers.read().unwrap_or_else(PoisonError::into_inner);
        Ok(customers.get(&customer_id).map(|c| c.user_id))
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<bool, StoreError> {
        let mut orders = self.state.orders.write().unwrap_or_else(PoisonError::into_inner);
        match orders.get_mut(&id) {
            Some(order) => {
                order.status = status;
                Ok(true)
            },
            None => Ok(false),
        }
    }
}

// =============================================================================
// Unit of Work
// =============================================================================

/// Unit of work over a `MemoryStore`.
///
/// Holds the row locks it acquired and the writes it staged. Both are
/// released/discarded on drop unless `commit` applied them first.
pub struct MemoryUnitOfWork {
    state: Arc<MemoryState>,
    lock_timeout: Duration,
    held: HashMap<ProductId, OwnedMutexGuard<()>>,
    decrements: HashMap<ProductId, i32>,
    headers: Vec<OrderRow>,
    items: Vec<OrderItem>,
}

impl MemoryUnitOfWork {
    fn new(state: Arc<MemoryState>, lock_timeout: Duration) -> Self {
        Self {
            state,
            lock_timeout,
            held: HashMap::new(),
            decrements: HashMap::new(),
            headers: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Take the row lock for a product unless this unit of work already holds it
    async fn acquire(&mut self, product_id: ProductId) -> Result<(), StoreError> {
        if self.held.contains_key(&product_id) {
            return Ok(());
        }
        if self.state.committed_stock(product_id).is_none() {
            return Err(StoreError::not_found("product", product_id));
        }

        let lock = self.state.row_lock(product_id);
        let guard = tokio::time::timeout(self.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| StoreError::lock_timeout("product", product_id))?;

        debug!(product_id, "Row lock acquired");
        self.held.insert(product_id, guard);
        Ok(())
    }

    /// Stock as seen by this unit of work: committed value minus own decrements
    fn visible_stock(&self, product_id: ProductId) -> Result<i32, StoreError> {
        let committed = self
            .state
            .committed_stock(product_id)
            .ok_or_else(|| StoreError::not_found("product", product_id))?;
        Ok(committed - self.decrements.get(&product_id).copied().unwrap_or(0))
    }

    fn order_exists(&self, order_id: OrderId) -> bool {
        self.headers.iter().any(|h| h.id == order_id)
            || self
                .state
                .orders
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(&order_id)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_and_read_stock(&mut self, product_id: ProductId) -> Result<i32, StoreError> {
        self.acquire(product_id).await?;
        self.visible_stock(product_id)
    }

    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), StoreError> {
        // Like an UPDATE, a decrement locks the row if not locked yet
        self.acquire(product_id).await?;

        let available = self.visible_stock(product_id)?;
        if available < quantity.get() {
            return Err(StoreError::ConstraintViolation(format!(
                "stock of product {} would become negative ({} - {})",
                product_id, available, quantity
            )));
        }
        *self.decrements.entry(product_id).or_insert(0) += quantity.get();
        Ok(())
    }

    async fn insert_order_header(
        &mut self,
        customer_id: CustomerId,
        status: OrderStatus,
    ) -> Result<(OrderId, DateTime<Utc>), StoreError> {
        let customer_exists = self
            .state
            .customers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&customer_id);
        if !customer_exists {
            return Err(StoreError::not_found("customer", customer_id));
        }

        let row = OrderRow {
            id: MemoryState::next_id(&self.state.order_seq),
            customer_id,
            status,
            created_at: Utc::now(),
        };
        let assigned = (row.id, row.created_at);
        self.headers.push(row);
        Ok(assigned)
    }

    async fn insert_order_item(
        &mut self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<OrderItemId, StoreError> {
        if !self.order_exists(order_id) {
            return Err(StoreError::not_found("order", order_id));
        }
        if self.state.committed_stock(product_id).is_none() {
            return Err(StoreError::not_found("product", product_id));
        }

        let id = MemoryState::next_id(&self.state.item_seq);
        self.items.push(OrderItem {
            id,
            order_id,
            product_id,
            quantity,
        });
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        {
            let mut products = this.state.products.write().unwrap_or_else(PoisonError::into_inner);
            let mut orders = this.state.orders.write().unwrap_or_else(PoisonError::into_inner);
            let mut items = this.state.items.write().unwrap_or_else(PoisonError::into_inner);

            // Verify before applying anything so a failed commit changes nothing
            for (product_id, amount) in &this.decrements {
                let product = products
                    .get(product_id)
                    .ok_or_else(|| StoreError::not_found("product", product_id))?;
                if product.stock < *amount {
                    return Err(StoreError::ConstraintViolation(format!(
                        "stock of product {} would become negative ({} - {})",
                        product_id, product.stock, amount
                    )));
                }
            }

            for (product_id, amount) in &this.decrements {
                if let Some(product) = products.get_mut(product_id) {
                    product.stock -= amount;
                }
            }
            for header in &this.headers {
                orders.insert(header.id, header.clone());
            }
            items.extend(this.items.iter().cloned());
        }

        debug!(
            orders = this.headers.len(),
            items = this.items.len(),
            locks = this.held.len(),
            "Unit of work committed"
        );
        // Row locks are released when `this` drops here, after the writes
        // above are visible.
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        debug!(locks = self.held.len(), "Unit of work rolled back");
        Ok(())
    }
}

// =============================================================================
// Store Implementation
// =============================================================================

#[async_trait]
impl Store for MemoryStore {
    fn products(&self) -> &dyn ProductRepository {
        self
    }

    fn customers(&self) -> &dyn CustomerRepository {
        self
    }

    fn orders(&self) -> &dyn OrderRepository {
        self
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        Ok(Box::new(MemoryUnitOfWork::new(self.state.clone(), self.lock_timeout)))
    }
}

// =============================================================================
// Tests
// =============================================================================
