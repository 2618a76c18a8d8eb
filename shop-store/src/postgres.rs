//! PostgreSQL store.
//!
//! This module provides:
//! - `PgStore` implementing every repository and `Store::begin`
//! - `PgUnitOfWork`, a wrapper around a `sqlx::Transaction`
//!
//! This module uses dynamic queries (sqlx::query) instead of compile-time
//! checked macros (sqlx::query!) to allow compilation without DATABASE_URL.
//!
//! Schema: see `migrations/` at the workspace root.

use crate::error::StoreError;
use crate::repository::{
    CustomerRepository, OrderRepository, ProductRepository, Store, UnitOfWork,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shop_domain::{
    Customer, CustomerId, NewCustomer, NewProduct, Order, OrderId, OrderItem, OrderItemId,
    OrderStatus, Price, Product, ProductId, Quantity, UserId,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;
use tracing::debug;

use crate::memory::DEFAULT_LOCK_TIMEOUT;

/// PostgreSQL-backed store.
pub struct PgStore {
    /// PostgreSQL connection pool
    pool: PgPool,
    /// Applied as `lock_timeout` to every unit of work
    lock_timeout: Duration,
}

impl PgStore {
    /// Create a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self::with_lock_timeout(pool, DEFAULT_LOCK_TIMEOUT)
    }

    /// Create a store whose units of work wait at most `lock_timeout` for a row lock.
    pub fn with_lock_timeout(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    /// Get a reference to the underlying pool (for testing).
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// =============================================================================
// Row mapping
// =============================================================================

fn parse_status(raw: &str) -> Result<OrderStatus, StoreError> {
    raw.parse()
        .map_err(|e| StoreError::Deserialization(format!("Invalid order status {}: {}", raw, e)))
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    let price: Decimal = row.try_get("price")?;
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        price: Price::new(price)
            .map_err(|e| StoreError::Deserialization(format!("Invalid price: {}", e)))?,
        stock: row.try_get("stock")?,
    })
}

fn customer_from_row(row: &PgRow) -> Result<Customer, StoreError> {
    Ok(Customer {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone_number: row.try_get("phone_number")?,
    })
}

fn order_header_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(Order {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        status: parse_status(&status)?,
        created_at: row.try_get("created_at")?,
        items: Vec::new(),
    })
}

fn order_item_from_row(row: &PgRow) -> Result<OrderItem, StoreError> {
    let quantity: i32 = row.try_get("quantity")?;
    Ok(OrderItem {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        product_id: row.try_get("product_id")?,
        quantity: Quantity::new(quantity)
            .map_err(|e| StoreError::Deserialization(format!("Invalid quantity: {}", e)))?,
    })
}

// =============================================================================
// Product Repository
// =============================================================================

#[async_trait]
impl ProductRepository for PgStore {
    async fn insert(&self, product: &NewProduct) -> Result<Product, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (name, description, category, price, stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, category, price, stock
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price.as_decimal())
        .bind(product.stock)
        .fetch_one(&self.pool)
        .await?;

        product_from_row(&row)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, description, category, price, stock FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, description, category, price, stock FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }
}

// =============================================================================
// Customer Repository
// =============================================================================

#[async_trait]
impl CustomerRepository for PgStore {
    async fn insert(&self, customer: &NewCustomer) -> Result<Customer, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO customers (user_id, first_name, last_name, phone_number)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, first_name, last_name, phone_number
            "#,
        )
        .bind(customer.user_id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.phone_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::NotFound { .. } => StoreError::not_found("user", customer.user_id),
            other => other,
        })?;

        customer_from_row(&row)
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query(
            "SELECT id, user_id, first_name, last_name, phone_number FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(customer_from_row).transpose()
    }
}

// =============================================================================
// Order Repository
// =============================================================================

#[async_trait]
impl OrderRepository for PgStore {
    async fn fetch_order_header(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(
            "SELECT id, customer_id, status, created_at FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(order_header_from_row).transpose()
    }

    async fn fetch_items_by_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, order_id, product_id, quantity FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(order_item_from_row).collect()
    }

    async fn fetch_orders_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, status, created_at
            FROM orders
            WHERE customer_id = $1
            ORDER BY id
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(order_header_from_row).collect()
    }

    async fn resolve_owner_user_id(&self, order_id: OrderId) -> Result<Option<UserId>, StoreError> {
        let user_id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT c.user_id
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE o.id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user_id)
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit of Work
// =============================================================================

/// Unit of work backed by a PostgreSQL transaction.
///
/// sqlx rolls the transaction back when it is dropped without commit, which
/// also releases every `FOR UPDATE` lock taken through it.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_and_read_stock(&mut self, product_id: ProductId) -> Result<i32, StoreError> {
        let stock = sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = $1 FOR UPDATE")
            .bind(product_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::LockTimeout { .. } => StoreError::lock_timeout("product", product_id),
                other => other,
            })?;

        debug!(product_id, "Row lock acquired");
        stock.ok_or_else(|| StoreError::not_found("product", product_id))
    }

    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2")
            .bind(quantity.get())
            .bind(product_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::LockTimeout { .. } => StoreError::lock_timeout("product", product_id),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", product_id));
        }
        Ok(())
    }

    async fn insert_order_header(
        &mut self,
        customer_id: CustomerId,
        status: OrderStatus,
    ) -> Result<(OrderId, DateTime<Utc>), StoreError> {
        let row = sqlx::query(
            "INSERT INTO orders (customer_id, status) VALUES ($1, $2) RETURNING id, created_at",
        )
        .bind(customer_id)
        .bind(status.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::NotFound { .. } => StoreError::not_found("customer", customer_id),
            other => other,
        })?;

        Ok((row.try_get("id")?, row.try_get("created_at")?))
    }

    async fn insert_order_item(
        &mut self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<OrderItemId, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO order_items (order_id, product_id, quantity) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(order_id)
        .bind(product_id)
        .bind(quantity.get())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

// =============================================================================
// Store
// =============================================================================

#[async_trait]
impl Store for PgStore {
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
        let mut tx = self.pool.begin().await?;

        // Bound every row-lock wait inside this transaction
        let timeout = format!("{}ms", self.lock_timeout.as_millis());
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(&timeout)
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PgUnitOfWork { tx }))
    }
}
