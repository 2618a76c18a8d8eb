//! Test helper functions for database seeding.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::Result;

/// Product row to seed.
pub struct ProductSeed {
    /// Product name
    pub name: String,
    /// Catalog category
    pub category: String,
    /// Unit price
    pub price: Decimal,
    /// Initial stock
    pub stock: i32,
}

impl ProductSeed {
    /// Seed with the given stock and test defaults for everything else
    pub fn with_stock(stock: i32) -> Self {
        Self {
            stock,
            ..Self::default()
        }
    }
}

impl Default for ProductSeed {
    fn default() -> Self {
        Self {
            name: "Test Product".to_string(),
            category: "test".to_string(),
            price: Decimal::new(999, 2),
            stock: 10,
        }
    }
}

/// Seed a user row and return its id.
///
/// The password hash is a placeholder; authentication is not exercised here.
pub async fn seed_user(pool: &PgPool, email: &str) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (email, password_hash, role)
        VALUES ($1, 'not-a-real-hash', 'customer')
        RETURNING id
        "#,
    )
    .bind(email)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Seed a customer profile for an existing user and return its id.
pub async fn seed_customer(pool: &PgPool, user_id: i64) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO customers (user_id, first_name, last_name, phone_number)
        VALUES ($1, 'Test', 'Customer', '555-0100')
        RETURNING id
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Seed a user plus customer profile.
///
/// Returns (user_id, customer_id) tuple.
pub async fn seed_user_with_customer(pool: &PgPool, email: &str) -> Result<(i64, i64)> {
    let user_id = seed_user(pool, email).await?;
    let customer_id = seed_customer(pool, user_id).await?;
    Ok((user_id, customer_id))
}

/// Seed a product and return its id.
pub async fn seed_product(pool: &PgPool, seed: ProductSeed) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO products (name, description, category, price, stock)
        VALUES ($1, '', $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(&seed.name)
    .bind(&seed.category)
    .bind(seed.price)
    .bind(seed.stock)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Current committed stock of a product.
pub async fn product_stock(pool: &PgPool, product_id: i64) -> Result<i32> {
    let stock = sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await?;

    Ok(stock)
}

/// Number of committed orders.
pub async fn count_orders(pool: &PgPool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Number of committed order items.
pub async fn count_order_items(pool: &PgPool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM order_items")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
