//! Demo data for local development.
//!
//! Seeds one demo user with a customer profile and a small catalog.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use super::Result;

/// Email of the seeded demo user.
pub const DEMO_EMAIL: &str = "demo@shop.local";

/// (name, category, description, price in cents, stock)
const CATALOG: &[(&str, &str, &str, i64, i32)] = &[
    ("Espresso Cup", "kitchen", "Porcelain cup, 90 ml", 650, 120),
    ("Pour-Over Kettle", "kitchen", "Gooseneck kettle, 1 l", 4_900, 25),
    ("Desk Lamp", "home", "LED lamp with dimmer", 3_250, 40),
    ("Notebook A5", "office", "Dotted, 192 pages", 1_199, 300),
    ("Fountain Pen", "office", "Steel nib, medium", 2_800, 15),
];

/// What `seed_catalog` left in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Demo user id
    pub user_id: i64,
    /// Demo customer id
    pub customer_id: i64,
    /// Products inserted by this run (0 when the catalog already had rows)
    pub products_inserted: usize,
}

/// Seed the demo user, its customer profile and the catalog.
///
/// Idempotent: existing rows are kept, and the catalog is only inserted into
/// an empty `products` table.
pub async fn seed_catalog(pool: &PgPool) -> Result<SeedSummary> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, role)
        VALUES ($1, 'seeded-account-no-login', 'customer')
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(DEMO_EMAIL)
    .execute(&mut *tx)
    .await?;

    let user_id = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = $1")
        .bind(DEMO_EMAIL)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO customers (user_id, first_name, last_name, phone_number)
        VALUES ($1, 'Demo', 'Customer', '555-0100')
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    let customer_id = sqlx::query_scalar::<_, i64>("SELECT id FROM customers WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&mut *tx)
        .await?;

    let mut products_inserted = 0;
    if existing == 0 {
        for (name, category, description, cents, stock) in CATALOG {
            sqlx::query(
                r#"
                INSERT INTO products (name, category, description, price, stock)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(*name)
            .bind(*category)
            .bind(*description)
            .bind(Decimal::new(*cents, 2))
            .bind(*stock)
            .execute(&mut *tx)
            .await?;
            products_inserted += 1;
        }
    } else {
        info!(existing, "Catalog already present, skipping products");
    }

    tx.commit().await?;

    info!(user_id, customer_id, products_inserted, "Demo data seeded");
    Ok(SeedSummary {
        user_id,
        customer_id,
        products_inserted,
    })
}
