//! Test helpers for shop database-backed tests.
//!
//! Provides seeding helpers for users, customers and products, plus
//! row-count probes used by atomicity assertions. Schema setup is left to
//! `#[sqlx::test(migrations = "../migrations")]`.

mod helpers;

pub use helpers::{
    count_order_items, count_orders, product_stock, seed_customer, seed_product, seed_user,
    seed_user_with_customer, ProductSeed,
};

/// Result type for test helpers.
pub type Result<T> = anyhow::Result<T>;
