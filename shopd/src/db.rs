//! Database CLI subcommands for shopd.
//!
//! Provides `db migrate`, `db status`, and `db seed` commands.

use anyhow::{anyhow, Result};
use std::env;
use tracing::info;

use shop_db::{migrate, seed_catalog, status};

/// Run database CLI subcommands.
///
/// Supported commands:
/// - `shopd db migrate` - Run pending migrations
/// - `shopd db status` - Check migration status
/// - `shopd db seed` - Seed a demo user, customer and catalog
pub async fn run_db_command(args: &[String]) -> Result<()> {
    let command = args
        .get(2)
        .ok_or_else(|| anyhow!("Usage: shopd db <migrate|status|seed>"))?;

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow!("DATABASE_URL environment variable is required for db commands"))?;

    let pool = sqlx::PgPool::connect(&database_url).await?;

    match command.as_str() {
        "migrate" => {
            migrate(&pool).await?;
        },
        "status" => {
            status(&pool).await?;
        },
        "seed" => {
            let summary = seed_catalog(&pool).await?;
            info!(
                user_id = summary.user_id,
                customer_id = summary.customer_id,
                products_inserted = summary.products_inserted,
                "Seed finished"
            );
        },
        other => {
            return Err(anyhow!("Unknown db command: {}. Use migrate, status, or seed", other));
        },
    }

    Ok(())
}
