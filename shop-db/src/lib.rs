//! Database lifecycle management for the shop.
//!
//! Provides migration running, status checking, and demo data seeding.

mod seed;

pub use seed::{seed_catalog, SeedSummary, DEMO_EMAIL};

use sqlx::{PgPool, Row};
use tracing::{info, warn};

/// Result type for DB operations.
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Run all pending migrations.
///
/// Uses sqlx migrations from the workspace `migrations` directory.
/// Idempotent: safe to run multiple times.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");

    sqlx::migrate!("../migrations").run(pool).await?;

    info!("Migrations completed successfully");
    Ok(())
}

/// Check database connectivity and migration status.
///
/// Logs the applied migrations, newest first.
pub async fn status(pool: &PgPool) -> Result<()> {
    let result: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;

    if result != 1 {
        return Err(anyhow::anyhow!("Database connectivity check failed"));
    }

    info!("Database connectivity: OK");

    // Runtime query: sqlx::query! would need a database at compile time
    let rows = sqlx::query(
        r#"
        SELECT version, description, installed_on::TEXT AS installed_on, success
        FROM _sqlx_migrations
        ORDER BY version DESC
        LIMIT 10
        "#,
    )
    .fetch_all(pool)
    .await;

    match rows {
        Ok(migs) if !migs.is_empty() => {
            info!("Applied migrations:");
            for mig in migs {
                let version: i64 = mig.try_get("version")?;
                let description: String = mig.try_get("description")?;
                let installed_on: Option<String> = mig.try_get("installed_on")?;
                let success: bool = mig.try_get("success")?;

                info!(
                    version,
                    success,
                    installed_on = installed_on.as_deref().unwrap_or("N/A"),
                    "  {}",
                    description
                );
            }
        },
        Ok(_) => {
            warn!("No migrations found in database (run `shopd db migrate` first)");
        },
        Err(e) => {
            // Table might not exist yet
            if e.to_string().contains("_sqlx_migrations") {
                warn!("Migration table not found (run `shopd db migrate` first)");
            } else {
                return Err(e.into());
            }
        },
    }

    Ok(())
}
