//! Shop Daemon
//!
//! Order engine HTTP server and database lifecycle CLI.
//!
//! # Usage
//!
//! ```bash
//! # Start with the in-memory store
//! cargo run -p shopd
//!
//! # Start against PostgreSQL
//! DATABASE_URL=postgresql://localhost/shop cargo run -p shopd --features postgres
//!
//! # Database lifecycle
//! cargo run -p shopd --features postgres -- db migrate
//! cargo run -p shopd --features postgres -- db seed
//! ```
//!
//! # Environment Variables
//!
//! - `SHOP_ENV`: Environment (test, development, production)
//! - `SHOP_API_HOST`: API host (default: 0.0.0.0)
//! - `SHOP_API_PORT`: API port (default: 8080)
//! - `DATABASE_URL`: PostgreSQL URL (unset: in-memory store)
//! - `SHOP_DB_MAX_CONNECTIONS`: Pool size (default: 10)
//! - `SHOP_LOCK_TIMEOUT_MS`: Row-lock wait bound (default: 5000)

#[cfg(feature = "postgres")]
mod db;

use shopd::{Config, Daemon};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("shopd=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("db") {
        let _ = dotenvy::dotenv();
        return run_db(&args).await;
    }

    // Load configuration
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        "Shop Daemon"
    );

    run_daemon(config).await
}

#[cfg(feature = "postgres")]
async fn run_daemon(config: Config) -> anyhow::Result<()> {
    if config.store.database_url.is_some() {
        let daemon = Daemon::connect(config).await?;
        daemon.run().await?;
        return Ok(());
    }

    info!("Using in-memory store");
    Daemon::new_stub(config).run().await?;
    Ok(())
}

#[cfg(not(feature = "postgres"))]
async fn run_daemon(config: Config) -> anyhow::Result<()> {
    if config.store.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but shopd was built without `postgres`");
    }

    info!("Using in-memory store");
    Daemon::new_stub(config).run().await?;
    Ok(())
}

#[cfg(feature = "postgres")]
async fn run_db(args: &[String]) -> anyhow::Result<()> {
    db::run_db_command(args).await
}

#[cfg(not(feature = "postgres"))]
async fn run_db(_args: &[String]) -> anyhow::Result<()> {
    Err(anyhow::anyhow!("db commands need shopd built with `--features postgres`"))
}
