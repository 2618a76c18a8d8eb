//! Daemon: Main runtime orchestrator.
//!
//! The Daemon ties together:
//! - Store (in-memory, or PostgreSQL with the `postgres` feature)
//! - Order service (creation, queries, status updates)
//! - API Server (HTTP endpoints)
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Open the store
//! 3. Start API server
//! 4. Wait for SIGINT
//! 5. Shut down

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use shop_orders::OrderService;
use shop_store::{MemoryStore, Store};

use crate::api::{create_router, ApiState};
use crate::config::Config;
use crate::error::{DaemonError, DaemonResult};

// =============================================================================
// Daemon
// =============================================================================

/// The main shop daemon.
pub struct Daemon<S: Store + 'static> {
    /// Configuration
    config: Config,
    /// Order service shared with the API
    orders: OrderService<S>,
}

impl Daemon<MemoryStore> {
    /// Create a daemon backed by the in-memory store (for testing/development).
    pub fn new_stub(config: Config) -> Self {
        let store = Arc::new(MemoryStore::with_lock_timeout(config.store.lock_timeout));
        Self::new(config, store)
    }
}

#[cfg(feature = "postgres")]
impl Daemon<shop_store::PgStore> {
    /// Create a daemon backed by PostgreSQL at `config.store.database_url`.
    pub async fn connect(config: Config) -> DaemonResult<Self> {
        let url = config.store.database_url.clone().ok_or_else(|| {
            DaemonError::Config("DATABASE_URL is required for the PostgreSQL store".to_string())
        })?;

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.store.max_connections)
            .connect(&url)
            .await
            .map_err(shop_store::StoreError::from)?;

        info!(max_connections = config.store.max_connections, "Connected to PostgreSQL");

        let store = shop_store::PgStore::with_lock_timeout(pool, config.store.lock_timeout);
        Ok(Self::new(config, Arc::new(store)))
    }
}

impl<S: Store + 'static> Daemon<S> {
    /// Create a new daemon over the provided store.
    pub fn new(config: Config, store: Arc<S>) -> Self {
        Self {
            config,
            orders: OrderService::new(store),
        }
    }

    /// Order service used by the API.
    pub fn orders(&self) -> &OrderService<S> {
        &self.orders
    }

    /// Run the daemon.
    ///
    /// This method blocks until shutdown is requested (SIGINT).
    pub async fn run(self) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            lock_timeout_ms = self.config.store.lock_timeout.as_millis() as u64,
            "Starting shop daemon"
        );

        let api_addr = self.start_api_server().await?;
        info!(%api_addr, "API server started");

        tokio::signal::ctrl_c()
            .await
            .map_err(|e| DaemonError::Signal(e.to_string()))?;
        info!("Received shutdown signal");

        info!("Shutdown complete");
        Ok(())
    }

    /// Start the API server.
    async fn start_api_server(&self) -> DaemonResult<SocketAddr> {
        let state = Arc::new(ApiState {
            orders: self.orders.clone(),
        });
        let router = create_router(state);

        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);
        let listener = TcpListener::bind(&addr).await.map_err(|source| DaemonError::Bind {
            addr: addr.clone(),
            source,
        })?;

        let local_addr = listener
            .local_addr()
            .map_err(|source| DaemonError::Bind { addr, source })?;

        // Spawn the server task
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!(error = %e, "API server error");
            }
        });

        Ok(local_addr)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::USER_ID_HEADER;
    use rust_decimal_macros::dec;
    use shop_domain::{NewCustomer, NewProduct, Price};

    #[tokio::test]
    async fn test_daemon_stub_creation() {
        let daemon = Daemon::new_stub(Config::test());

        let orders = daemon.orders().get_orders_by_customer_id(1).await.unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_daemon_api_server_start() {
        let daemon = Daemon::new_stub(Config::test());

        let addr = daemon.start_api_server().await.unwrap();

        // Server should be running on a port
        assert!(addr.port() > 0);

        let client = reqwest::Client::new();
        let response = client.get(format!("http://{}/health", addr)).send().await.unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_order_over_http() {
        let daemon = Daemon::new_stub(Config::test());
        let store = daemon.orders().store().clone();
        let customer = NewCustomer {
            user_id: 3,
            first_name: "Frances".to_string(),
            last_name: "Allen".to_string(),
            phone_number: String::new(),
        };
        let customer_id = store.customers().insert(&customer).await.unwrap().id;
        let product = NewProduct::new("Atlas", "books", Price::new(dec!(24.00)).unwrap(), 2).unwrap();
        let product_id = store.products().insert(&product).await.unwrap().id;

        let addr = daemon.start_api_server().await.unwrap();
        let client = reqwest::Client::new();
        let body = serde_json::json!({
            "customer_id": customer_id,
            "status": "pending",
            "order_items": [{ "product_id": product_id, "quantity": 2 }]
        });

        let created = client
            .post(format!("http://{}/v1/orders", addr))
            .header(USER_ID_HEADER, "3")
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(created.status().as_u16(), 201);

        let rejected = client
            .post(format!("http://{}/v1/orders", addr))
            .header(USER_ID_HEADER, "3")
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(rejected.status().as_u16(), 409);

        let product = store.products().find_by_id(product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 0);
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = Config::test();
        config.api.port = taken.local_addr().unwrap().port();
        let daemon = Daemon::new_stub(config);

        let err = daemon.start_api_server().await.unwrap_err();
        assert!(matches!(err, DaemonError::Bind { .. }));
    }
}
