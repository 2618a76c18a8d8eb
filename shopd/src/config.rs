//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use std::env;
use std::str::FromStr;
use std::time::Duration;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Store configuration
    pub store: StoreConfig,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// PostgreSQL URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// Upper bound on waiting for a product row lock
    pub lock_timeout: Duration,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment (in-memory store)
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from a variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> DaemonResult<Self> {
        let environment = Self::load_environment(&var)?;
        let api = Self::load_api_config(&var)?;
        let store = Self::load_store_config(&var)?;

        Ok(Self {
            api,
            store,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            store: StoreConfig {
                database_url: None,
                max_connections: 2,
                lock_timeout: Duration::from_millis(500),
            },
            environment: Environment::Test,
        }
    }

    fn load_environment(var: &impl Fn(&str) -> Option<String>) -> DaemonResult<Environment> {
        let env_str = var("SHOP_ENV").unwrap_or_else(|| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DaemonError::Config(format!(
                "Invalid SHOP_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_api_config(var: &impl Fn(&str) -> Option<String>) -> DaemonResult<ApiConfig> {
        let host = var("SHOP_API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = Self::parse_var(var, "SHOP_API_PORT", 8080u16)?;

        Ok(ApiConfig { host, port })
    }

    fn load_store_config(var: &impl Fn(&str) -> Option<String>) -> DaemonResult<StoreConfig> {
        let database_url = var("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let max_connections = Self::parse_var(var, "SHOP_DB_MAX_CONNECTIONS", 10u32)?;
        let lock_timeout_ms = Self::parse_var(var, "SHOP_LOCK_TIMEOUT_MS", 5_000u64)?;

        if max_connections == 0 {
            return Err(DaemonError::Config(
                "SHOP_DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        if lock_timeout_ms == 0 {
            return Err(DaemonError::Config("SHOP_LOCK_TIMEOUT_MS must be positive".to_string()));
        }

        Ok(StoreConfig {
            database_url,
            max_connections,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
        })
    }

    fn parse_var<T: FromStr>(
        var: &impl Fn(&str) -> Option<String>,
        key: &str,
        default: T,
    ) -> DaemonResult<T> {
        match var(key) {
            Some(val) => val
                .trim()
                .parse()
                .map_err(|_| DaemonError::Config(format!("Invalid {} value: {}", key, val))),
            None => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            store: StoreConfig {
                database_url: None,
                max_connections: 10,
                lock_timeout: Duration::from_secs(5),
            },
            environment: Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
