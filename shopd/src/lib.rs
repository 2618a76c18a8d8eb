//! Shop Daemon Library
//!
//! HTTP front end of the order engine.
//!
//! # Architecture
//!
//! ```text
//! HTTP → API (identity, ownership) → OrderService → Store (memory | PostgreSQL)
//! ```
//!
//! # Components
//!
//! - **Daemon**: Main runtime orchestrator
//! - **API**: HTTP endpoints for orders
//! - **Config**: Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use shopd::{Config, Daemon};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("Failed to load config");
//!     let daemon = Daemon::new_stub(config);
//!     daemon.run().await.expect("Daemon error");
//! }
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;

// Re-exports for convenience
pub use api::{create_router, ApiState, Caller, USER_ID_HEADER};
pub use config::{ApiConfig, Config, Environment, StoreConfig};
pub use daemon::Daemon;
pub use error::{DaemonError, DaemonResult};
