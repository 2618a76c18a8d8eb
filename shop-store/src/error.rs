//! Storage layer errors

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity (product, customer, order)
        entity_type: String,
        /// Entity ID
        id: String,
    },

    /// Waited too long for a row lock held by another unit of work
    #[error("Lock wait timeout: {entity_type} with id {id}")]
    LockTimeout {
        /// Type of the locked entity
        entity_type: String,
        /// Entity ID
        id: String,
    },

    /// Deadlock or serialization failure detected by the database
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// A store-level constraint rejected the write (e.g. negative stock)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Deserialization error (row could not be mapped to a domain type)
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Create a lock timeout error
    pub fn lock_timeout(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::LockTimeout {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Whether retrying the whole operation may succeed.
    ///
    /// Lock timeouts, deadlocks/serialization failures and connectivity
    /// problems are transient; everything else is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::LockTimeout { .. } | StoreError::Conflict(_) | StoreError::Connection(_)
        )
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound {
                entity_type: "unknown".to_string(),
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // lock_not_available (lock_timeout expired)
                Some("55P03") => StoreError::LockTimeout {
                    entity_type: "unknown".to_string(),
                    id: "unknown".to_string(),
                },
                // serialization_failure, deadlock_detected
                Some("40001") | Some("40P01") => StoreError::Conflict(db_err.to_string()),
                // foreign_key_violation
                Some("23503") => StoreError::NotFound {
                    entity_type: db_err.constraint().unwrap_or("reference").to_string(),
                    id: "unknown".to_string(),
                },
                // check_violation, unique_violation
                Some("23514") | Some("23505") => StoreError::ConstraintViolation(db_err.to_string()),
                _ => StoreError::Database(db_err.to_string()),
            },
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Connection(err.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Deserialization(err.to_string())
            },
            _ => StoreError::Database(err.to_string()),
        }
    }
}
