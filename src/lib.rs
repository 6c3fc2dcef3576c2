//! # sqlkv
//!
//! Dialect strategies and pooled backends that let a versioned key-value
//! storage engine run on relational databases.
//!
//! The engine itself (get/put/delete/scan over a `(key_, version_, value_)`
//! table) lives elsewhere. It hands three dialect-sensitive decisions to a
//! [`DialectStrategy`]:
//!
//! - whether the backing table already exists,
//! - the DDL to create it,
//! - whether a driver error is a duplicate primary-key violation.
//!
//! ## Features
//!
//! - MySQL, PostgreSQL and `SQLite` dialects with explicit error-code tables
//! - Pooled connection sources behind one [`ConnectionSource`] trait
//! - Scoped connection acquisition that releases on every exit path
//! - A backend factory that binds a backend type name to a strategy + pool
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlkv::config::BackendConfig;
//! use sqlkv::services::BackendFactory;
//!
//! let backend = BackendFactory::construct(&BackendConfig::load_from_file(path)?)?;
//! let store = backend.open_store("orders")?;
//! if !store.table_exists()? {
//!     store.create_table()?;
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod config;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::BackendConfig;
pub use models::{BackendType, StoreDefinition};
pub use services::BackendFactory;
pub use storage::{
    ConnectionSource, DatabaseError, DialectStrategy, ErrorClass, SqlConnection,
    StorageConfiguration,
};

/// Error type for sqlkv operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `PersistenceFailure` | Existence probe, DDL or checkout fails against the database |
/// | `ConfigurationFailure` | Pool construction/teardown fails, config is structurally invalid |
/// | `UnsupportedOperation` | Updating a store definition |
/// | `InvalidInput` | Unknown driver names, unreadable config files |
/// | `FeatureNotEnabled` | Using a driver compiled out by Cargo features |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A database operation failed.
    ///
    /// Raised when:
    /// - The table-existence probe cannot be executed
    /// - `CREATE TABLE` / `DROP TABLE` fails (including "already exists")
    /// - A connection cannot be checked out of the pool (including a closed pool)
    ///
    /// Always carries the driver error as its source.
    #[error("persistence failure in '{operation}': {source}")]
    PersistenceFailure {
        /// The operation that failed.
        operation: String,
        /// The underlying driver error.
        #[source]
        source: DatabaseError,
    },

    /// Connection pool construction or teardown failed.
    ///
    /// Raised when:
    /// - Host, database or port is missing or malformed
    /// - A connection URL cannot be parsed
    /// - The pool reports an error while closing
    /// - A store is opened on a backend that was already closed
    #[error("configuration failure in '{operation}': {cause}")]
    ConfigurationFailure {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The operation is permanently unsupported by this backend type.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Feature not enabled (requires feature flag).
    #[error("feature not enabled: {0} (compile with --features {0})")]
    FeatureNotEnabled(String),
}

impl Error {
    /// Wraps a driver error raised while running `operation`.
    pub fn persistence(operation: impl Into<String>, source: DatabaseError) -> Self {
        Self::PersistenceFailure {
            operation: operation.into(),
            source,
        }
    }

    /// Builds a configuration failure from any displayable cause.
    pub fn configuration(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::ConfigurationFailure {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for sqlkv operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedOperation("update".to_string());
        assert_eq!(err.to_string(), "unsupported operation: update");

        let err = Error::configuration("postgres_create_pool", "bad host");
        assert_eq!(
            err.to_string(),
            "configuration failure in 'postgres_create_pool': bad host"
        );

        let err = Error::FeatureNotEnabled("mysql".to_string());
        assert_eq!(
            err.to_string(),
            "feature not enabled: mysql (compile with --features mysql)"
        );
    }

    #[test]
    fn test_persistence_failure_keeps_driver_error() {
        let err = Error::persistence(
            "table_exists",
            DatabaseError::with_vendor_code(1146, "Table 'kv.orders' doesn't exist"),
        );

        let source = err.source().map(ToString::to_string).unwrap_or_default();
        assert!(source.contains("1146"));
        assert!(err.to_string().starts_with("persistence failure in 'table_exists'"));
    }
}
