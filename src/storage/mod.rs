//! Storage layer.
//!
//! - **Traits**: [`DialectStrategy`], [`StorageConfiguration`], [`ConnectionSource`]
//! - **Dialects**: SQL text and duplicate-key code tables per backend
//! - **Sources**: pooled connections for `SQLite`, PostgreSQL and MySQL
//! - **Scoped acquisition**: [`with_connection`] releases on every exit path

// Allow significant_drop_tightening - dropping database connections slightly early
// provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

pub mod dialect;
mod error;
mod metrics;
mod rdbms;
mod scoped;
pub mod source;
pub mod traits;

pub use error::{DatabaseError, ErrorClass};
pub use metrics::record_operation_metrics;
pub use rdbms::{RdbmsBackend, RdbmsStrategy};
pub use scoped::{ScopedConnection, with_connection};
pub use source::SqliteSource;
pub use traits::{ConnectionSource, DialectStrategy, SqlConnection, StorageConfiguration};

#[cfg(feature = "mysql")]
pub use source::MysqlSource;
#[cfg(feature = "postgres")]
pub use source::PostgresSource;

/// `SQLite` backend.
pub type SqliteBackend = RdbmsBackend<dialect::SqliteDialect, SqliteSource>;

/// PostgreSQL backend.
#[cfg(feature = "postgres")]
pub type PostgresBackend = RdbmsBackend<dialect::PostgresDialect, PostgresSource>;

/// MySQL backend.
#[cfg(feature = "mysql")]
pub type MysqlBackend = RdbmsBackend<dialect::MysqlDialect, MysqlSource>;
