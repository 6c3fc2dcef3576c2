//! SQL dialects.
//!
//! A [`Dialect`] is a zero-sized marker type carrying everything that
//! differs between backends: the existence probe, the DDL and the table of
//! error codes that mean "duplicate key". All three are plain functions of
//! the store name, so they can be checked without a database.
//!
//! | Dialect | Duplicate-key codes |
//! |---------|---------------------|
//! | [`MysqlDialect`] | vendor 1022 `ER_DUP_KEY`, 1062 `ER_DUP_ENTRY` |
//! | [`PostgresDialect`] | SQLSTATE `23505` `unique_violation` |
//! | [`SqliteDialect`] | extended 1555 `SQLITE_CONSTRAINT_PRIMARYKEY`, 2067 `SQLITE_CONSTRAINT_UNIQUE` |

mod mysql;
mod postgresql;
mod sqlite;

pub use mysql::MysqlDialect;
pub use postgresql::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::models::BackendType;
use crate::storage::{DatabaseError, ErrorClass};

/// Key column name.
pub const KEY_COLUMN: &str = "key_";
/// Version column name.
pub const VERSION_COLUMN: &str = "version_";
/// Value column name (NULL is a tombstone).
pub const VALUE_COLUMN: &str = "value_";
/// Maximum length in bytes of the bounded key and version columns.
pub const MAX_KEY_LENGTH: usize = 200;

/// Backend-specific SQL text and error-code tables.
pub trait Dialect: Send + Sync + 'static {
    /// Backend this dialect belongs to.
    const BACKEND: BackendType;

    /// Vendor error numbers that mean "duplicate key".
    const DUPLICATE_VENDOR_CODES: &'static [i32];

    /// SQLSTATE codes that mean "duplicate key".
    const DUPLICATE_SQL_STATES: &'static [&'static str];

    /// Query returning at least one row iff `table` exists.
    fn table_exists_sql(table: &str) -> String;

    /// DDL creating `table` with the key/version/value schema.
    fn create_table_sql(table: &str) -> String;

    /// Statement dropping `table`.
    fn drop_table_sql(table: &str) -> String {
        format!("DROP TABLE {table}")
    }

    /// Classifies a driver error against this dialect's code tables.
    fn classify(error: &DatabaseError) -> ErrorClass {
        if error.matches_any(Self::DUPLICATE_VENDOR_CODES, Self::DUPLICATE_SQL_STATES) {
            ErrorClass::DuplicateKey
        } else {
            ErrorClass::Other
        }
    }
}

/// Classifies `error` with the dialect of `backend`.
#[must_use]
pub fn classify_for(backend: BackendType, error: &DatabaseError) -> ErrorClass {
    match backend {
        BackendType::Mysql => MysqlDialect::classify(error),
        BackendType::Postgres => PostgresDialect::classify(error),
        BackendType::Sqlite => SqliteDialect::classify(error),
    }
}

/// Returns the DDL `backend` would run to create `table`.
#[must_use]
pub fn create_table_sql_for(backend: BackendType, table: &str) -> String {
    match backend {
        BackendType::Mysql => MysqlDialect::create_table_sql(table),
        BackendType::Postgres => PostgresDialect::create_table_sql(table),
        BackendType::Sqlite => SqliteDialect::create_table_sql(table),
    }
}
