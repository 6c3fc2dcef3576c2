//! PostgreSQL dialect.

use super::{Dialect, KEY_COLUMN, VALUE_COLUMN, VERSION_COLUMN};
use crate::models::BackendType;

/// SQLSTATE `unique_violation`.
pub const POSTGRES_ERR_DUP_KEY: &str = "23505";
/// `unique_violation` as a number, for callers that only carry numeric codes.
pub const POSTGRES_ERR_DUP_KEY_NUMERIC: i32 = 23505;

/// PostgreSQL dialect: `BYTEA` columns throughout.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    const BACKEND: BackendType = BackendType::Postgres;
    const DUPLICATE_VENDOR_CODES: &'static [i32] = &[POSTGRES_ERR_DUP_KEY_NUMERIC];
    const DUPLICATE_SQL_STATES: &'static [&'static str] = &[POSTGRES_ERR_DUP_KEY];

    /// Unquoted identifiers fold to lower case, so the catalog is searched
    /// for the lower-cased name.
    fn table_exists_sql(table: &str) -> String {
        format!(
            "SELECT tablename FROM pg_catalog.pg_tables WHERE tablename LIKE '{}'",
            table.to_lowercase()
        )
    }

    fn create_table_sql(table: &str) -> String {
        format!(
            "CREATE TABLE {table} ({KEY_COLUMN} BYTEA NOT NULL, {VERSION_COLUMN} BYTEA NOT NULL, \
             {VALUE_COLUMN} BYTEA, PRIMARY KEY ({KEY_COLUMN}, {VERSION_COLUMN}))"
        )
    }
}
