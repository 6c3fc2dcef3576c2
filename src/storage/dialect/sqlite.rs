//! `SQLite` dialect.

use super::{Dialect, KEY_COLUMN, VALUE_COLUMN, VERSION_COLUMN};
use crate::models::BackendType;

/// `SQLITE_CONSTRAINT_PRIMARYKEY` extended result code.
pub const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
/// `SQLITE_CONSTRAINT_UNIQUE` extended result code.
pub const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

/// `SQLite` dialect: `BLOB` columns, lengths are not enforced by the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    const BACKEND: BackendType = BackendType::Sqlite;
    const DUPLICATE_VENDOR_CODES: &'static [i32] =
        &[SQLITE_CONSTRAINT_PRIMARYKEY, SQLITE_CONSTRAINT_UNIQUE];
    const DUPLICATE_SQL_STATES: &'static [&'static str] = &[];

    fn table_exists_sql(table: &str) -> String {
        format!(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = '{table}' COLLATE NOCASE"
        )
    }

    fn create_table_sql(table: &str) -> String {
        format!(
            "CREATE TABLE {table} ({KEY_COLUMN} BLOB NOT NULL, {VERSION_COLUMN} BLOB NOT NULL, \
             {VALUE_COLUMN} BLOB, PRIMARY KEY ({KEY_COLUMN}, {VERSION_COLUMN}))"
        )
    }
}
