//! MySQL dialect.

use super::{Dialect, KEY_COLUMN, MAX_KEY_LENGTH, VALUE_COLUMN, VERSION_COLUMN};
use crate::models::BackendType;

/// `ER_DUP_KEY`: "Can't write; duplicate key in table".
pub const MYSQL_ERR_DUP_KEY: i32 = 1022;
/// `ER_DUP_ENTRY`: "Duplicate entry for key".
pub const MYSQL_ERR_DUP_ENTRY: i32 = 1062;

/// MySQL dialect: `InnoDB` table with `VARBINARY` key/version and a `BLOB` value.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl Dialect for MysqlDialect {
    const BACKEND: BackendType = BackendType::Mysql;
    const DUPLICATE_VENDOR_CODES: &'static [i32] = &[MYSQL_ERR_DUP_KEY, MYSQL_ERR_DUP_ENTRY];
    const DUPLICATE_SQL_STATES: &'static [&'static str] = &[];

    fn table_exists_sql(table: &str) -> String {
        format!("SHOW TABLES LIKE '{table}'")
    }

    fn create_table_sql(table: &str) -> String {
        format!(
            "CREATE TABLE {table} ({KEY_COLUMN} VARBINARY({MAX_KEY_LENGTH}) NOT NULL, \
             {VERSION_COLUMN} VARBINARY({MAX_KEY_LENGTH}) NOT NULL, {VALUE_COLUMN} BLOB, \
             PRIMARY KEY ({KEY_COLUMN}, {VERSION_COLUMN})) ENGINE = InnoDB"
        )
    }
}
