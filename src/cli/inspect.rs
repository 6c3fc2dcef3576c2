//! Offline commands: `ddl` and `classify`.
//!
//! Neither connects to a database.

use crate::models::BackendType;
use crate::storage::dialect::{classify_for, create_table_sql_for};
use crate::storage::{DatabaseError, ErrorClass};

/// Executes the `ddl` command.
#[must_use]
pub fn ddl(driver: BackendType, store: &str) -> String {
    create_table_sql_for(driver, store)
}

/// Executes the `classify` command.
#[must_use]
pub fn classify(
    driver: BackendType,
    vendor_code: Option<i32>,
    sql_state: Option<&str>,
) -> ErrorClass {
    let mut error = DatabaseError::new("classified from the command line");
    if let Some(code) = vendor_code {
        error = DatabaseError::with_vendor_code(code, error.message());
    }
    if let Some(state) = sql_state {
        error = error.and_sql_state(state);
    }
    classify_for(driver, &error)
}
