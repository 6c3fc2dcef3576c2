//! Dialect strategy trait.

use crate::models::BackendType;
use crate::storage::{DatabaseError, ErrorClass};
use crate::Result;

/// Per-store hooks the generic key-value engine delegates to a dialect.
///
/// A strategy is bound to one store name and one shared connection source.
/// It holds no connection between calls and every method is safe to call
/// concurrently.
///
/// The engine calls [`table_exists`](Self::table_exists) on first access and
/// [`create_table`](Self::create_table) only when the table is absent. When a
/// write fails with a driver error it asks
/// [`classify_error`](Self::classify_error): [`ErrorClass::DuplicateKey`]
/// becomes a version conflict, anything else a hard failure.
pub trait DialectStrategy: Send + Sync {
    /// Name of the store (and of its table).
    fn store_name(&self) -> &str;

    /// Backend type this strategy speaks.
    fn backend_type(&self) -> BackendType;

    /// Returns true if the store's table exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailure`](crate::Error::PersistenceFailure)
    /// if the probe cannot be executed. That is never a "table absent" signal.
    fn table_exists(&self) -> Result<bool>;

    /// Creates the store's table with the `(key_, version_, value_)` schema.
    ///
    /// Not idempotent: call [`table_exists`](Self::table_exists) first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailure`](crate::Error::PersistenceFailure)
    /// if the DDL fails, including when the table already exists.
    fn create_table(&self) -> Result<()>;

    /// Drops the store's table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailure`](crate::Error::PersistenceFailure)
    /// if the statement fails, including when the table does not exist.
    fn drop_table(&self) -> Result<()>;

    /// Classifies a driver error raised by a write against this store.
    ///
    /// Never fails: unrecognized codes are [`ErrorClass::Other`].
    fn classify_error(&self, error: &DatabaseError) -> ErrorClass;
}
