//! Store table commands: `exists`, `create`, `drop`.
//!
//! # Usage
//!
//! ```bash
//! sqlkv exists orders
//! sqlkv create orders --if-missing
//! sqlkv drop orders
//! ```

use crate::Result;
use crate::storage::StorageConfiguration;

/// Result of a `create` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The table was created.
    Created,
    /// `--if-missing` was given and the table already existed.
    AlreadyExists,
}

/// Executes the `exists` command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the probe fails.
pub fn exists(backend: &dyn StorageConfiguration, store: &str) -> Result<bool> {
    backend.open_store(store)?.table_exists()
}

/// Executes the `create` command.
///
/// Without `if_missing` this runs the DDL unconditionally, so an existing
/// table is an error.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the probe fails or the DDL fails.
pub fn create(
    backend: &dyn StorageConfiguration,
    store: &str,
    if_missing: bool,
) -> Result<CreateOutcome> {
    let strategy = backend.open_store(store)?;
    if if_missing && strategy.table_exists()? {
        return Ok(CreateOutcome::AlreadyExists);
    }
    strategy.create_table()?;
    Ok(CreateOutcome::Created)
}

/// Executes the `drop` command.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or `DROP TABLE` fails.
pub fn drop_store(backend: &dyn StorageConfiguration, store: &str) -> Result<()> {
    backend.open_store(store)?.drop_table()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::storage::{SqliteBackend, SqliteSource};
    use tempfile::TempDir;

    fn backend(dir: &TempDir) -> SqliteBackend {
        SqliteBackend::new(SqliteSource::new(dir.path().join("kv.db")))
    }

    #[test]
    fn test_create_exists_drop() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);

        assert!(!exists(&backend, "orders").unwrap());
        assert_eq!(create(&backend, "orders", false).unwrap(), CreateOutcome::Created);
        assert!(exists(&backend, "orders").unwrap());
        drop_store(&backend, "orders").unwrap();
        assert!(!exists(&backend, "orders").unwrap());
    }

    #[test]
    fn test_create_if_missing() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);

        assert_eq!(create(&backend, "orders", true).unwrap(), CreateOutcome::Created);
        assert_eq!(
            create(&backend, "orders", true).unwrap(),
            CreateOutcome::AlreadyExists
        );
        assert!(matches!(
            create(&backend, "orders", false),
            Err(Error::PersistenceFailure { .. })
        ));
    }

    #[test]
    fn test_drop_missing_table_fails() {
        let dir = TempDir::new().unwrap();
        let backend = backend(&dir);

        assert!(matches!(
            drop_store(&backend, "missing"),
            Err(Error::PersistenceFailure { .. })
        ));
    }
}
