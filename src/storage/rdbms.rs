//! Relational strategy and backend built from a [`Dialect`] and a [`ConnectionSource`].

use crate::models::{BackendType, StoreDefinition, is_plain_identifier};
use crate::storage::dialect::Dialect;
use crate::storage::metrics::record_operation_metrics;
use crate::storage::{
    ConnectionSource, DatabaseError, DialectStrategy, ErrorClass, SqlConnection,
    StorageConfiguration, with_connection,
};
use crate::{Error, Result};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Dialect strategy for one store on one shared connection source.
pub struct RdbmsStrategy<D: Dialect, S: ConnectionSource> {
    name: String,
    source: Arc<S>,
    dialect: PhantomData<fn() -> D>,
}

impl<D: Dialect, S: ConnectionSource> RdbmsStrategy<D, S> {
    /// Binds a strategy to `name` and `source`.
    pub fn new(name: impl Into<String>, source: Arc<S>) -> Self {
        Self {
            name: name.into(),
            source,
            dialect: PhantomData,
        }
    }

    /// Shared connection source.
    #[must_use]
    pub const fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Runs one statement on a scoped connection, recording metrics and
    /// wrapping driver errors as persistence failures.
    fn run<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut S::Connection) -> std::result::Result<T, DatabaseError>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = with_connection(self.source.as_ref(), operation, f);
        let status = if result.is_ok() { "success" } else { "error" };
        record_operation_metrics(D::BACKEND.type_name(), operation, start, status);

        result.map_err(|e| {
            tracing::debug!(
                backend = D::BACKEND.type_name(),
                store = %self.name,
                operation,
                error = %e,
                "Storage operation failed"
            );
            Error::persistence(operation, e)
        })
    }
}

impl<D: Dialect, S: ConnectionSource> DialectStrategy for RdbmsStrategy<D, S> {
    fn store_name(&self) -> &str {
        &self.name
    }

    fn backend_type(&self) -> BackendType {
        D::BACKEND
    }

    fn table_exists(&self) -> Result<bool> {
        let sql = D::table_exists_sql(&self.name);
        let exists = self.run("table_exists", |conn| conn.query_has_rows(&sql))?;
        tracing::debug!(
            backend = D::BACKEND.type_name(),
            store = %self.name,
            exists,
            "Probed table existence"
        );
        Ok(exists)
    }

    fn create_table(&self) -> Result<()> {
        let sql = D::create_table_sql(&self.name);
        self.run("create_table", |conn| conn.execute(&sql))?;
        tracing::info!(
            backend = D::BACKEND.type_name(),
            store = %self.name,
            "Created store table"
        );
        Ok(())
    }

    fn drop_table(&self) -> Result<()> {
        let sql = D::drop_table_sql(&self.name);
        self.run("drop_table", |conn| conn.execute(&sql))?;
        tracing::info!(
            backend = D::BACKEND.type_name(),
            store = %self.name,
            "Dropped store table"
        );
        Ok(())
    }

    fn classify_error(&self, error: &DatabaseError) -> ErrorClass {
        D::classify(error)
    }
}

/// A configured relational backend: one shared pool, one dialect.
///
/// Owns the pool exclusively. Strategies handed out by
/// [`open_store`](StorageConfiguration::open_store) share it through an
/// `Arc` but never close it.
pub struct RdbmsBackend<D: Dialect, S: ConnectionSource> {
    source: Arc<S>,
    closed: AtomicBool,
    dialect: PhantomData<fn() -> D>,
}

impl<D: Dialect, S: ConnectionSource + 'static> RdbmsBackend<D, S> {
    /// Wraps an already-constructed connection source.
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            closed: AtomicBool::new(false),
            dialect: PhantomData,
        }
    }

    /// Shared connection source.
    #[must_use]
    pub const fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Returns a strategy built by `ctor` from the store name and the shared source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationFailure`] after [`close`](StorageConfiguration::close).
    pub fn open_store_with<F>(&self, name: &str, ctor: F) -> Result<Arc<dyn DialectStrategy>>
    where
        F: FnOnce(String, Arc<S>) -> Arc<dyn DialectStrategy>,
    {
        if self.closed.load(Ordering::Acquire) || self.source.is_closed() {
            return Err(Error::configuration(
                "open_store",
                format!("{} backend is closed", D::BACKEND),
            ));
        }
        if !is_plain_identifier(name) {
            tracing::warn!(
                backend = D::BACKEND.type_name(),
                store = name,
                "Store name is not a plain SQL identifier and is interpolated unescaped"
            );
        }
        tracing::debug!(backend = D::BACKEND.type_name(), store = name, "Opened store");
        Ok(ctor(name.to_string(), Arc::clone(&self.source)))
    }
}

impl<D: Dialect, S: ConnectionSource + 'static> StorageConfiguration for RdbmsBackend<D, S> {
    fn backend_type(&self) -> BackendType {
        D::BACKEND
    }

    fn open_store(&self, name: &str) -> Result<Arc<dyn DialectStrategy>> {
        self.open_store_with(name, |name, source| {
            Arc::new(RdbmsStrategy::<D, S>::new(name, source))
        })
    }

    // Nothing to do: strategies are not tracked and share one pool.
    fn remove_store(&self, _name: &str) {}

    fn update(&self, definition: &StoreDefinition) -> Result<()> {
        Err(Error::UnsupportedOperation(format!(
            "store definition updates are not permitted for the {} backend (store '{}')",
            D::BACKEND,
            definition.name
        )))
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(backend = D::BACKEND.type_name(), "Backend already closed");
            return Ok(());
        }
        self.source
            .close()
            .map_err(|e| Error::configuration("close_connection_pool", e))?;
        tracing::info!(backend = D::BACKEND.type_name(), "Closed connection pool");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::dialect::MysqlDialect;
    use std::error::Error as _;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    /// Scripted connection: answers queries from a shared script and logs SQL.
    struct ScriptedConnection {
        log: Arc<Mutex<Vec<String>>>,
        result: std::result::Result<bool, DatabaseError>,
    }

    impl SqlConnection for ScriptedConnection {
        fn query_has_rows(&mut self, sql: &str) -> std::result::Result<bool, DatabaseError> {
            self.log.lock().unwrap().push(sql.to_string());
            self.result.clone()
        }

        fn execute(&mut self, sql: &str) -> std::result::Result<u64, DatabaseError> {
            self.log.lock().unwrap().push(sql.to_string());
            self.result.clone().map(|_| 0)
        }
    }

    struct ScriptedSource {
        log: Arc<Mutex<Vec<String>>>,
        result: std::result::Result<bool, DatabaseError>,
        outstanding: AtomicUsize,
        closed: AtomicBool,
        close_calls: AtomicUsize,
        close_result: std::result::Result<(), DatabaseError>,
    }

    impl ScriptedSource {
        fn new(result: std::result::Result<bool, DatabaseError>) -> Self {
            Self {
                log: Arc::default(),
                result,
                outstanding: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                close_calls: AtomicUsize::new(0),
                close_result: Ok(()),
            }
        }
    }

    impl ConnectionSource for ScriptedSource {
        type Connection = ScriptedConnection;

        fn backend_name(&self) -> &'static str {
            "scripted"
        }

        fn checkout(&self) -> std::result::Result<ScriptedConnection, DatabaseError> {
            if self.closed.load(Ordering::SeqCst) {
                return Err(DatabaseError::new("pool closed"));
            }
            self.outstanding.fetch_add(1, Ordering::SeqCst);
            Ok(ScriptedConnection {
                log: Arc::clone(&self.log),
                result: self.result.clone(),
            })
        }

        fn release(&self, _conn: ScriptedConnection) -> std::result::Result<(), DatabaseError> {
            self.outstanding.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }

        fn close(&self) -> std::result::Result<(), DatabaseError> {
            self.close_calls.fetch_add(1, Ordering::SeqCst);
            self.closed.store(true, Ordering::SeqCst);
            self.close_result.clone()
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    type MysqlScripted = RdbmsBackend<MysqlDialect, ScriptedSource>;

    #[test]
    fn test_table_exists_runs_dialect_probe() {
        let backend = MysqlScripted::new(ScriptedSource::new(Ok(false)));
        let store = backend.open_store("orders").unwrap();

        assert!(!store.table_exists().unwrap());
        assert_eq!(store.store_name(), "orders");
        assert_eq!(store.backend_type(), BackendType::Mysql);
        assert_eq!(
            backend.source().log.lock().unwrap().as_slice(),
            ["SHOW TABLES LIKE 'orders'"]
        );
        assert_eq!(backend.source().outstanding.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_probe_failure_is_persistence_failure() {
        let driver_error = DatabaseError::with_vendor_code(2013, "Lost connection");
        let backend = MysqlScripted::new(ScriptedSource::new(Err(driver_error.clone())));
        let store = backend.open_store("orders").unwrap();

        let err = store.table_exists().unwrap_err();
        assert!(matches!(
            &err,
            Error::PersistenceFailure { operation, source }
                if operation == "table_exists" && *source == driver_error
        ));
        assert!(err.source().is_some());
        assert_eq!(backend.source().outstanding.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_create_and_drop_run_dialect_ddl() {
        let backend = MysqlScripted::new(ScriptedSource::new(Ok(true)));
        let store = backend.open_store("orders").unwrap();

        store.create_table().unwrap();
        store.drop_table().unwrap();

        let log = backend.source().log.lock().unwrap().clone();
        assert_eq!(log[0], MysqlDialect::create_table_sql("orders"));
        assert_eq!(log[1], "DROP TABLE orders");
    }

    #[test]
    fn test_classify_error_uses_dialect_table() {
        let backend = MysqlScripted::new(ScriptedSource::new(Ok(true)));
        let store = backend.open_store("orders").unwrap();

        let dup = DatabaseError::with_vendor_code(1062, "Duplicate entry");
        let other = DatabaseError::with_vendor_code(1213, "Deadlock found");
        assert_eq!(store.classify_error(&dup), ErrorClass::DuplicateKey);
        assert_eq!(store.classify_error(&other), ErrorClass::Other);
    }

    #[test]
    fn test_update_always_fails() {
        let backend = MysqlScripted::new(ScriptedSource::new(Ok(true)));
        let definition = StoreDefinition::new("orders", BackendType::Mysql);

        let err = backend.update(&definition).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));
        // Still unsupported on a second attempt and for other definitions.
        let other = StoreDefinition::new("users", BackendType::Postgres);
        assert!(matches!(
            backend.update(&other),
            Err(Error::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_close_then_open_store_fails() {
        let backend = MysqlScripted::new(ScriptedSource::new(Ok(true)));
        let store = backend.open_store("orders").unwrap();

        backend.close().unwrap();

        assert!(matches!(
            backend.open_store("orders"),
            Err(Error::ConfigurationFailure { .. })
        ));
        // Strategies opened before close cannot reach stale connections.
        assert!(matches!(
            store.table_exists(),
            Err(Error::PersistenceFailure { .. })
        ));
    }

    #[test]
    fn test_second_close_is_noop() {
        let backend = MysqlScripted::new(ScriptedSource::new(Ok(true)));
        backend.close().unwrap();
        backend.close().unwrap();
        assert_eq!(backend.source().close_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_failure_is_configuration_failure() {
        let mut source = ScriptedSource::new(Ok(true));
        source.close_result = Err(DatabaseError::new("socket reset"));
        let backend = MysqlScripted::new(source);

        let err = backend.close().unwrap_err();
        assert!(matches!(
            err,
            Error::ConfigurationFailure { ref operation, ref cause }
                if operation == "close_connection_pool" && cause.contains("socket reset")
        ));
    }

    #[test]
    fn test_remove_store_is_noop() {
        let backend = MysqlScripted::new(ScriptedSource::new(Ok(true)));
        let store = backend.open_store("orders").unwrap();
        backend.remove_store("orders");
        assert!(store.table_exists().unwrap());
        assert!(!backend.source().is_closed());
    }

    #[test]
    fn test_open_store_with_custom_constructor() {
        let backend = MysqlScripted::new(ScriptedSource::new(Ok(true)));
        let store = backend
            .open_store_with("Orders", |name, source| {
                Arc::new(RdbmsStrategy::<MysqlDialect, _>::new(name.to_lowercase(), source))
            })
            .unwrap();
        assert_eq!(store.store_name(), "orders");
    }

    #[test]
    fn test_unusual_store_name_is_accepted() {
        let backend = MysqlScripted::new(ScriptedSource::new(Ok(false)));
        let store = backend.open_store("my-store").unwrap();
        assert!(!store.table_exists().unwrap());
        assert_eq!(
            backend.source().log.lock().unwrap().as_slice(),
            ["SHOW TABLES LIKE 'my-store'"]
        );
    }
}
