//! Backend factory.
//!
//! Maps a configured driver to its dialect and pooled connection source:
//!
//! ```text
//! BackendFactory::construct(config)
//!   ├── sqlite   → SqliteBackend   (SqliteDialect + SqliteSource)
//!   ├── postgres → PostgresBackend (PostgresDialect + PostgresSource)   [feature "postgres"]
//!   └── mysql    → MysqlBackend    (MysqlDialect + MysqlSource)         [feature "mysql"]
//! ```

use crate::config::BackendConfig;
use crate::models::BackendType;
use crate::storage::{SqliteBackend, SqliteSource, StorageConfiguration};
use crate::{Error, Result};

/// Factory for creating storage backends.
///
/// # Example
///
/// ```rust,ignore
/// use sqlkv::config::BackendConfig;
/// use sqlkv::services::BackendFactory;
///
/// let backend = BackendFactory::construct(&BackendConfig::sqlite("kv.db"))?;
/// let orders = backend.open_store("orders")?;
/// ```
pub struct BackendFactory;

impl BackendFactory {
    /// Builds the pool for `config.driver` and wraps it in a backend.
    ///
    /// Validates the configuration first. Does not connect; the first
    /// checkout does.
    ///
    /// # Errors
    ///
    /// - [`Error::ConfigurationFailure`] for structurally invalid configuration
    /// - [`Error::FeatureNotEnabled`] for drivers compiled out of this build
    pub fn construct(config: &BackendConfig) -> Result<Box<dyn StorageConfiguration>> {
        config.validate()?;
        let backend: Box<dyn StorageConfiguration> = match config.driver {
            BackendType::Sqlite => Box::new(Self::create_sqlite(config)?),
            BackendType::Postgres => Self::create_postgres(config)?,
            BackendType::Mysql => Self::create_mysql(config)?,
        };
        tracing::info!(
            backend = config.driver.type_name(),
            max_size = config.pool.max_size,
            "Constructed storage backend"
        );
        Ok(backend)
    }

    /// Backend types compiled into this build.
    #[must_use]
    pub fn available() -> Vec<BackendType> {
        BackendType::all()
            .iter()
            .copied()
            .filter(|t| Self::is_available(*t))
            .collect()
    }

    /// Returns true if `backend` is compiled into this build.
    #[must_use]
    pub const fn is_available(backend: BackendType) -> bool {
        match backend {
            BackendType::Sqlite => true,
            BackendType::Postgres => cfg!(feature = "postgres"),
            BackendType::Mysql => cfg!(feature = "mysql"),
        }
    }

    fn create_sqlite(config: &BackendConfig) -> Result<SqliteBackend> {
        let path = config.sqlite_path.as_ref().ok_or_else(|| {
            Error::configuration("sqlite_create_pool", "sqlite_path is required")
        })?;
        Ok(SqliteBackend::new(SqliteSource::with_max_idle(
            path,
            config.pool.max_size,
        )))
    }

    #[cfg(feature = "postgres")]
    fn create_postgres(config: &BackendConfig) -> Result<Box<dyn StorageConfiguration>> {
        use crate::storage::{PostgresBackend, PostgresSource};

        Ok(Box::new(PostgresBackend::new(PostgresSource::new(config)?)))
    }

    #[cfg(not(feature = "postgres"))]
    fn create_postgres(_config: &BackendConfig) -> Result<Box<dyn StorageConfiguration>> {
        Err(Error::FeatureNotEnabled("postgres".to_string()))
    }

    #[cfg(feature = "mysql")]
    fn create_mysql(config: &BackendConfig) -> Result<Box<dyn StorageConfiguration>> {
        use crate::storage::{MysqlBackend, MysqlSource};

        Ok(Box::new(MysqlBackend::new(MysqlSource::new(config)?)))
    }

    #[cfg(not(feature = "mysql"))]
    fn create_mysql(_config: &BackendConfig) -> Result<Box<dyn StorageConfiguration>> {
        Err(Error::FeatureNotEnabled("mysql".to_string()))
    }
}
