//! PostgreSQL connection source over `deadpool-postgres`.

use super::runtime::{DriverRuntime, block_on};
use crate::config::BackendConfig;
use crate::storage::{ConnectionSource, DatabaseError, SqlConnection};
use crate::{Error, Result};
use deadpool_postgres::{
    Config, ManagerConfig, Object, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts,
};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_postgres::NoTls;

/// A pooled PostgreSQL client.
pub struct PostgresConnection {
    client: Object,
    handle: Handle,
}

impl SqlConnection for PostgresConnection {
    fn query_has_rows(&mut self, sql: &str) -> std::result::Result<bool, DatabaseError> {
        let client = &self.client;
        block_on(&self.handle, async move {
            client
                .query(sql, &[])
                .await
                .map(|rows| !rows.is_empty())
                .map_err(DatabaseError::from)
        })
    }

    fn execute(&mut self, sql: &str) -> std::result::Result<u64, DatabaseError> {
        let client = &self.client;
        block_on(&self.handle, async move {
            client.execute(sql, &[]).await.map_err(DatabaseError::from)
        })
    }
}

/// Connection source backed by a `deadpool-postgres` pool.
pub struct PostgresSource {
    pool: Pool,
    runtime: DriverRuntime,
}

impl PostgresSource {
    /// Builds the pool from configuration.
    ///
    /// Does not connect: an unreachable server surfaces on first checkout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationFailure`] if the connection URL cannot
    /// be parsed or the pool cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let cfg = match config.url.as_deref() {
            Some(url) => Self::build_pool_config_from_url(url, config)?,
            None => Self::build_pool_config(config),
        };

        let runtime = DriverRuntime::new("postgres")
            .map_err(|e| Error::configuration("postgres_create_runtime", e))?;
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| Error::configuration("postgres_create_pool", e))?;

        tracing::info!(
            host = cfg.host.as_deref().unwrap_or_default(),
            database = cfg.dbname.as_deref().unwrap_or_default(),
            max_size = config.pool.max_size,
            "Created PostgreSQL connection pool"
        );
        Ok(Self { pool, runtime })
    }

    /// Builds a deadpool config from discrete configuration fields.
    fn build_pool_config(config: &BackendConfig) -> Config {
        let mut cfg = Config::new();
        cfg.host = Some(config.host.clone());
        cfg.port = config.port_or_default();
        cfg.user = Some(config.username.clone());
        cfg.password = Some(config.password.expose_secret().to_string());
        cfg.dbname = Some(config.database.clone());
        Self::apply_pool_settings(&mut cfg, config);
        cfg
    }

    /// Builds a deadpool config from a `postgresql://` URL.
    fn build_pool_config_from_url(url: &str, config: &BackendConfig) -> Result<Config> {
        let parsed = url
            .parse::<tokio_postgres::Config>()
            .map_err(|e| Error::configuration("postgres_parse_url", e))?;

        let mut cfg = Config::new();
        cfg.host = parsed.get_hosts().first().map(host_to_string);
        cfg.port = parsed.get_ports().first().copied();
        cfg.user = parsed.get_user().map(String::from);
        cfg.password = parsed
            .get_password()
            .map(|p| String::from_utf8_lossy(p).to_string());
        cfg.dbname = parsed.get_dbname().map(String::from);
        Self::apply_pool_settings(&mut cfg, config);
        Ok(cfg)
    }

    /// Pool size and acquire/create/recycle timeouts.
    fn apply_pool_settings(cfg: &mut Config, config: &BackendConfig) {
        let timeout = Some(Duration::from_secs(config.pool.timeout_secs));
        cfg.pool = Some(PoolConfig {
            max_size: config.pool.max_size,
            timeouts: Timeouts {
                wait: timeout,
                create: timeout,
                recycle: timeout,
            },
            ..Default::default()
        });
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
    }

    /// Pool status: (connections in use or idle, idle).
    #[must_use]
    pub fn status(&self) -> (usize, usize) {
        let status = self.pool.status();
        (status.size, status.available)
    }
}

/// Extracts host string from tokio-postgres Host.
#[cfg(unix)]
fn host_to_string(h: &tokio_postgres::config::Host) -> String {
    match h {
        tokio_postgres::config::Host::Tcp(s) => s.clone(),
        tokio_postgres::config::Host::Unix(p) => p.to_string_lossy().to_string(),
    }
}

/// Extracts host string from tokio-postgres Host (Windows: Tcp only).
#[cfg(not(unix))]
fn host_to_string(h: &tokio_postgres::config::Host) -> String {
    let tokio_postgres::config::Host::Tcp(s) = h;
    s.clone()
}

impl ConnectionSource for PostgresSource {
    type Connection = PostgresConnection;

    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    fn checkout(&self) -> std::result::Result<PostgresConnection, DatabaseError> {
        let client = self.runtime.block_on(self.pool.get())?;
        Ok(PostgresConnection {
            client,
            handle: self.runtime.handle().clone(),
        })
    }

    fn release(&self, conn: PostgresConnection) -> std::result::Result<(), DatabaseError> {
        // Dropping the object hands it back to deadpool, or closes it once
        // the pool is closed.
        drop(conn);
        Ok(())
    }

    fn close(&self) -> std::result::Result<(), DatabaseError> {
        self.pool.close();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
