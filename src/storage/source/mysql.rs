//! MySQL connection source over `mysql_async`.

use super::runtime::{DriverRuntime, block_on};
use crate::config::BackendConfig;
use crate::storage::{ConnectionSource, DatabaseError, SqlConnection};
use crate::{Error, Result};
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, Row};
use secrecy::ExposeSecret;
use std::sync::{Mutex, MutexGuard};
use tokio::runtime::Handle;

/// A pooled MySQL connection.
pub struct MysqlConnection {
    conn: Conn,
    handle: Handle,
}

impl SqlConnection for MysqlConnection {
    fn query_has_rows(&mut self, sql: &str) -> std::result::Result<bool, DatabaseError> {
        let conn = &mut self.conn;
        block_on(&self.handle, async move {
            conn.query_first::<Row, _>(sql)
                .await
                .map(|row| row.is_some())
                .map_err(DatabaseError::from)
        })
    }

    fn execute(&mut self, sql: &str) -> std::result::Result<u64, DatabaseError> {
        let conn = &mut self.conn;
        block_on(&self.handle, async move {
            conn.query_drop(sql).await.map_err(DatabaseError::from)?;
            Ok(conn.affected_rows())
        })
    }
}

/// Connection source backed by a `mysql_async` pool.
///
/// `mysql_async` disconnects a pool by value, so the pool sits in an
/// `Option` that [`ConnectionSource::close`] takes.
pub struct MysqlSource {
    pool: Mutex<Option<Pool>>,
    runtime: DriverRuntime,
}

impl MysqlSource {
    /// Builds the pool from configuration.
    ///
    /// Does not connect: an unreachable server surfaces on first checkout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationFailure`] if the connection URL cannot
    /// be parsed or the runtime cannot be started.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let opts = Self::build_opts(config)?;
        let runtime = DriverRuntime::new("mysql")
            .map_err(|e| Error::configuration("mysql_create_runtime", e))?;

        tracing::info!(
            host = %opts.ip_or_hostname(),
            database = opts.db_name().unwrap_or_default(),
            max_size = config.pool.max_size,
            "Created MySQL connection pool"
        );
        // The pool spawns its recycler on construction, so build it on the runtime.
        let pool = runtime.block_on(async move { Pool::new(opts) });
        Ok(Self {
            pool: Mutex::new(Some(pool)),
            runtime,
        })
    }

    /// Builds connection options from a URL or from discrete fields.
    fn build_opts(config: &BackendConfig) -> Result<Opts> {
        let builder = match config.url.as_deref() {
            Some(url) => {
                let opts =
                    Opts::from_url(url).map_err(|e| Error::configuration("mysql_parse_url", e))?;
                OptsBuilder::from_opts(opts)
            },
            None => OptsBuilder::default()
                .ip_or_hostname(config.host.clone())
                .tcp_port(config.port_or_default().unwrap_or(3306))
                .user(Some(config.username.clone()))
                .pass(Some(config.password.expose_secret().to_string()))
                .db_name(Some(config.database.clone())),
        };

        let max_size = config.pool.max_size.max(1);
        let constraints = PoolConstraints::new(0, max_size).ok_or_else(|| {
            Error::configuration("mysql_pool_constraints", format!("invalid max size {max_size}"))
        })?;
        let pool_opts = PoolOpts::default().with_constraints(constraints);

        Ok(builder.pool_opts(pool_opts).into())
    }

    fn pool(&self) -> MutexGuard<'_, Option<Pool>> {
        match self.pool.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("MySQL pool mutex was poisoned, recovering");
                poisoned.into_inner()
            },
        }
    }
}

impl ConnectionSource for MysqlSource {
    type Connection = MysqlConnection;

    fn backend_name(&self) -> &'static str {
        "mysql"
    }

    fn checkout(&self) -> std::result::Result<MysqlConnection, DatabaseError> {
        let pool = self
            .pool()
            .clone()
            .ok_or_else(|| DatabaseError::new("connection pool is closed"))?;
        let conn = self
            .runtime
            .block_on(pool.get_conn())
            .map_err(DatabaseError::from)?;
        Ok(MysqlConnection {
            conn,
            handle: self.runtime.handle().clone(),
        })
    }

    fn release(&self, conn: MysqlConnection) -> std::result::Result<(), DatabaseError> {
        // The connection returns itself to its pool on drop, which needs the
        // runtime; after close it is disconnected instead.
        let MysqlConnection { conn, handle } = conn;
        if self.is_closed() {
            return block_on(&handle, conn.disconnect()).map_err(DatabaseError::from);
        }
        block_on(&handle, async move { drop(conn) });
        Ok(())
    }

    fn close(&self) -> std::result::Result<(), DatabaseError> {
        let Some(pool) = self.pool().take() else {
            return Ok(());
        };
        self.runtime
            .block_on(pool.disconnect())
            .map_err(DatabaseError::from)
    }

    fn is_closed(&self) -> bool {
        self.pool().is_none()
    }
}
