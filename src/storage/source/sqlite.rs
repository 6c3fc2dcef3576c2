//! `SQLite` connection source.
//!
//! `rusqlite` has no pool of its own, so the source keeps idle connections
//! in a mutex-guarded stack. Every connection is opened against the same
//! database file and configured for concurrent access.

use crate::storage::{ConnectionSource, DatabaseError, SqlConnection};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Default number of idle connections kept for reuse.
pub const DEFAULT_MAX_IDLE: usize = 8;

/// Busy timeout applied to every connection.
const BUSY_TIMEOUT_MS: &str = "5000";

/// A pooled `SQLite` connection.
pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    fn close(self) -> Result<(), DatabaseError> {
        self.conn.close().map_err(|(_, e)| DatabaseError::from(e))
    }
}

impl SqlConnection for SqliteConnection {
    fn query_has_rows(&mut self, sql: &str) -> Result<bool, DatabaseError> {
        let mut stmt = self.conn.prepare(sql)?;
        let has_rows = {
            let mut rows = stmt.query([])?;
            rows.next()?.is_some()
        };
        if let Err(e) = stmt.finalize() {
            tracing::warn!(error = %e, "Failed to finalize SQLite statement");
        }
        Ok(has_rows)
    }

    fn execute(&mut self, sql: &str) -> Result<u64, DatabaseError> {
        let affected = self.conn.execute(sql, [])?;
        Ok(affected as u64)
    }
}

/// Connection source over one `SQLite` database file.
pub struct SqliteSource {
    path: PathBuf,
    max_idle: usize,
    idle: Mutex<Vec<SqliteConnection>>,
    closed: AtomicBool,
}

impl SqliteSource {
    /// Creates a source for the database at `path`.
    ///
    /// Nothing is opened until the first checkout.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_max_idle(path, DEFAULT_MAX_IDLE)
    }

    /// Creates a source keeping at most `max_idle` idle connections.
    pub fn with_max_idle(path: impl Into<PathBuf>, max_idle: usize) -> Self {
        Self {
            path: path.into(),
            max_idle,
            idle: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Database file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of idle connections currently pooled.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        acquire_lock(&self.idle).len()
    }

    fn open(&self) -> Result<SqliteConnection, DatabaseError> {
        let conn = Connection::open(&self.path)?;
        configure_connection(&conn);
        tracing::debug!(path = %self.path.display(), "Opened SQLite connection");
        Ok(SqliteConnection { conn })
    }
}

impl ConnectionSource for SqliteSource {
    type Connection = SqliteConnection;

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn checkout(&self) -> Result<SqliteConnection, DatabaseError> {
        if self.is_closed() {
            return Err(DatabaseError::new("connection pool is closed"));
        }
        let pooled = acquire_lock(&self.idle).pop();
        match pooled {
            Some(conn) => Ok(conn),
            None => self.open(),
        }
    }

    fn release(&self, conn: SqliteConnection) -> Result<(), DatabaseError> {
        if !self.is_closed() {
            let mut idle = acquire_lock(&self.idle);
            if idle.len() < self.max_idle {
                idle.push(conn);
                return Ok(());
            }
        }
        conn.close()
    }

    fn close(&self) -> Result<(), DatabaseError> {
        self.closed.store(true, Ordering::Release);
        let drained: Vec<SqliteConnection> = acquire_lock(&self.idle).drain(..).collect();

        let mut first_error = None;
        for conn in drained {
            if let Err(e) = conn.close() {
                tracing::warn!(error = %e, "Failed to close idle SQLite connection");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Acquires the idle-list lock, recovering from poison.
///
/// The list only holds idle connections, so a panic elsewhere while it was
/// held cannot leave it inconsistent.
fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite pool mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Applies WAL journaling, NORMAL sync and a busy timeout.
///
/// Pragma failures are ignored: `journal_mode` returns a row and in-memory
/// databases refuse WAL, neither of which should block a checkout.
fn configure_connection(conn: &Connection) {
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS);
}
