//! Connection source trait.

use crate::storage::DatabaseError;

/// A single pooled database connection.
///
/// Implementations run exactly one statement per call and release any
/// statement handle or result cursor before returning, on success and on
/// error alike.
pub trait SqlConnection: Send {
    /// Runs a query and reports whether it produced at least one row.
    ///
    /// Only the first row is fetched; the cursor is closed before returning.
    fn query_has_rows(&mut self, sql: &str) -> Result<bool, DatabaseError>;

    /// Executes a statement that returns no rows.
    ///
    /// Returns the number of affected rows where the driver reports one.
    fn execute(&mut self, sql: &str) -> Result<u64, DatabaseError>;
}

/// A pool of database connections shared by every store of one backend.
///
/// Checkout and checkin discipline (max size, wait queues, timeouts) belongs
/// to the implementation. Callers go through
/// [`with_connection`](crate::storage::with_connection) so every checked-out
/// connection is handed back through [`ConnectionSource::release`].
pub trait ConnectionSource: Send + Sync {
    /// Connection type handed out by this source.
    type Connection: SqlConnection;

    /// Short backend label for logs and metrics (e.g. "postgres").
    fn backend_name(&self) -> &'static str;

    /// Checks a connection out of the pool.
    ///
    /// Fails once the source has been closed.
    fn checkout(&self) -> Result<Self::Connection, DatabaseError>;

    /// Returns a connection to the pool.
    ///
    /// A connection released after [`ConnectionSource::close`] is closed
    /// instead of pooled.
    fn release(&self, conn: Self::Connection) -> Result<(), DatabaseError>;

    /// Closes the pool and every idle connection it holds.
    fn close(&self) -> Result<(), DatabaseError>;

    /// Returns true once [`ConnectionSource::close`] has been called.
    fn is_closed(&self) -> bool;
}
