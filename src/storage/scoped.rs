//! Scoped connection acquisition.
//!
//! Every hook that touches the database goes through [`with_connection`].
//! The checked-out connection lives in a [`ScopedConnection`] guard whose
//! `Drop` hands it back to the source, so the connection is released on
//! normal return, on `?` early return and on unwind. Statement and cursor
//! handles are scoped inside the [`SqlConnection`] call and are gone before
//! the guard drops.
//!
//! A failing release is logged and counted but never replaces the result
//! of the operation that used the connection.

use crate::storage::{ConnectionSource, DatabaseError};
use std::ops::{Deref, DerefMut};

/// A connection checked out of a [`ConnectionSource`], released on drop.
pub struct ScopedConnection<'a, S: ConnectionSource + ?Sized> {
    source: &'a S,
    operation: &'static str,
    conn: Option<S::Connection>,
}

impl<'a, S: ConnectionSource + ?Sized> ScopedConnection<'a, S> {
    /// Checks a connection out of `source` for `operation`.
    ///
    /// # Errors
    ///
    /// Returns the source's error if no connection can be checked out.
    pub fn acquire(source: &'a S, operation: &'static str) -> Result<Self, DatabaseError> {
        let conn = source.checkout()?;
        Ok(Self {
            source,
            operation,
            conn: Some(conn),
        })
    }
}

impl<S: ConnectionSource + ?Sized> Deref for ScopedConnection<'_, S> {
    type Target = S::Connection;

    #[allow(clippy::expect_used)]
    fn deref(&self) -> &Self::Target {
        // Only `Drop` takes the connection out.
        self.conn.as_ref().expect("connection already released")
    }
}

impl<S: ConnectionSource + ?Sized> DerefMut for ScopedConnection<'_, S> {
    #[allow(clippy::expect_used)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("connection already released")
    }
}

impl<S: ConnectionSource + ?Sized> Drop for ScopedConnection<'_, S> {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if let Err(e) = self.source.release(conn) {
            tracing::warn!(
                backend = self.source.backend_name(),
                operation = self.operation,
                error = %e,
                "Failed to release connection"
            );
            metrics::counter!(
                "storage_connection_release_failures_total",
                "backend" => self.source.backend_name(),
                "operation" => self.operation
            )
            .increment(1);
        }
    }
}

/// Runs `f` on a connection checked out of `source`, releasing it afterwards.
///
/// # Errors
///
/// Returns the checkout error, or whatever `f` returns.
///
/// # Examples
///
/// ```rust,ignore
/// use sqlkv::storage::{SqlConnection, with_connection};
///
/// let exists = with_connection(&source, "table_exists", |conn| {
///     conn.query_has_rows("SHOW TABLES LIKE 'orders'")
/// })?;
/// ```
pub fn with_connection<S, T, F>(
    source: &S,
    operation: &'static str,
    f: F,
) -> Result<T, DatabaseError>
where
    S: ConnectionSource + ?Sized,
    F: FnOnce(&mut S::Connection) -> Result<T, DatabaseError>,
{
    let mut conn = ScopedConnection::acquire(source, operation)?;
    f(&mut conn)
}
