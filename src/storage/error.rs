//! Low-level database errors and their classification.
//!
//! Drivers report constraint violations through opaque, backend-specific
//! codes. [`DatabaseError`] keeps whatever the driver gave us (a vendor
//! error number, a five-character SQLSTATE, or both) so a dialect can match
//! it against its own table of duplicate-key codes.

use std::fmt;

/// Outcome of classifying a [`DatabaseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Primary-key or unique-constraint violation on `(key_, version_)`.
    DuplicateKey,
    /// Anything else.
    Other,
}

impl ErrorClass {
    /// Returns the class name as used in logs and CLI output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateKey => "duplicate-key",
            Self::Other => "other",
        }
    }

    /// Returns true for [`ErrorClass::DuplicateKey`].
    #[must_use]
    pub const fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error reported by a database driver or connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseError {
    vendor_code: Option<i32>,
    sql_state: Option<String>,
    message: String,
}

impl DatabaseError {
    /// Creates an error that carries no code (pool exhaustion, I/O, closed pool).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            vendor_code: None,
            sql_state: None,
            message: message.into(),
        }
    }

    /// Creates an error with a vendor-specific numeric code.
    pub fn with_vendor_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            vendor_code: Some(code),
            ..Self::new(message)
        }
    }

    /// Creates an error with a SQLSTATE code.
    pub fn with_sql_state(state: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sql_state: Some(state.into()),
            ..Self::new(message)
        }
    }

    /// Adds a SQLSTATE to an existing error.
    #[must_use]
    pub fn and_sql_state(mut self, state: impl Into<String>) -> Self {
        self.sql_state = Some(state.into());
        self
    }

    /// Vendor-specific numeric error code, if the driver reported one.
    #[must_use]
    pub const fn vendor_code(&self) -> Option<i32> {
        self.vendor_code
    }

    /// SQLSTATE code, if the driver reported one.
    #[must_use]
    pub fn sql_state(&self) -> Option<&str> {
        self.sql_state.as_deref()
    }

    /// Driver message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if either code of this error appears in the given tables.
    #[must_use]
    pub fn matches_any(&self, vendor_codes: &[i32], sql_states: &[&str]) -> bool {
        self.vendor_code.is_some_and(|c| vendor_codes.contains(&c))
            || self
                .sql_state
                .as_deref()
                .is_some_and(|s| sql_states.contains(&s))
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.vendor_code, self.sql_state.as_deref()) {
            (Some(code), Some(state)) => write!(f, "[{code}/{state}] {}", self.message),
            (Some(code), None) => write!(f, "[{code}] {}", self.message),
            (None, Some(state)) => write!(f, "[{state}] {}", self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for DatabaseError {}

impl From<rusqlite::Error> for DatabaseError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(inner, _) => {
                Self::with_vendor_code(inner.extended_code, e.to_string())
            },
            _ => Self::new(e.to_string()),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for DatabaseError {
    fn from(e: tokio_postgres::Error) -> Self {
        match e.code() {
            Some(state) => Self::with_sql_state(state.code(), e.to_string()),
            None => Self::new(e.to_string()),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<deadpool_postgres::PoolError> for DatabaseError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        match e {
            deadpool_postgres::PoolError::Backend(inner) => inner.into(),
            other => Self::new(format!("connection pool: {other}")),
        }
    }
}

#[cfg(feature = "mysql")]
impl From<mysql_async::Error> for DatabaseError {
    fn from(e: mysql_async::Error) -> Self {
        match &e {
            mysql_async::Error::Server(server) => {
                Self::with_vendor_code(i32::from(server.code), server.message.clone())
                    .and_sql_state(server.state.clone())
            },
            _ => Self::new(e.to_string()),
        }
    }
}
