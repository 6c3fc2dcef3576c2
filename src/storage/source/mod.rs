//! Pooled connection sources, one per driver.
//!
//! `SQLite` is always available. PostgreSQL and MySQL sit behind the
//! `postgres` and `mysql` features; their async drivers run on a small
//! runtime owned by the source (see [`DriverRuntime`]).

mod sqlite;

pub use sqlite::{SqliteConnection, SqliteSource};

#[cfg(any(feature = "postgres", feature = "mysql"))]
mod runtime;
#[cfg(any(feature = "postgres", feature = "mysql"))]
pub use runtime::{DriverRuntime, block_on};

#[cfg(feature = "postgres")]
mod postgresql;
#[cfg(feature = "postgres")]
pub use postgresql::{PostgresConnection, PostgresSource};

#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "mysql")]
pub use mysql::{MysqlConnection, MysqlSource};
