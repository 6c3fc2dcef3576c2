//! CLI command implementations.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `exists` | Probe whether a store's table exists |
//! | `create` | Create a store's table |
//! | `drop` | Drop a store's table |
//! | `ddl` | Print the DDL a dialect would run, without connecting |
//! | `classify` | Classify a driver error code as duplicate-key or other |
//!
//! # Example Usage
//!
//! ```bash
//! # Create the table for a store unless it is already there
//! sqlkv --config kv.toml create orders --if-missing
//!
//! # Show the MySQL DDL
//! sqlkv ddl orders --driver mysql
//!
//! # Is vendor code 1062 a duplicate key on MySQL?
//! sqlkv classify --driver mysql --vendor-code 1062
//! ```

mod inspect;
mod store;

pub use inspect::{classify, ddl};
pub use store::{CreateOutcome, create, drop_store, exists};

use crate::config::BackendConfig;
use crate::models::BackendType;
use crate::Result;
use std::path::Path;

/// Loads backend configuration for the CLI.
///
/// Reads `path` when given, otherwise starts from PostgreSQL defaults.
/// `SQLKV_*` environment overrides apply in both cases.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or an override is malformed.
pub fn load_config(path: Option<&Path>) -> Result<BackendConfig> {
    let config = match path {
        Some(path) => BackendConfig::load_from_file(path)?,
        None => BackendConfig::new(BackendType::default()),
    };
    config.with_env_overrides()
}
