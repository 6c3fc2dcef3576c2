//! Configuration management.
//!
//! A backend is described by a `[backend]` table in a TOML file, optionally
//! overridden by `SQLKV_*` environment variables:
//!
//! ```toml
//! [backend]
//! driver = "postgres"
//! host = "db.internal"
//! port = 5432
//! database = "kv"
//! username = "kv"
//! password = "${KV_DB_PASSWORD}"
//!
//! [backend.pool]
//! max_size = 20
//! timeout_secs = 5
//! ```
//!
//! String values support `${VAR}` expansion. A `url` entry
//! (`postgresql://...`, `mysql://...`) takes precedence over the discrete
//! connection fields.

use crate::models::BackendType;
use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default maximum connections in a pool.
pub const DEFAULT_POOL_MAX_SIZE: usize = 20;

/// Default acquire/create/recycle timeout in seconds.
pub const DEFAULT_POOL_TIMEOUT_SECS: u64 = 5;

/// Connection pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Maximum connections in the pool.
    pub max_size: usize,
    /// Timeout for waiting on, creating and recycling a connection.
    pub timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_POOL_MAX_SIZE,
            timeout_secs: DEFAULT_POOL_TIMEOUT_SECS,
        }
    }
}

/// Connection configuration for one backend instance.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Driver / backend type.
    pub driver: BackendType,
    /// Server host name or address.
    pub host: String,
    /// Server port; the driver default is used when unset.
    pub port: Option<u16>,
    /// Database name.
    pub database: String,
    /// User name.
    pub username: String,
    /// Password.
    pub password: SecretString,
    /// Full connection URL, preferred over the discrete fields when set.
    pub url: Option<String>,
    /// Database file for the `SQLite` driver.
    pub sqlite_path: Option<PathBuf>,
    /// Pool sizing.
    pub pool: PoolSettings,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Backend section.
    pub backend: Option<ConfigFileBackend>,
}

/// Backend section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileBackend {
    /// Driver name.
    pub driver: Option<String>,
    /// Host.
    pub host: Option<String>,
    /// Port.
    pub port: Option<u16>,
    /// Database name.
    pub database: Option<String>,
    /// User name.
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Connection URL.
    pub url: Option<String>,
    /// `SQLite` database path.
    pub sqlite_path: Option<String>,
    /// Pool section.
    pub pool: Option<ConfigFilePool>,
}

/// Pool section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFilePool {
    /// Maximum connections.
    pub max_size: Option<usize>,
    /// Timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl BackendConfig {
    /// Creates an empty configuration for `driver` with `localhost` and default pool settings.
    #[must_use]
    pub fn new(driver: BackendType) -> Self {
        Self {
            driver,
            host: "localhost".to_string(),
            port: None,
            database: String::new(),
            username: String::new(),
            password: SecretString::from(String::new()),
            url: None,
            sqlite_path: None,
            pool: PoolSettings::default(),
        }
    }

    /// Creates a `SQLite` configuration for the database file at `path`.
    #[must_use]
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            sqlite_path: Some(path.into()),
            ..Self::new(BackendType::Sqlite)
        }
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or has no
    /// usable `[backend]` section.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidInput(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the text is not valid TOML, the
    /// `[backend]` section is missing, or the driver is unknown.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| Error::InvalidInput(format!("cannot parse config: {e}")))?;
        let backend = file
            .backend
            .ok_or_else(|| Error::InvalidInput("missing [backend] section".to_string()))?;
        Self::from_config_file(backend)
    }

    /// Converts a `ConfigFileBackend` to `BackendConfig`.
    fn from_config_file(file: ConfigFileBackend) -> Result<Self> {
        let driver_name = file
            .driver
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("backend.driver is required".to_string()))?;
        let driver = parse_driver(driver_name)?;

        let mut config = Self::new(driver);
        if let Some(host) = file.host {
            config.host = expand_env_vars(&host);
        }
        config.port = file.port;
        if let Some(database) = file.database {
            config.database = expand_env_vars(&database);
        }
        if let Some(username) = file.username {
            config.username = expand_env_vars(&username);
        }
        if let Some(password) = file.password {
            config.password = SecretString::from(expand_env_vars(&password));
        }
        config.url = file.url.map(|u| expand_env_vars(&u));
        config.sqlite_path = file.sqlite_path.map(|p| PathBuf::from(expand_env_vars(&p)));
        if let Some(pool) = file.pool {
            if let Some(max_size) = pool.max_size {
                config.pool.max_size = max_size;
            }
            if let Some(timeout_secs) = pool.timeout_secs {
                config.pool.timeout_secs = timeout_secs;
            }
        }

        Ok(config)
    }

    /// Applies `SQLKV_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `SQLKV_DRIVER` or `SQLKV_PORT` is malformed.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, keyed by `SQLKV_*` variable names.
    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(driver) = lookup("SQLKV_DRIVER") {
            self.driver = parse_driver(&driver)?;
        }
        if let Some(host) = lookup("SQLKV_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SQLKV_PORT") {
            self.port = Some(
                port.parse()
                    .map_err(|_| Error::InvalidInput(format!("invalid SQLKV_PORT '{port}'")))?,
            );
        }
        if let Some(database) = lookup("SQLKV_DATABASE") {
            self.database = database;
        }
        if let Some(username) = lookup("SQLKV_USERNAME") {
            self.username = username;
        }
        if let Some(password) = lookup("SQLKV_PASSWORD") {
            self.password = SecretString::from(password);
        }
        if let Some(url) = lookup("SQLKV_URL") {
            self.url = Some(url);
        }
        if let Some(path) = lookup("SQLKV_SQLITE_PATH") {
            self.sqlite_path = Some(PathBuf::from(path));
        }
        Ok(self)
    }

    /// Port to connect to: the configured one or the driver default.
    #[must_use]
    pub fn port_or_default(&self) -> Option<u16> {
        self.port.or_else(|| self.driver.default_port())
    }

    /// Checks that the configuration is structurally usable.
    ///
    /// Does not check reachability.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationFailure`] naming the first problem found.
    pub fn validate(&self) -> Result<()> {
        let operation = "validate_backend_config";
        if self.pool.max_size == 0 {
            return Err(Error::configuration(operation, "pool.max_size must be at least 1"));
        }
        if self.driver == BackendType::Sqlite {
            return match &self.sqlite_path {
                Some(path) if !path.as_os_str().is_empty() => Ok(()),
                _ => Err(Error::configuration(operation, "sqlite_path is required")),
            };
        }
        if self.url.is_some() {
            return Ok(());
        }
        if self.host.trim().is_empty() {
            return Err(Error::configuration(operation, "host is required"));
        }
        if self.database.trim().is_empty() {
            return Err(Error::configuration(operation, "database is required"));
        }
        if self.port == Some(0) {
            return Err(Error::configuration(operation, "port must be non-zero"));
        }
        Ok(())
    }
}

fn parse_driver(name: &str) -> Result<BackendType> {
    BackendType::parse(name)
        .ok_or_else(|| Error::InvalidInput(format!("unknown backend driver '{name}'")))
}

/// Expands `${VAR}` references from the environment.
///
/// Unknown variables expand to the empty string; an unterminated `${` is
/// kept literally.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    expand_with(value, |key| std::env::var(key).ok())
}

fn expand_with(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        out.push_str(&lookup(&after[..end]).unwrap_or_default());
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_toml_full() {
        let config = BackendConfig::from_toml(
            r#"
            [backend]
            driver = "postgresql"
            host = "db.internal"
            port = 6543
            database = "kv"
            username = "app"
            password = "secret"

            [backend.pool]
            max_size = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.driver, BackendType::Postgres);
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port_or_default(), Some(6543));
        assert_eq!(config.database, "kv");
        assert_eq!(config.username, "app");
        assert_eq!(config.password.expose_secret(), "secret");
        assert_eq!(config.pool.max_size, 5);
        assert_eq!(config.pool.timeout_secs, DEFAULT_POOL_TIMEOUT_SECS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_requires_backend_and_driver() {
        assert!(matches!(
            BackendConfig::from_toml(""),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            BackendConfig::from_toml("[backend]\nhost = \"x\""),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            BackendConfig::from_toml("[backend]\ndriver = \"oracle\""),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            BackendConfig::from_toml("[backend\ndriver"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(BackendConfig::new(BackendType::Mysql).port_or_default(), Some(3306));
        assert_eq!(BackendConfig::new(BackendType::Postgres).port_or_default(), Some(5432));
    }

    #[test]
    fn test_validate() {
        let mut config = BackendConfig::new(BackendType::Mysql);
        assert!(matches!(
            config.validate(),
            Err(Error::ConfigurationFailure { ref cause, .. }) if cause.contains("database")
        ));

        config.database = "kv".to_string();
        assert!(config.validate().is_ok());

        config.port = Some(0);
        assert!(config.validate().is_err());

        config.port = None;
        config.host = "  ".to_string();
        assert!(config.validate().is_err());

        config.url = Some("mysql://kv@db/kv".to_string());
        assert!(config.validate().is_ok());

        config.pool.max_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_sqlite_requires_path() {
        assert!(BackendConfig::new(BackendType::Sqlite).validate().is_err());
        assert!(BackendConfig::sqlite("kv.db").validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = BackendConfig::new(BackendType::Mysql)
            .with_overrides(lookup(&[
                ("SQLKV_DRIVER", "pg"),
                ("SQLKV_HOST", "override.internal"),
                ("SQLKV_PORT", "15432"),
                ("SQLKV_PASSWORD", "from-env"),
            ]))
            .unwrap();

        assert_eq!(config.driver, BackendType::Postgres);
        assert_eq!(config.host, "override.internal");
        assert_eq!(config.port, Some(15432));
        assert_eq!(config.password.expose_secret(), "from-env");
        assert!(config.url.is_none());
    }

    #[test]
    fn test_overrides_reject_bad_port() {
        let result = BackendConfig::new(BackendType::Mysql)
            .with_overrides(lookup(&[("SQLKV_PORT", "http")]));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_expand_with() {
        let vars = lookup(&[("DB_HOST", "db.internal"), ("DB_PASS", "p@ss")]);
        assert_eq!(expand_with("${DB_HOST}", &vars), "db.internal");
        assert_eq!(
            expand_with("postgresql://kv:${DB_PASS}@${DB_HOST}/kv", &vars),
            "postgresql://kv:p@ss@db.internal/kv"
        );
        assert_eq!(expand_with("${MISSING}x", &vars), "x");
        assert_eq!(expand_with("plain", &vars), "plain");
        assert_eq!(expand_with("broken ${DB_HOST", &vars), "broken ${DB_HOST");
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let mut config = BackendConfig::new(BackendType::Postgres);
        config.password = SecretString::from("hunter2".to_string());
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
