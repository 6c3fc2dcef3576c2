//! Backend types and store definitions.

use std::fmt;

/// Relational backend a store can run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendType {
    /// MySQL (`InnoDB` tables).
    Mysql,
    /// PostgreSQL.
    #[default]
    Postgres,
    /// `SQLite` (embedded, file-backed).
    Sqlite,
}

impl BackendType {
    /// Returns the canonical type name used in configuration and registration.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend type name, accepting the usual aliases.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Self::Mysql),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Default TCP port for network backends.
    #[must_use]
    pub const fn default_port(&self) -> Option<u16> {
        match self {
            Self::Mysql => Some(3306),
            Self::Postgres => Some(5432),
            Self::Sqlite => None,
        }
    }

    /// Returns all backend types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Mysql, Self::Postgres, Self::Sqlite]
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Definition of a named store as the surrounding system catalogues it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDefinition {
    /// Store name, also used verbatim as the table name.
    pub name: String,
    /// Backend type the store is configured for.
    pub backend: BackendType,
}

impl StoreDefinition {
    /// Creates a new store definition.
    #[must_use]
    pub fn new(name: impl Into<String>, backend: BackendType) -> Self {
        Self {
            name: name.into(),
            backend,
        }
    }
}

/// Returns true if `name` is a plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`).
///
/// Store names are interpolated into SQL text without escaping; this check
/// only exists to flag names that would not survive that.
#[must_use]
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
