use crate::grammar::Dialect;
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Level at which executed SQL is logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlLogLevel {
    Error,
    Warn,
    Info,
    #[default]
    Debug,
    Trace,
}

impl From<SqlLogLevel> for Level {
    fn from(level: SqlLogLevel) -> Self {
        match level {
            SqlLogLevel::Error => Level::ERROR,
            SqlLogLevel::Warn => Level::WARN,
            SqlLogLevel::Info => Level::INFO,
            SqlLogLevel::Debug => Level::DEBUG,
            SqlLogLevel::Trace => Level::TRACE,
        }
    }
}

/// How pooled connections are checked before reuse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recycling {
    /// Only check that the connection is not closed.
    #[default]
    Fast,
    /// Run a test query first.
    Verified,
}

/// Pool sizing used by `create_pool` and `Db::connect_pool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub max_size: usize,
    pub recycling: Recycling,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_size: 16,
            recycling: Recycling::Fast,
        }
    }
}

/// Builder configuration, fixed for the lifetime of a [`Db`](crate::Db).
///
/// Deserializable so it can live in an application's own config file:
///
/// ```ignore
/// let config: QueryConfig = serde_json::from_str(r#"{ "dialect": "mysql", "table_prefix": "app_" }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Grammar used by [`Db::new`](crate::Db::new).
    pub dialect: Dialect,
    /// Prepended to every table passed to `from`/`table` and the join methods.
    pub table_prefix: String,
    /// Page size used by `paginate` when the caller passes less than 1.
    pub default_per_page: u64,
    /// Whether executed statements are logged.
    pub log_sql: bool,
    pub log_level: SqlLogLevel,
    /// Truncate logged SQL (in bytes). `None` logs it whole.
    pub max_logged_sql_length: Option<usize>,
    pub pool: PoolSettings,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            table_prefix: String::new(),
            default_per_page: 20,
            log_sql: true,
            log_level: SqlLogLevel::Debug,
            max_logged_sql_length: Some(200),
            pool: PoolSettings::default(),
        }
    }
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// Set the fallback page size. Values below 1 are stored as 1.
    pub fn with_default_per_page(mut self, per_page: u64) -> Self {
        self.default_per_page = per_page.max(1);
        self
    }

    pub fn with_log_level(mut self, level: SqlLogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_max_logged_sql_length(mut self, len: usize) -> Self {
        self.max_logged_sql_length = Some(len);
        self
    }

    /// Log statements without truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_logged_sql_length = None;
        self
    }

    /// Set the pool size. Values below 1 are stored as 1.
    pub fn with_pool_size(mut self, max_size: usize) -> Self {
        self.pool.max_size = max_size.max(1);
        self
    }

    pub fn with_recycling(mut self, recycling: Recycling) -> Self {
        self.pool.recycling = recycling;
        self
    }

    pub fn disable_sql_logging(mut self) -> Self {
        self.log_sql = false;
        self
    }

    /// `prefix + table`.
    pub fn prefixed(&self, table: &str) -> String {
        if self.table_prefix.is_empty() {
            table.to_string()
        } else {
            format!("{}{}", self.table_prefix, table.trim())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueryConfig::default();
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.default_per_page, 20);
        assert_eq!(config.max_logged_sql_length, Some(200));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: QueryConfig =
            serde_json::from_str(r#"{ "dialect": "mysql", "table_prefix": "app_", "log_level": "info" }"#)
                .unwrap();
        assert_eq!(config.dialect, Dialect::MySql);
        assert_eq!(config.prefixed("users"), "app_users");
        assert_eq!(config.log_level, SqlLogLevel::Info);
        assert_eq!(config.default_per_page, 20);
        assert_eq!(config.pool, PoolSettings::default());
    }

    #[test]
    fn test_deserialize_pool_section() {
        let config: QueryConfig =
            serde_json::from_str(r#"{ "pool": { "max_size": 4, "recycling": "verified" } }"#)
                .unwrap();
        assert_eq!(config.pool.max_size, 4);
        assert_eq!(config.pool.recycling, Recycling::Verified);
        assert_eq!(QueryConfig::new().with_pool_size(0).pool.max_size, 1);
    }

    #[test]
    fn test_default_per_page_floor() {
        assert_eq!(QueryConfig::new().with_default_per_page(0).default_per_page, 1);
    }
}
