//! Raw SQL fragments.

use std::fmt;

/// A raw SQL fragment that is emitted verbatim and never bound as a parameter.
///
/// **Warning**: this bypasses parameter binding. Only use it with trusted,
/// hardcoded SQL.
///
/// # Example
/// ```ignore
/// use fluentql::{raw, Record};
///
/// let record = Record::new()
///     .set("name", "alice")
///     .set("created_at", raw("CURRENT_TIMESTAMP"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression(String);

impl Expression {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wrap a raw SQL fragment.
pub fn raw(sql: impl Into<String>) -> Expression {
    Expression::new(sql)
}
