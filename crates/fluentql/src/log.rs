//! SQL logging via `tracing` (target `fluentql.sql`).

use crate::config::{QueryConfig, SqlLogLevel};

/// What kind of statement is about to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Aggregate,
    Insert,
    Update,
    Delete,
    Truncate,
    Infile,
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Emit one event for a statement before it is handed to the connection.
pub(crate) fn log_statement(
    config: &QueryConfig,
    kind: StatementKind,
    sql: &str,
    binding_count: usize,
) {
    if !config.log_sql {
        return;
    }

    macro_rules! emit_at_level {
        ($level:expr, $($field:tt)*) => {
            match $level {
                SqlLogLevel::Error => tracing::error!($($field)*),
                SqlLogLevel::Warn  => tracing::warn!($($field)*),
                SqlLogLevel::Info  => tracing::info!($($field)*),
                SqlLogLevel::Debug => tracing::debug!($($field)*),
                SqlLogLevel::Trace => tracing::trace!($($field)*),
            }
        };
    }

    let sql = match config.max_logged_sql_length {
        Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
        _ => sql.to_string(),
    };
    emit_at_level!(
        config.log_level,
        target: "fluentql.sql",
        statement = ?kind,
        dialect = %config.dialect,
        binding_count,
        sql = %sql,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundary() {
        assert_eq!(truncate_sql_bytes("SELECT 'é'", 9), "SELECT '");
        assert_eq!(truncate_sql_bytes("SELECT 1", 100), "SELECT 1");
    }
}
