//! Entry point: a grammar plus configuration, handing out builders.

use crate::builder::Builder;
use crate::config::QueryConfig;
use crate::expression::Expression;
use crate::grammar::{Dialect, Grammar};
use std::sync::Arc;

/// Factory for [`Builder`]s sharing one grammar and one configuration.
///
/// Cheap to clone; every builder holds `Arc`s to the same grammar and config.
#[derive(Clone, Debug)]
pub struct Db {
    grammar: Arc<dyn Grammar>,
    config: Arc<QueryConfig>,
}

impl Db {
    /// Use the stock grammar for `config.dialect`.
    pub fn new(config: QueryConfig) -> Self {
        let grammar = config.dialect.grammar();
        Self {
            grammar,
            config: Arc::new(config),
        }
    }

    /// Use a custom grammar. The configured dialect is overwritten with the
    /// grammar's own so log output stays accurate.
    pub fn with_grammar(mut config: QueryConfig, grammar: Arc<dyn Grammar>) -> Self {
        config.dialect = grammar.dialect();
        Self {
            grammar,
            config: Arc::new(config),
        }
    }

    pub fn postgres() -> Self {
        Self::new(QueryConfig::new().with_dialect(Dialect::Postgres))
    }

    pub fn mysql() -> Self {
        Self::new(QueryConfig::new().with_dialect(Dialect::MySql))
    }

    pub fn sqlite() -> Self {
        Self::new(QueryConfig::new().with_dialect(Dialect::Sqlite))
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn grammar(&self) -> &Arc<dyn Grammar> {
        &self.grammar
    }

    pub fn dialect(&self) -> Dialect {
        self.grammar.dialect()
    }

    /// A builder with no table.
    pub fn query(&self) -> Builder {
        Builder::new(self.grammar.clone(), self.config.clone())
    }

    /// A builder selecting from `table` (the table prefix is applied).
    pub fn table(&self, table: &str) -> Builder {
        let mut builder = self.query();
        builder.from(table);
        builder
    }

    /// Raw SQL written verbatim wherever a value is accepted.
    pub fn raw(&self, sql: impl Into<String>) -> Expression {
        Expression::new(sql)
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::SqliteGrammar;

    #[test]
    fn test_table_applies_prefix() {
        let db = Db::new(QueryConfig::new().with_table_prefix("app_"));
        let q = db.table("users");
        assert_eq!(q.to_sql().unwrap(), r#"SELECT * FROM "app_users""#);
    }

    #[test]
    fn test_with_grammar_syncs_dialect() {
        let db = Db::with_grammar(
            QueryConfig::new().with_dialect(Dialect::MySql),
            Arc::new(SqliteGrammar),
        );
        assert_eq!(db.config().dialect, Dialect::Sqlite);
        assert_eq!(db.dialect(), Dialect::Sqlite);
    }

    #[test]
    fn test_default_is_postgres() {
        assert_eq!(Db::default().dialect(), Dialect::Postgres);
    }
}
