use super::{Compiled, Dialect, Grammar, PlaceholderStyle, SqlWriter, split_alias};
use crate::builder::state::{DatePart, LockMode, QueryState};
use crate::error::QueryResult;
use crate::operator::Operator;
use crate::param::Param;
use crate::record::Batch;
use crate::value::Value;

const OPERATORS: &[&str] = &["glob"];

/// SQLite.
#[derive(Clone, Copy, Debug, Default)]
pub struct SqliteGrammar;

impl Grammar for SqliteGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::QuestionMark
    }

    fn quote_segment(&self, segment: &str) -> String {
        format!("\"{}\"", segment.replace('"', "\"\""))
    }

    fn operators(&self) -> &'static [&'static str] {
        OPERATORS
    }

    fn limit_for_offset_only(&self) -> Option<&'static str> {
        Some("-1")
    }

    /// SQLite locks the whole database file; row locks have no syntax.
    fn compile_lock(&self, _lock: LockMode) -> QueryResult<Option<&'static str>> {
        Ok(None)
    }

    /// Compound select members cannot be parenthesized, so each becomes a derived table.
    fn write_union_member(
        &self,
        w: &mut SqlWriter,
        state: &QueryState,
        full: bool,
    ) -> QueryResult<()> {
        w.push("SELECT * FROM (");
        if full {
            self.write_select(w, state)?;
        } else {
            self.write_select_body(w, state)?;
        }
        w.push(")");
        Ok(())
    }

    /// `strftime('<format>', col) op CAST(? AS TEXT)`
    fn compile_date_part(
        &self,
        w: &mut SqlWriter,
        part: DatePart,
        column: &str,
        operator: Operator,
        value: &Param,
    ) -> QueryResult<()> {
        let format = match part {
            DatePart::Date => "%Y-%m-%d",
            DatePart::Time => "%H:%M:%S",
            DatePart::Day => "%d",
            DatePart::Month => "%m",
            DatePart::Year => "%Y",
        };
        w.push("strftime('")
            .push(format)
            .push("', ")
            .push(&self.wrap(column))
            .push(") ")
            .push(&operator.to_string())
            .push(" CAST(")
            .push_param(value)
            .push(" AS TEXT)");
        Ok(())
    }

    /// `strftime` zero-pads days and months.
    fn normalize_date_value(&self, part: DatePart, value: Param) -> Param {
        match (part, value) {
            (DatePart::Day | DatePart::Month, Param::Value(Value::Int(n))) => {
                Param::from(format!("{n:02}"))
            }
            (_, value) => value,
        }
    }

    fn compile_insert_ignore(&self, table: &str, batch: &Batch) -> QueryResult<String> {
        self.compile_insert_as("INSERT OR IGNORE INTO", table, batch)
    }

    fn compile_replace(&self, table: &str, batch: &Batch) -> QueryResult<String> {
        self.compile_insert_as("INSERT OR REPLACE INTO", table, batch)
    }

    /// Reset the autoincrement counter, then delete every row.
    fn compile_truncate(&self, table: &str) -> QueryResult<Vec<Compiled>> {
        let name = split_alias(table).map_or(table, |(name, _)| name);
        Ok(vec![
            Compiled::new(
                "DELETE FROM \"sqlite_sequence\" WHERE \"name\" = ?",
                vec![Value::from(name)],
            ),
            Compiled::new(format!("DELETE FROM {}", self.wrap_table(name)), Vec::new()),
        ])
    }
}
