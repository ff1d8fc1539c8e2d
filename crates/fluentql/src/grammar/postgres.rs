use super::{Compiled, Dialect, Grammar, PlaceholderStyle, SqlWriter};
use crate::builder::state::DatePart;
use crate::error::QueryResult;
use crate::operator::Operator;
use crate::param::Param;
use crate::record::Batch;

const OPERATORS: &[&str] = &[
    "ilike",
    "not ilike",
    "~",
    "~*",
    "!~",
    "!~*",
    "similar to",
    "not similar to",
    "~~*",
    "!~~*",
];

/// PostgreSQL.
#[derive(Clone, Copy, Debug, Default)]
pub struct PostgresGrammar;

impl Grammar for PostgresGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered
    }

    fn quote_segment(&self, segment: &str) -> String {
        format!("\"{}\"", segment.replace('"', "\"\""))
    }

    fn operators(&self) -> &'static [&'static str] {
        OPERATORS
    }

    fn compile_group_by(&self, groups: &[String], rollup: bool) -> QueryResult<String> {
        let columns = self.columnize(groups);
        Ok(if rollup {
            format!("GROUP BY ROLLUP ({columns})")
        } else {
            format!("GROUP BY {columns}")
        })
    }

    /// `col::date`, `col::time`, `EXTRACT(DAY FROM col)`, ...
    fn compile_date_part(
        &self,
        w: &mut SqlWriter,
        part: DatePart,
        column: &str,
        operator: Operator,
        value: &Param,
    ) -> QueryResult<()> {
        let column = self.wrap(column);
        let expr = match part {
            DatePart::Date => format!("{column}::date"),
            DatePart::Time => format!("{column}::time"),
            DatePart::Day => format!("EXTRACT(DAY FROM {column})"),
            DatePart::Month => format!("EXTRACT(MONTH FROM {column})"),
            DatePart::Year => format!("EXTRACT(YEAR FROM {column})"),
        };
        w.push(&expr)
            .push(" ")
            .push(&operator.to_string())
            .push(" ")
            .push_param(value);
        Ok(())
    }

    fn returns_inserted_id(&self) -> bool {
        true
    }

    /// Plain insert with `RETURNING <sequence or "id">`.
    fn compile_insert_get_id(
        &self,
        table: &str,
        batch: &Batch,
        sequence: Option<&str>,
    ) -> QueryResult<String> {
        let mut sql = self.compile_insert(table, batch)?;
        sql.push_str(" RETURNING ");
        sql.push_str(&self.wrap(sequence.unwrap_or("id")));
        Ok(sql)
    }

    fn compile_insert_ignore(&self, table: &str, batch: &Batch) -> QueryResult<String> {
        let mut sql = self.compile_insert(table, batch)?;
        sql.push_str(" ON CONFLICT DO NOTHING");
        Ok(sql)
    }

    fn compile_truncate(&self, table: &str) -> QueryResult<Vec<Compiled>> {
        Ok(vec![Compiled::new(
            format!("TRUNCATE {} RESTART IDENTITY CASCADE", self.wrap_table(table)),
            Vec::new(),
        )])
    }
}
