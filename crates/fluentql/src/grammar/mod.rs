//! Dialect compilers.
//!
//! A [`Grammar`] turns a [`QueryState`] (or an insert batch) into SQL text. Dialects
//! implement the four required methods and override the provided ones only where
//! their syntax differs. Every compile method emits placeholders in the same order
//! the builder flattens its bindings: select, join, where, having, order, union.

mod mysql;
mod postgres;
mod sqlite;
mod writer;

#[cfg(test)]
mod tests;

pub use mysql::MySqlGrammar;
pub use postgres::PostgresGrammar;
pub use sqlite::SqliteGrammar;
pub use writer::SqlWriter;
pub(crate) use writer::count_markers;

use crate::builder::join::{JoinClause, JoinType};
use crate::builder::state::{
    Aggregate, AggregateFunction, Column, DatePart, InfileSpec, LockMode, Order, OutfileSpec,
    Predicate, QueryState,
};
use crate::error::{QueryError, QueryResult};
use crate::operator::Operator;
use crate::param::Param;
use crate::record::{Batch, Record, UpsertUpdate};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Supported SQL dialects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    MySql,
    #[default]
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// The stock grammar for this dialect.
    pub fn grammar(self) -> Arc<dyn Grammar> {
        match self {
            Dialect::MySql => Arc::new(MySqlGrammar),
            Dialect::Postgres => Arc::new(PostgresGrammar),
            Dialect::Sqlite => Arc::new(SqliteGrammar),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placeholder syntax.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `$1, $2, ...`
    Numbered,
    /// `?`
    QuestionMark,
}

/// Compiled SQL plus its bindings in placeholder order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Compiled {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl Compiled {
    pub fn new(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }
}

/// Per-dialect SQL compiler.
pub trait Grammar: fmt::Debug + Send + Sync {
    fn dialect(&self) -> Dialect;

    fn placeholder_style(&self) -> PlaceholderStyle;

    /// Quote one identifier segment (no dots).
    fn quote_segment(&self, segment: &str) -> String;

    /// Operators accepted on top of [`BASE_OPERATORS`](crate::operator::BASE_OPERATORS).
    fn operators(&self) -> &'static [&'static str];

    fn parse_operator(&self, operator: &str) -> Option<Operator> {
        Operator::parse(operator, self.operators())
    }

    fn writer(&self) -> SqlWriter {
        SqlWriter::new(self.placeholder_style())
    }

    /// Quote an identifier: `a.b` per segment, `a as b` with an alias.
    ///
    /// `*` segments and anything containing `(` are left as written.
    fn wrap(&self, value: &str) -> String {
        let value = value.trim();
        if value == "*" || value.contains('(') {
            return value.to_string();
        }
        if let Some((name, alias)) = split_alias(value) {
            return format!("{} AS {}", self.wrap(name), self.quote_segment(alias));
        }
        value
            .split('.')
            .map(|segment| {
                if segment == "*" {
                    segment.to_string()
                } else {
                    self.quote_segment(segment)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    fn wrap_table(&self, table: &str) -> String {
        self.wrap(table)
    }

    fn columnize(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.wrap(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    // ==================== SELECT ====================

    fn compile_select(&self, state: &QueryState) -> QueryResult<String> {
        let mut w = self.writer();
        self.write_select(&mut w, state)?;
        Ok(w.finish())
    }

    /// Write a complete select, including unions, outfile and lock.
    fn write_select(&self, w: &mut SqlWriter, state: &QueryState) -> QueryResult<()> {
        if let Some(aggregate) = &state.aggregate {
            let grouped =
                aggregate.function == AggregateFunction::Count && !state.groups.is_empty();
            if grouped || !state.unions.is_empty() {
                return self.write_wrapped_aggregate(w, state, aggregate);
            }
        }

        if state.unions.is_empty() {
            self.write_select_body(w, state)?;
        } else {
            self.write_union_member(w, state, false)?;
            for union in &state.unions {
                w.push(if union.all { " UNION ALL " } else { " UNION " });
                self.write_union_member(w, &union.query, true)?;
            }
        }

        if let Some(outfile) = &state.outfile {
            w.push(" ").push(&self.compile_outfile(outfile)?);
        }
        if let Some(lock) = state.lock {
            if let Some(sql) = self.compile_lock(lock)? {
                w.push(" ").push(sql);
            }
        }
        Ok(())
    }

    /// `SELECT ... FROM ... LIMIT ... OFFSET ...` without unions or locks.
    fn write_select_body(&self, w: &mut SqlWriter, state: &QueryState) -> QueryResult<()> {
        w.push("SELECT ");
        match &state.aggregate {
            Some(aggregate) => self.write_aggregate(w, state, aggregate),
            None => {
                if state.distinct {
                    w.push("DISTINCT ");
                }
                self.write_columns(w, &state.columns)?;
            }
        }

        if let Some(table) = &state.table {
            w.push(" FROM ").push(&self.wrap_table(table));
        }

        self.write_joins(w, &state.joins)?;

        if !state.wheres.is_empty() {
            w.push(" WHERE ");
            self.write_predicates(w, &state.wheres)?;
        }

        if !state.groups.is_empty() {
            w.push(" ").push(&self.compile_group_by(&state.groups, state.rollup)?);
        }

        if !state.havings.is_empty() {
            w.push(" HAVING ");
            self.write_predicates(w, &state.havings)?;
        }

        if !state.orders.is_empty() {
            w.push(" ORDER BY ");
            self.write_orders(w, &state.orders);
        }

        self.write_limit_offset(w, state.limit, state.offset);
        Ok(())
    }

    /// One side of a `UNION`.
    fn write_union_member(
        &self,
        w: &mut SqlWriter,
        state: &QueryState,
        full: bool,
    ) -> QueryResult<()> {
        w.push("(");
        if full {
            self.write_select(w, state)?;
        } else {
            self.write_select_body(w, state)?;
        }
        w.push(")");
        Ok(())
    }

    /// Aggregate over a grouped or unioned select, run as a derived table.
    fn write_wrapped_aggregate(
        &self,
        w: &mut SqlWriter,
        state: &QueryState,
        aggregate: &Aggregate,
    ) -> QueryResult<()> {
        let mut inner = state.clone();
        inner.aggregate = None;
        inner.lock = None;
        inner.outfile = None;
        if inner.columns.is_empty() && !inner.groups.is_empty() {
            inner.columns = inner.groups.iter().cloned().map(Column::Name).collect();
        }

        let outer = QueryState {
            distinct: state.distinct,
            ..QueryState::default()
        };
        w.push("SELECT ");
        self.write_aggregate(w, &outer, aggregate);
        w.push(" FROM (");
        self.write_select(w, &inner)?;
        w.push(") AS ").push(&self.quote_segment("aggregate_table"));
        Ok(())
    }

    fn write_aggregate(&self, w: &mut SqlWriter, state: &QueryState, aggregate: &Aggregate) {
        let mut column = if aggregate.columns.is_empty() {
            "*".to_string()
        } else {
            self.columnize(&aggregate.columns)
        };
        if state.distinct && column != "*" {
            column = format!("DISTINCT {column}");
        }
        w.push(aggregate.function.as_sql())
            .push("(")
            .push(&column)
            .push(") AS ")
            .push(&self.quote_segment("aggregate"));
    }

    fn write_columns(&self, w: &mut SqlWriter, columns: &[Column]) -> QueryResult<()> {
        if columns.is_empty() {
            w.push("*");
            return Ok(());
        }
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            match column {
                Column::Name(name) => {
                    w.push(&self.wrap(name));
                }
                Column::Expr(expr) => {
                    w.push(expr.as_str());
                }
                Column::Raw { sql, binding_count } => {
                    w.push_template(sql, *binding_count);
                }
                Column::Sub { query, alias } => {
                    w.push("(");
                    self.write_select(w, query)?;
                    w.push(") AS ").push(&self.wrap(alias));
                }
            }
        }
        Ok(())
    }

    fn write_joins(&self, w: &mut SqlWriter, joins: &[JoinClause]) -> QueryResult<()> {
        for join in joins {
            w.push(" ")
                .push(join.join_type.as_sql())
                .push(" ")
                .push(&self.wrap_table(&join.table));
            if join.join_type == JoinType::Cross {
                continue;
            }
            if join.conditions.is_empty() {
                return Err(QueryError::invalid_argument(format!(
                    "join on '{}' has no conditions",
                    join.table
                )));
            }
            w.push(" ON ");
            self.write_predicates(w, &join.conditions)?;
        }
        Ok(())
    }

    /// Write a predicate list; the first node's connector is dropped.
    fn write_predicates(&self, w: &mut SqlWriter, predicates: &[Predicate]) -> QueryResult<()> {
        for (i, predicate) in predicates.iter().enumerate() {
            if i > 0 {
                w.push(" ").push(predicate.boolean().as_sql()).push(" ");
            }
            self.write_predicate(w, predicate)?;
        }
        Ok(())
    }

    fn write_predicate(&self, w: &mut SqlWriter, predicate: &Predicate) -> QueryResult<()> {
        match predicate {
            Predicate::Basic {
                column,
                operator,
                value,
                ..
            } => {
                w.push(&self.wrap(column))
                    .push(" ")
                    .push(&operator.to_string())
                    .push(" ")
                    .push_param(value);
            }
            Predicate::Column {
                first,
                operator,
                second,
                ..
            } => {
                w.push(&self.wrap(first))
                    .push(" ")
                    .push(&operator.to_string())
                    .push(" ")
                    .push(&self.wrap(second));
            }
            Predicate::Raw {
                sql, binding_count, ..
            } => {
                w.push_template(sql, *binding_count);
            }
            Predicate::Between {
                column,
                low,
                high,
                negated,
                ..
            } => {
                w.push(&self.wrap(column))
                    .push(if *negated { " NOT BETWEEN " } else { " BETWEEN " })
                    .push_param(low)
                    .push(" AND ")
                    .push_param(high);
            }
            Predicate::Null {
                column, negated, ..
            } => {
                w.push(&self.wrap(column))
                    .push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Predicate::In {
                column,
                values,
                negated,
                ..
            } => {
                if values.is_empty() {
                    w.push(if *negated { "1 = 1" } else { "0 = 1" });
                } else {
                    w.push(&self.wrap(column))
                        .push(if *negated { " NOT IN (" } else { " IN (" })
                        .push_params(values)
                        .push(")");
                }
            }
            Predicate::InSub {
                column,
                query,
                negated,
                ..
            } => {
                w.push(&self.wrap(column))
                    .push(if *negated { " NOT IN (" } else { " IN (" });
                self.write_select(w, query)?;
                w.push(")");
            }
            Predicate::Exists { query, negated, .. } => {
                w.push(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
                self.write_select(w, query)?;
                w.push(")");
            }
            Predicate::Nested { predicates, .. } => {
                w.push("(");
                self.write_predicates(w, predicates)?;
                w.push(")");
            }
            Predicate::Sub {
                column,
                operator,
                query,
                ..
            } => {
                w.push(&self.wrap(column))
                    .push(" ")
                    .push(&operator.to_string())
                    .push(" (");
                self.write_select(w, query)?;
                w.push(")");
            }
            Predicate::Date {
                part,
                column,
                operator,
                value,
                ..
            } => {
                self.compile_date_part(w, *part, column, *operator, value)?;
            }
        }
        Ok(())
    }

    /// `DATE(col) op ?` style date-part comparison.
    fn compile_date_part(
        &self,
        w: &mut SqlWriter,
        part: DatePart,
        column: &str,
        operator: Operator,
        value: &Param,
    ) -> QueryResult<()> {
        let function = match part {
            DatePart::Date => "DATE",
            DatePart::Time => "TIME",
            DatePart::Day => "DAY",
            DatePart::Month => "MONTH",
            DatePart::Year => "YEAR",
        };
        w.push(function)
            .push("(")
            .push(&self.wrap(column))
            .push(") ")
            .push(&operator.to_string())
            .push(" ")
            .push_param(value);
        Ok(())
    }

    /// Adjust a date-part comparison value before it is stored and bound.
    fn normalize_date_value(&self, _part: DatePart, value: Param) -> Param {
        value
    }

    fn compile_group_by(&self, groups: &[String], rollup: bool) -> QueryResult<String> {
        if rollup {
            return Err(QueryError::unsupported(self.dialect(), "group by with rollup"));
        }
        Ok(format!("GROUP BY {}", self.columnize(groups)))
    }

    fn write_orders(&self, w: &mut SqlWriter, orders: &[Order]) {
        for (i, order) in orders.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            match order {
                Order::Column { column, direction } => {
                    w.push(&self.wrap(column)).push(" ").push(direction.as_sql());
                }
                Order::Raw { sql, binding_count } => {
                    w.push_template(sql, *binding_count);
                }
            }
        }
    }

    /// `LIMIT` to emit when only an offset is set, for dialects that require one.
    fn limit_for_offset_only(&self) -> Option<&'static str> {
        None
    }

    fn write_limit_offset(&self, w: &mut SqlWriter, limit: Option<u64>, offset: Option<u64>) {
        match (limit, offset) {
            (Some(limit), _) => {
                w.push(" LIMIT ").push(&limit.to_string());
            }
            (None, Some(_)) => {
                if let Some(max) = self.limit_for_offset_only() {
                    w.push(" LIMIT ").push(max);
                }
            }
            (None, None) => {}
        }
        if let Some(offset) = offset {
            w.push(" OFFSET ").push(&offset.to_string());
        }
    }

    /// Lock clause, or `None` when the dialect needs none.
    fn compile_lock(&self, lock: LockMode) -> QueryResult<Option<&'static str>> {
        Ok(Some(match lock {
            LockMode::Exclusive => "FOR UPDATE",
            LockMode::Shared => "FOR SHARE",
        }))
    }

    fn compile_outfile(&self, _spec: &OutfileSpec) -> QueryResult<String> {
        Err(QueryError::unsupported(self.dialect(), "select into outfile"))
    }

    // ==================== INSERT ====================

    /// Written for a batch without columns.
    fn default_values(&self) -> &'static str {
        "DEFAULT VALUES"
    }

    /// Write `<verb> "table" (cols) VALUES (...), (...)`.
    fn write_insert_as(
        &self,
        w: &mut SqlWriter,
        verb: &str,
        table: &str,
        batch: &Batch,
    ) -> QueryResult<()> {
        if batch.is_empty() {
            return Err(QueryError::invalid_argument("insert requires at least one record"));
        }

        w.push(verb).push(" ").push(&self.wrap_table(table));
        if batch.columns.is_empty() {
            w.push(" ").push(self.default_values());
            return Ok(());
        }

        w.push(" (").push(&self.columnize(&batch.columns)).push(") VALUES ");
        for (i, row) in batch.rows.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push("(").push_params(row).push(")");
        }
        Ok(())
    }

    fn compile_insert_as(&self, verb: &str, table: &str, batch: &Batch) -> QueryResult<String> {
        let mut w = self.writer();
        self.write_insert_as(&mut w, verb, table, batch)?;
        Ok(w.finish())
    }

    fn compile_insert(&self, table: &str, batch: &Batch) -> QueryResult<String> {
        self.compile_insert_as("INSERT INTO", table, batch)
    }

    /// Whether [`compile_insert_get_id`](Grammar::compile_insert_get_id) returns the
    /// new key as a result row.
    fn returns_inserted_id(&self) -> bool {
        false
    }

    fn compile_insert_get_id(
        &self,
        table: &str,
        batch: &Batch,
        _sequence: Option<&str>,
    ) -> QueryResult<String> {
        self.compile_insert(table, batch)
    }

    fn compile_insert_ignore(&self, _table: &str, _batch: &Batch) -> QueryResult<String> {
        Err(QueryError::unsupported(self.dialect(), "insert ignore"))
    }

    fn compile_replace(&self, _table: &str, _batch: &Batch) -> QueryResult<String> {
        Err(QueryError::unsupported(self.dialect(), "replace"))
    }

    fn compile_insert_select(
        &self,
        table: &str,
        columns: &[String],
        query: &QueryState,
    ) -> QueryResult<String> {
        let mut w = self.writer();
        w.push("INSERT INTO ").push(&self.wrap_table(table));
        if !columns.is_empty() {
            w.push(" (").push(&self.columnize(columns)).push(")");
        }
        w.push(" ");
        self.write_select(&mut w, query)?;
        Ok(w.finish())
    }

    /// `INSERT ... ON CONFLICT (cols) DO UPDATE SET ...`
    fn compile_upsert(
        &self,
        table: &str,
        batch: &Batch,
        conflict: &[String],
        update: &UpsertUpdate,
    ) -> QueryResult<String> {
        if update.is_empty() {
            return self.compile_insert_ignore(table, batch);
        }
        if conflict.is_empty() {
            return Err(QueryError::invalid_argument("upsert requires conflict columns"));
        }

        let mut w = self.writer();
        self.write_insert_as(&mut w, "INSERT INTO", table, batch)?;
        w.push(" ON CONFLICT (")
            .push(&self.columnize(conflict))
            .push(") DO UPDATE SET ");
        self.write_upsert_assignments(&mut w, update);
        Ok(w.finish())
    }

    /// Upsert `SET` list: copied columns read from the rejected row.
    fn write_upsert_assignments(&self, w: &mut SqlWriter, update: &UpsertUpdate) {
        match update {
            UpsertUpdate::Columns(columns) => {
                let assignments: Vec<String> = columns
                    .iter()
                    .map(|c| {
                        format!(
                            "{} = {}.{}",
                            self.wrap(c),
                            self.quote_segment("excluded"),
                            self.wrap(c)
                        )
                    })
                    .collect();
                w.push(&assignments.join(", "));
            }
            UpsertUpdate::Values(record) => self.write_assignments(w, record),
        }
    }

    // ==================== UPDATE / DELETE ====================

    fn write_assignments(&self, w: &mut SqlWriter, values: &Record) {
        for (i, (column, value)) in values.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push(&self.wrap(column)).push(" = ").push_param(value);
        }
    }

    /// `UPDATE t SET ... WHERE ...`
    fn compile_update(&self, state: &QueryState, values: &Record) -> QueryResult<String> {
        let table = require_table(state, "update")?;
        if values.is_empty() {
            return Err(QueryError::invalid_argument("update requires at least one column"));
        }
        if !state.joins.is_empty() {
            return Err(QueryError::unsupported(self.dialect(), "update with joins"));
        }
        if !state.orders.is_empty() || state.limit.is_some() {
            return Err(QueryError::unsupported(self.dialect(), "update with order by or limit"));
        }

        let mut w = self.writer();
        w.push("UPDATE ").push(&self.wrap_table(table)).push(" SET ");
        self.write_assignments(&mut w, values);
        if !state.wheres.is_empty() {
            w.push(" WHERE ");
            self.write_predicates(&mut w, &state.wheres)?;
        }
        Ok(w.finish())
    }

    /// `DELETE FROM t WHERE ...`
    fn compile_delete(&self, state: &QueryState) -> QueryResult<String> {
        let table = require_table(state, "delete")?;
        if !state.joins.is_empty() {
            return Err(QueryError::unsupported(self.dialect(), "delete with joins"));
        }
        if !state.orders.is_empty() || state.limit.is_some() {
            return Err(QueryError::unsupported(self.dialect(), "delete with order by or limit"));
        }

        let mut w = self.writer();
        w.push("DELETE FROM ").push(&self.wrap_table(table));
        if !state.wheres.is_empty() {
            w.push(" WHERE ");
            self.write_predicates(&mut w, &state.wheres)?;
        }
        Ok(w.finish())
    }

    /// Statements emptying `table`, run in order.
    fn compile_truncate(&self, table: &str) -> QueryResult<Vec<Compiled>> {
        Ok(vec![Compiled::new(
            format!("TRUNCATE TABLE {}", self.wrap_table(table)),
            Vec::new(),
        )])
    }

    fn compile_infile(&self, _table: &str, _spec: &InfileSpec) -> QueryResult<String> {
        Err(QueryError::unsupported(self.dialect(), "load data infile"))
    }
}

pub(crate) fn require_table<'a>(state: &'a QueryState, operation: &str) -> QueryResult<&'a str> {
    state
        .table
        .as_deref()
        .ok_or_else(|| QueryError::invalid_argument(format!("{operation} requires a table")))
}

/// Split `name as alias` (case-insensitive `as`).
pub(crate) fn split_alias(value: &str) -> Option<(&str, &str)> {
    let lower = value.to_ascii_lowercase();
    let pos = lower.rfind(" as ")?;
    Some((value[..pos].trim(), value[pos + 4..].trim()))
}

/// Single-quoted string literal with quotes and backslashes escaped.
pub(crate) fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}
