use super::{
    Dialect, Grammar, PlaceholderStyle, SqlWriter, quote_string, require_table, split_alias,
};
use crate::builder::state::{Duplicates, InfileSpec, LockMode, OutfileSpec, QueryState};
use crate::error::{QueryError, QueryResult};
use crate::record::{Batch, Record, UpsertUpdate};

const OPERATORS: &[&str] = &[
    "<=>",
    "like binary",
    "rlike",
    "not rlike",
    "regexp",
    "not regexp",
];

/// MySQL / MariaDB.
#[derive(Clone, Copy, Debug, Default)]
pub struct MySqlGrammar;

impl MySqlGrammar {
    fn write_where_order_limit(&self, w: &mut SqlWriter, state: &QueryState) -> QueryResult<()> {
        if !state.wheres.is_empty() {
            w.push(" WHERE ");
            self.write_predicates(w, &state.wheres)?;
        }
        if !state.orders.is_empty() {
            w.push(" ORDER BY ");
            self.write_orders(w, &state.orders);
        }
        if let Some(limit) = state.limit {
            w.push(" LIMIT ").push(&limit.to_string());
        }
        Ok(())
    }

    fn check_multi_table(&self, state: &QueryState, operation: &'static str) -> QueryResult<()> {
        // Multi-table UPDATE/DELETE accepts neither ORDER BY nor LIMIT.
        if !state.joins.is_empty() && (!state.orders.is_empty() || state.limit.is_some()) {
            return Err(QueryError::unsupported(self.dialect(), operation));
        }
        Ok(())
    }
}

fn push_field_options(
    out: &mut String,
    terminated_by: Option<&str>,
    enclosed_by: Option<&str>,
    lines_terminated_by: Option<&str>,
) {
    if terminated_by.is_some() || enclosed_by.is_some() {
        out.push_str(" FIELDS");
        if let Some(sep) = terminated_by {
            out.push_str(" TERMINATED BY ");
            out.push_str(&quote_string(sep));
        }
        if let Some(quote) = enclosed_by {
            out.push_str(" ENCLOSED BY ");
            out.push_str(&quote_string(quote));
        }
    }
    if let Some(sep) = lines_terminated_by {
        out.push_str(" LINES TERMINATED BY ");
        out.push_str(&quote_string(sep));
    }
}

impl Grammar for MySqlGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::QuestionMark
    }

    fn quote_segment(&self, segment: &str) -> String {
        format!("`{}`", segment.replace('`', "``"))
    }

    fn operators(&self) -> &'static [&'static str] {
        OPERATORS
    }

    fn limit_for_offset_only(&self) -> Option<&'static str> {
        Some("18446744073709551615")
    }

    fn compile_lock(&self, lock: LockMode) -> QueryResult<Option<&'static str>> {
        Ok(Some(match lock {
            LockMode::Exclusive => "FOR UPDATE",
            LockMode::Shared => "LOCK IN SHARE MODE",
        }))
    }

    fn compile_group_by(&self, groups: &[String], rollup: bool) -> QueryResult<String> {
        let mut sql = format!("GROUP BY {}", self.columnize(groups));
        if rollup {
            sql.push_str(" WITH ROLLUP");
        }
        Ok(sql)
    }

    fn compile_outfile(&self, file: &OutfileSpec) -> QueryResult<String> {
        let mut sql = format!("INTO OUTFILE {}", quote_string(&file.path));
        push_field_options(
            &mut sql,
            file.fields_terminated_by.as_deref(),
            file.enclosed_by.as_deref(),
            file.lines_terminated_by.as_deref(),
        );
        Ok(sql)
    }

    fn default_values(&self) -> &'static str {
        "() VALUES ()"
    }

    fn compile_insert_ignore(&self, table: &str, batch: &Batch) -> QueryResult<String> {
        self.compile_insert_as("INSERT IGNORE INTO", table, batch)
    }

    fn compile_replace(&self, table: &str, batch: &Batch) -> QueryResult<String> {
        self.compile_insert_as("REPLACE INTO", table, batch)
    }

    /// `ON DUPLICATE KEY UPDATE`; MySQL picks the conflicting key itself.
    fn compile_upsert(
        &self,
        table: &str,
        batch: &Batch,
        _conflict: &[String],
        update: &UpsertUpdate,
    ) -> QueryResult<String> {
        if update.is_empty() {
            return self.compile_insert_ignore(table, batch);
        }

        let mut w = self.writer();
        self.write_insert_as(&mut w, "INSERT INTO", table, batch)?;
        w.push(" ON DUPLICATE KEY UPDATE ");
        self.write_upsert_assignments(&mut w, update);
        Ok(w.finish())
    }

    fn write_upsert_assignments(&self, w: &mut SqlWriter, update: &UpsertUpdate) {
        match update {
            UpsertUpdate::Columns(columns) => {
                let assignments: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{0} = VALUES({0})", self.wrap(c)))
                    .collect();
                w.push(&assignments.join(", "));
            }
            UpsertUpdate::Values(record) => self.write_assignments(w, record),
        }
    }

    /// `UPDATE t [JOIN ...] SET ... [WHERE] [ORDER BY] [LIMIT]`
    fn compile_update(&self, state: &QueryState, values: &Record) -> QueryResult<String> {
        let table = require_table(state, "update")?;
        if values.is_empty() {
            return Err(QueryError::invalid_argument("update requires at least one column"));
        }
        self.check_multi_table(state, "update with joins and order by or limit")?;

        let mut w = self.writer();
        w.push("UPDATE ").push(&self.wrap_table(table));
        self.write_joins(&mut w, &state.joins)?;
        w.push(" SET ");
        self.write_assignments(&mut w, values);
        self.write_where_order_limit(&mut w, state)?;
        Ok(w.finish())
    }

    /// `DELETE [alias] FROM t [JOIN ...] [WHERE] [ORDER BY] [LIMIT]`
    fn compile_delete(&self, state: &QueryState) -> QueryResult<String> {
        let table = require_table(state, "delete")?;
        self.check_multi_table(state, "delete with joins and order by or limit")?;

        let mut w = self.writer();
        w.push("DELETE ");
        if !state.joins.is_empty() {
            let target = split_alias(table).map_or(table, |(_, alias)| alias);
            w.push(&self.wrap(target)).push(" ");
        }
        w.push("FROM ").push(&self.wrap_table(table));
        self.write_joins(&mut w, &state.joins)?;
        self.write_where_order_limit(&mut w, state)?;
        Ok(w.finish())
    }

    fn compile_infile(&self, table: &str, file: &InfileSpec) -> QueryResult<String> {
        let mut sql = String::from("LOAD DATA ");
        if file.local {
            sql.push_str("LOCAL ");
        }
        sql.push_str("INFILE ");
        sql.push_str(&quote_string(&file.path));
        match file.duplicates {
            Some(Duplicates::Replace) => sql.push_str(" REPLACE"),
            Some(Duplicates::Ignore) => sql.push_str(" IGNORE"),
            None => {}
        }
        sql.push_str(" INTO TABLE ");
        sql.push_str(&self.wrap_table(table));
        push_field_options(
            &mut sql,
            file.fields_terminated_by.as_deref(),
            file.enclosed_by.as_deref(),
            file.lines_terminated_by.as_deref(),
        );
        if let Some(n) = file.ignore_lines {
            sql.push_str(&format!(" IGNORE {n} LINES"));
        }
        if !file.columns.is_empty() {
            sql.push_str(&format!(" ({})", self.columnize(&file.columns)));
        }
        Ok(sql)
    }
}
