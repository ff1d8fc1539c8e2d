//! INSERT / UPDATE / DELETE and friends.
//!
//! Every executing method has a `to_*_sql` counterpart returning the
//! [`Compiled`] statement without running it.

use super::Builder;
use super::state::InfileSpec;
use crate::bindings::BindingKind;
use crate::connection::Connection;
use crate::error::{QueryError, QueryResult};
use crate::expression::Expression;
use crate::grammar::{Compiled, require_table};
use crate::log::{StatementKind, log_statement};
use crate::record::{Record, Records, UpsertUpdate};
use crate::value::Value;

impl Builder {
    fn table_name(&self, operation: &str) -> QueryResult<&str> {
        self.check_build_error()?;
        require_table(&self.state, operation)
    }

    async fn run(
        &self,
        conn: &impl Connection,
        kind: StatementKind,
        compiled: &Compiled,
    ) -> QueryResult<u64> {
        log_statement(&self.config, kind, &compiled.sql, compiled.bindings.len());
        conn.execute(&compiled.sql, &compiled.bindings).await
    }

    // ==================== INSERT ====================

    pub fn to_insert_sql(&self, records: impl Into<Records>) -> QueryResult<Compiled> {
        let table = self.table_name("insert")?;
        let batch = records.into().into_batch()?;
        let sql = self.grammar.compile_insert(table, &batch)?;
        Ok(Compiled::new(sql, batch.bindings()))
    }

    /// Insert one record or a batch. An empty batch runs nothing and returns 0.
    ///
    /// ```ignore
    /// db.table("users")
    ///     .insert(&client, vec![
    ///         Record::new().set("id", 1).set("name", "a"),
    ///         Record::new().set("id", 2).set("name", "b"),
    ///     ])
    ///     .await?;
    /// ```
    pub async fn insert(
        &self,
        conn: &impl Connection,
        records: impl Into<Records>,
    ) -> QueryResult<u64> {
        let records = records.into();
        if matches!(&records, Records::Many(rs) if rs.is_empty()) {
            return Ok(0);
        }
        let compiled = self.to_insert_sql(records)?;
        self.run(conn, StatementKind::Insert, &compiled).await
    }

    pub fn to_insert_get_id_sql(
        &self,
        record: Record,
        sequence: Option<&str>,
    ) -> QueryResult<Compiled> {
        let table = self.table_name("insert")?;
        let batch = Records::from(record).into_batch()?;
        let sql = self.grammar.compile_insert_get_id(table, &batch, sequence)?;
        Ok(Compiled::new(sql, batch.bindings()))
    }

    /// Insert one record and return its generated key.
    pub async fn insert_get_id(
        &self,
        conn: &impl Connection,
        record: Record,
        sequence: Option<&str>,
    ) -> QueryResult<Value> {
        let compiled = self.to_insert_get_id_sql(record, sequence)?;
        if self.grammar.returns_inserted_id() {
            log_statement(
                &self.config,
                StatementKind::Insert,
                &compiled.sql,
                compiled.bindings.len(),
            );
            let rows = conn.query(&compiled.sql, &compiled.bindings).await?;
            return rows
                .into_iter()
                .next()
                .and_then(|row| row.into_values().into_iter().next())
                .ok_or_else(|| QueryError::not_found("insert returned no key"));
        }
        self.run(conn, StatementKind::Insert, &compiled).await?;
        conn.last_insert_id(sequence).await
    }

    pub fn to_insert_ignore_sql(&self, records: impl Into<Records>) -> QueryResult<Compiled> {
        let table = self.table_name("insert")?;
        let batch = records.into().into_batch()?;
        let sql = self.grammar.compile_insert_ignore(table, &batch)?;
        Ok(Compiled::new(sql, batch.bindings()))
    }

    /// Insert, skipping rows that collide with a unique key.
    pub async fn insert_ignore(
        &self,
        conn: &impl Connection,
        records: impl Into<Records>,
    ) -> QueryResult<u64> {
        let compiled = self.to_insert_ignore_sql(records)?;
        self.run(conn, StatementKind::Insert, &compiled).await
    }

    pub fn to_replace_sql(&self, records: impl Into<Records>) -> QueryResult<Compiled> {
        let table = self.table_name("replace")?;
        let batch = records.into().into_batch()?;
        let sql = self.grammar.compile_replace(table, &batch)?;
        Ok(Compiled::new(sql, batch.bindings()))
    }

    /// Insert, replacing rows that collide with a unique key (MySQL, SQLite).
    pub async fn replace(
        &self,
        conn: &impl Connection,
        records: impl Into<Records>,
    ) -> QueryResult<u64> {
        let compiled = self.to_replace_sql(records)?;
        self.run(conn, StatementKind::Insert, &compiled).await
    }

    pub fn to_insert_select_sql<I, S>(
        &mut self,
        columns: I,
        f: impl FnOnce(&mut Builder),
    ) -> QueryResult<Compiled>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let base = self.fork();
        let sub = self.build_sub(base, f);
        let table = self.table_name("insert")?;
        let sql = self.grammar.compile_insert_select(table, &columns, &sub.state)?;
        Ok(Compiled::new(sql, sub.bindings()))
    }

    /// `INSERT INTO table (columns) SELECT ...` with the select built by `f`.
    pub async fn insert_select<I, S>(
        &mut self,
        conn: &impl Connection,
        columns: I,
        f: impl FnOnce(&mut Builder),
    ) -> QueryResult<u64>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let compiled = self.to_insert_select_sql(columns, f)?;
        self.run(conn, StatementKind::Insert, &compiled).await
    }

    pub fn to_upsert_sql(
        &self,
        records: impl Into<Records>,
        conflict_columns: &[&str],
        update: impl Into<UpsertUpdate>,
    ) -> QueryResult<Compiled> {
        let table = self.table_name("upsert")?;
        let batch = records.into().into_batch()?;
        let update = update.into();
        if let UpsertUpdate::Values(values) = &update {
            values.ensure_scalar()?;
        }
        let conflict: Vec<String> = conflict_columns.iter().map(|c| c.to_string()).collect();
        let sql = self.grammar.compile_upsert(table, &batch, &conflict, &update)?;

        let mut bindings = batch.bindings();
        bindings.extend(update.bindings());
        Ok(Compiled::new(sql, bindings))
    }

    /// Insert, updating the existing row when `conflict_columns` collide.
    ///
    /// `update` is either a list of columns copied from the new row or a [`Record`]
    /// of explicit assignments.
    pub async fn upsert(
        &self,
        conn: &impl Connection,
        records: impl Into<Records>,
        conflict_columns: &[&str],
        update: impl Into<UpsertUpdate>,
    ) -> QueryResult<u64> {
        let compiled = self.to_upsert_sql(records, conflict_columns, update)?;
        self.run(conn, StatementKind::Insert, &compiled).await
    }

    // ==================== UPDATE ====================

    /// Bindings: join slot, assigned values, then where and order slots.
    pub fn to_update_sql(&self, values: &Record) -> QueryResult<Compiled> {
        self.check_build_error()?;
        values.ensure_scalar()?;
        let sql = self.grammar.compile_update(&self.state, values)?;

        let mut bindings = self.bindings.flatten_kinds(&[BindingKind::Join]);
        bindings.extend(values.bindings());
        bindings.extend(
            self.bindings
                .flatten_kinds(&[BindingKind::Where, BindingKind::Order]),
        );
        Ok(Compiled::new(sql, bindings))
    }

    pub async fn update(&self, conn: &impl Connection, values: Record) -> QueryResult<u64> {
        let compiled = self.to_update_sql(&values)?;
        self.run(conn, StatementKind::Update, &compiled).await
    }

    /// `SET column = column + amount` plus any `extra` assignments.
    pub async fn increment(
        &self,
        conn: &impl Connection,
        column: &str,
        amount: impl Into<Value>,
        extra: Record,
    ) -> QueryResult<u64> {
        let values = self.step_record(column, amount.into(), '+', extra)?;
        self.update(conn, values).await
    }

    pub async fn decrement(
        &self,
        conn: &impl Connection,
        column: &str,
        amount: impl Into<Value>,
        extra: Record,
    ) -> QueryResult<u64> {
        let values = self.step_record(column, amount.into(), '-', extra)?;
        self.update(conn, values).await
    }

    pub fn to_increment_sql(
        &self,
        column: &str,
        amount: impl Into<Value>,
        extra: Record,
    ) -> QueryResult<Compiled> {
        let values = self.step_record(column, amount.into(), '+', extra)?;
        self.to_update_sql(&values)
    }

    pub fn to_decrement_sql(
        &self,
        column: &str,
        amount: impl Into<Value>,
        extra: Record,
    ) -> QueryResult<Compiled> {
        let values = self.step_record(column, amount.into(), '-', extra)?;
        self.to_update_sql(&values)
    }

    fn step_record(
        &self,
        column: &str,
        amount: Value,
        sign: char,
        extra: Record,
    ) -> QueryResult<Record> {
        if !matches!(amount, Value::Int(_) | Value::Float(_) | Value::Decimal(_)) {
            return Err(QueryError::invalid_argument(format!(
                "non-numeric value passed to increment/decrement: {amount:?}"
            )));
        }
        let wrapped = self.grammar.wrap(column);
        let mut values = Record::new().set(
            column,
            Expression::new(format!("{wrapped} {sign} {amount}")),
        );
        for (name, value) in extra.iter() {
            values.insert(name, value.clone());
        }
        Ok(values)
    }

    // ==================== DELETE / TRUNCATE ====================

    pub fn to_delete_sql(&self) -> QueryResult<Compiled> {
        self.check_build_error()?;
        let sql = self.grammar.compile_delete(&self.state)?;
        let bindings = self.bindings.flatten_kinds(&[
            BindingKind::Join,
            BindingKind::Where,
            BindingKind::Order,
        ]);
        Ok(Compiled::new(sql, bindings))
    }

    pub async fn delete(&self, conn: &impl Connection) -> QueryResult<u64> {
        let compiled = self.to_delete_sql()?;
        self.run(conn, StatementKind::Delete, &compiled).await
    }

    pub fn to_truncate_sql(&self) -> QueryResult<Vec<Compiled>> {
        let table = self.table_name("truncate")?;
        self.grammar.compile_truncate(table)
    }

    /// Empty the table, running the dialect's statements in order.
    pub async fn truncate(&self, conn: &impl Connection) -> QueryResult<()> {
        for compiled in self.to_truncate_sql()? {
            self.run(conn, StatementKind::Truncate, &compiled).await?;
        }
        Ok(())
    }

    // ==================== File import ====================

    pub fn to_infile_sql(&self, file: &InfileSpec) -> QueryResult<Compiled> {
        let table = self.table_name("load data infile")?;
        let sql = self.grammar.compile_infile(table, file)?;
        Ok(Compiled::new(sql, Vec::new()))
    }

    /// Bulk-load a server or client file into the table (MySQL only).
    pub async fn load_infile(&self, conn: &impl Connection, file: &InfileSpec) -> QueryResult<u64> {
        let compiled = self.to_infile_sql(file)?;
        self.run(conn, StatementKind::Infile, &compiled).await
    }
}
