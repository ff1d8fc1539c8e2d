//! Fetching, aggregates and pagination.
//!
//! Helpers that temporarily rewrite the builder (aggregate file, select list,
//! ordering, limit/offset) restore it before returning, on failure too.

use super::Builder;
use super::state::{Aggregate, AggregateFunction};
use crate::bindings::BindingKind;
use crate::connection::Connection;
use crate::error::{QueryError, QueryResult};
use crate::log::{StatementKind, log_statement};
use crate::pagination::{Page, PageWindow};
use crate::row::{FromRow, Row};
use crate::value::Value;

impl Builder {
    /// Execute the select and return the raw rows.
    pub async fn get_rows(&self, conn: &impl Connection) -> QueryResult<Vec<Row>> {
        let compiled = self.compile()?;
        log_statement(&self.config, StatementKind::Select, &compiled.sql, compiled.bindings.len());
        conn.query(&compiled.sql, &compiled.bindings).await
    }

    /// Execute the select and map every row.
    pub async fn get<T: FromRow>(&self, conn: &impl Connection) -> QueryResult<Vec<T>> {
        let rows = self.get_rows(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// First row, fetched with `LIMIT 1`. The previous limit is restored.
    pub async fn first<T: FromRow>(&mut self, conn: &impl Connection) -> QueryResult<Option<T>> {
        let saved = self.state.limit.replace(1);
        let result = self.get_rows(conn).await;
        self.state.limit = saved;
        match result?.first() {
            Some(row) => T::from_row(row).map(Some),
            None => Ok(None),
        }
    }

    /// First row or [`QueryError::NotFound`].
    pub async fn first_or_fail<T: FromRow>(&mut self, conn: &impl Connection) -> QueryResult<T> {
        self.first(conn)
            .await?
            .ok_or_else(|| QueryError::not_found("query returned no rows"))
    }

    // ==================== Aggregates ====================

    pub async fn count(&mut self, conn: &impl Connection) -> QueryResult<i64> {
        let value = self.aggregate(conn, AggregateFunction::Count, Vec::new()).await?;
        aggregate_i64(&value)
    }

    pub async fn count_column(&mut self, conn: &impl Connection, column: &str) -> QueryResult<i64> {
        let value = self
            .aggregate(conn, AggregateFunction::Count, vec![column.to_string()])
            .await?;
        aggregate_i64(&value)
    }

    pub async fn min(&mut self, conn: &impl Connection, column: &str) -> QueryResult<Value> {
        self.aggregate(conn, AggregateFunction::Min, vec![column.to_string()])
            .await
    }

    pub async fn max(&mut self, conn: &impl Connection, column: &str) -> QueryResult<Value> {
        self.aggregate(conn, AggregateFunction::Max, vec![column.to_string()])
            .await
    }

    /// `SUM(column)`; an empty set sums to `Int(0)`.
    pub async fn sum(&mut self, conn: &impl Connection, column: &str) -> QueryResult<Value> {
        let value = self
            .aggregate(conn, AggregateFunction::Sum, vec![column.to_string()])
            .await?;
        Ok(if value.is_null() { Value::Int(0) } else { value })
    }

    pub async fn avg(&mut self, conn: &impl Connection, column: &str) -> QueryResult<Value> {
        self.aggregate(conn, AggregateFunction::Avg, vec![column.to_string()])
            .await
    }

    pub async fn exists(&mut self, conn: &impl Connection) -> QueryResult<bool> {
        Ok(self.count(conn).await? > 0)
    }

    /// Install `function`, run the query with a cleared select list and read the
    /// `aggregate` column of the first row.
    async fn aggregate(
        &mut self,
        conn: &impl Connection,
        function: AggregateFunction,
        columns: Vec<String>,
    ) -> QueryResult<Value> {
        let saved_columns = std::mem::take(&mut self.state.columns);
        let saved_bindings = self.bindings.take(BindingKind::Select);
        self.state.aggregate = Some(Aggregate { function, columns });

        let result = self.run_aggregate(conn).await;

        self.state.aggregate = None;
        self.state.columns = saved_columns;
        self.bindings.set(BindingKind::Select, saved_bindings);
        result
    }

    async fn run_aggregate(&self, conn: &impl Connection) -> QueryResult<Value> {
        let compiled = self.compile()?;
        log_statement(
            &self.config,
            StatementKind::Aggregate,
            &compiled.sql,
            compiled.bindings.len(),
        );
        let rows = conn.query(&compiled.sql, &compiled.bindings).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get_ci("aggregate"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    // ==================== Pagination ====================

    /// Count every row matching the current filters, ignoring ordering and the
    /// limit/offset window. Those are restored unchanged afterwards.
    pub async fn total_row_count(&mut self, conn: &impl Connection) -> QueryResult<u64> {
        let orders = std::mem::take(&mut self.state.orders);
        let order_bindings = self.bindings.take(BindingKind::Order);
        let limit = self.state.limit.take();
        let offset = self.state.offset.take();

        let result = self.count(conn).await;

        self.state.orders = orders;
        self.bindings.set(BindingKind::Order, order_bindings);
        self.state.limit = limit;
        self.state.offset = offset;
        tracing::debug!(target: "fluentql", "restored ordering and window after row count");

        Ok(u64::try_from(result?).unwrap_or(0))
    }

    /// Fetch one page.
    ///
    /// `page` below 1 means page 1; `per_page` below 1 falls back to the configured
    /// default. The builder's limit/offset are restored afterwards.
    pub async fn paginate<T: FromRow>(
        &mut self,
        conn: &impl Connection,
        page: u64,
        per_page: u64,
    ) -> QueryResult<Page<T>> {
        let per_page = if per_page < 1 {
            self.config.default_per_page
        } else {
            per_page
        };
        let total = self.total_row_count(conn).await?;
        let window = PageWindow::compute(total, page, per_page);

        let limit = self.state.limit.replace(window.limit());
        let offset = self.state.offset.replace(window.offset());
        let items = self.get::<T>(conn).await;
        self.state.limit = limit;
        self.state.offset = offset;

        Ok(Page {
            items: items?,
            window,
        })
    }
}

fn aggregate_i64(value: &Value) -> QueryResult<i64> {
    if value.is_null() {
        return Ok(0);
    }
    value
        .as_i64()
        .ok_or_else(|| {
            QueryError::decode("aggregate", format!("expected an integer, got {value:?}"))
        })
}
