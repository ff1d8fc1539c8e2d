//! Execution boundary.
//!
//! The builder compiles SQL and collects bindings; a [`Connection`] runs them. The
//! `tokio-postgres` implementations below pair with the Postgres grammar; other
//! drivers implement the trait themselves.

use crate::error::{QueryError, QueryResult};
use crate::expression::Expression;
use crate::row::Row;
use crate::value::Value;
use tokio_postgres::types::ToSql;

/// Something that can run compiled statements.
///
/// Failures are reported as [`QueryError`]s; driver errors keep their cause.
pub trait Connection: Send + Sync {
    /// Run a statement returning rows.
    fn query(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl std::future::Future<Output = QueryResult<Vec<Row>>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        bindings: &[Value],
    ) -> impl std::future::Future<Output = QueryResult<u64>> + Send;

    /// Key generated by the last insert on this connection.
    fn last_insert_id(
        &self,
        sequence: Option<&str>,
    ) -> impl std::future::Future<Output = QueryResult<Value>> + Send;

    /// Wrap raw SQL so it is written verbatim instead of bound.
    fn raw(&self, sql: impl Into<String>) -> Expression {
        Expression::new(sql)
    }
}

fn params(bindings: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    bindings.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

fn convert_rows(rows: Vec<tokio_postgres::Row>) -> QueryResult<Vec<Row>> {
    rows.iter().map(Row::from_pg).collect()
}

async fn pg_last_insert_id<C>(client: &C, sequence: Option<&str>) -> QueryResult<Value>
where
    C: Connection,
{
    let rows = match sequence {
        Some(seq) => {
            client
                .query("SELECT currval($1::text::regclass)", &[Value::from(seq)])
                .await?
        }
        None => client.query("SELECT lastval()", &[]).await?,
    };
    rows.into_iter()
        .next()
        .and_then(|row| row.into_values().into_iter().next())
        .ok_or_else(|| QueryError::not_found("no value generated by the last insert"))
}

impl Connection for tokio_postgres::Client {
    async fn query(&self, sql: &str, bindings: &[Value]) -> QueryResult<Vec<Row>> {
        let rows = tokio_postgres::Client::query(self, sql, &params(bindings))
            .await
            .map_err(QueryError::from_db_error)?;
        convert_rows(rows)
    }

    async fn execute(&self, sql: &str, bindings: &[Value]) -> QueryResult<u64> {
        tokio_postgres::Client::execute(self, sql, &params(bindings))
            .await
            .map_err(QueryError::from_db_error)
    }

    async fn last_insert_id(&self, sequence: Option<&str>) -> QueryResult<Value> {
        pg_last_insert_id(self, sequence).await
    }
}

impl Connection for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, bindings: &[Value]) -> QueryResult<Vec<Row>> {
        let rows = tokio_postgres::Transaction::query(self, sql, &params(bindings))
            .await
            .map_err(QueryError::from_db_error)?;
        convert_rows(rows)
    }

    async fn execute(&self, sql: &str, bindings: &[Value]) -> QueryResult<u64> {
        tokio_postgres::Transaction::execute(self, sql, &params(bindings))
            .await
            .map_err(QueryError::from_db_error)
    }

    async fn last_insert_id(&self, sequence: Option<&str>) -> QueryResult<Value> {
        pg_last_insert_id(self, sequence).await
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::ClientWrapper {
    async fn query(&self, sql: &str, bindings: &[Value]) -> QueryResult<Vec<Row>> {
        Connection::query(&**self, sql, bindings).await
    }

    async fn execute(&self, sql: &str, bindings: &[Value]) -> QueryResult<u64> {
        Connection::execute(&**self, sql, bindings).await
    }

    async fn last_insert_id(&self, sequence: Option<&str>) -> QueryResult<Value> {
        Connection::last_insert_id(&**self, sequence).await
    }
}

#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::Client {
    async fn query(&self, sql: &str, bindings: &[Value]) -> QueryResult<Vec<Row>> {
        // Delegate to the deref target (ClientWrapper).
        Connection::query(&**self, sql, bindings).await
    }

    async fn execute(&self, sql: &str, bindings: &[Value]) -> QueryResult<u64> {
        Connection::execute(&**self, sql, bindings).await
    }

    async fn last_insert_id(&self, sequence: Option<&str>) -> QueryResult<Value> {
        Connection::last_insert_id(&**self, sequence).await
    }
}
