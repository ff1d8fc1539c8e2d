#![allow(dead_code)]

use fluentql::{Connection, QueryResult, Row, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One statement the mock was asked to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub bindings: Vec<Value>,
}

/// Connection that records every statement and answers queries from a queue of
/// canned result sets.
#[derive(Default)]
pub struct MockConnection {
    calls: Mutex<Vec<Call>>,
    results: Mutex<VecDeque<Vec<Row>>>,
    affected: u64,
    last_id: Value,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn with_last_id(mut self, id: impl Into<Value>) -> Self {
        self.last_id = id.into();
        self
    }

    /// Queue the rows returned by the next `query` call.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.results.lock().unwrap().push_back(rows);
    }

    /// Queue a one-row `aggregate` result.
    pub fn push_aggregate(&self, value: impl Into<Value>) {
        self.push_rows(vec![Row::new(vec!["aggregate".into()], vec![value.into()])]);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.sql).collect()
    }

    fn record(&self, sql: &str, bindings: &[Value]) {
        self.calls.lock().unwrap().push(Call {
            sql: sql.to_string(),
            bindings: bindings.to_vec(),
        });
    }
}

impl Connection for MockConnection {
    async fn query(&self, sql: &str, bindings: &[Value]) -> QueryResult<Vec<Row>> {
        self.record(sql, bindings);
        Ok(self.results.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn execute(&self, sql: &str, bindings: &[Value]) -> QueryResult<u64> {
        self.record(sql, bindings);
        Ok(self.affected)
    }

    async fn last_insert_id(&self, _sequence: Option<&str>) -> QueryResult<Value> {
        Ok(self.last_id.clone())
    }
}

pub fn user_row(id: i64, name: &str) -> Row {
    Row::new(
        vec!["id".into(), "name".into()],
        vec![Value::Int(id), Value::from(name)],
    )
}
