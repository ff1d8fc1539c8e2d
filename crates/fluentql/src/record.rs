//! Column/value records for insert, update and upsert.

use crate::error::{QueryError, QueryResult};
use crate::param::Param;
use crate::value::Value;

/// An ordered set of `column => value` assignments.
///
/// ```ignore
/// use fluentql::{raw, Record};
///
/// let user = Record::new()
///     .set("name", "alice")
///     .set("age", 30)
///     .set("created_at", raw("CURRENT_TIMESTAMP"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Param)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, replacing an earlier assignment to the same column in place.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Param>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Param>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Param> {
        self.entries.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bound values in column order, expressions skipped.
    pub fn bindings(&self) -> Vec<Value> {
        let mut out = Vec::new();
        for (_, value) in &self.entries {
            value.collect_into(&mut out);
        }
        out
    }

    /// Fails when a column is assigned a list value.
    pub(crate) fn ensure_scalar(&self) -> QueryResult<()> {
        match self.entries.iter().find(|(_, v)| v.is_list()) {
            Some((column, _)) => Err(QueryError::invalid_argument(format!(
                "list value assigned to `{column}`"
            ))),
            None => Ok(()),
        }
    }

    fn take(&mut self, column: &str) -> Option<Param> {
        let pos = self.entries.iter().position(|(c, _)| c == column)?;
        Some(self.entries.remove(pos).1)
    }
}

impl<K: Into<String>, V: Into<Param>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

/// One record or many; normalized into a [`Batch`] before compilation.
#[derive(Clone, Debug, PartialEq)]
pub enum Records {
    One(Record),
    Many(Vec<Record>),
}

impl From<Record> for Records {
    fn from(r: Record) -> Self {
        Records::One(r)
    }
}

impl From<Vec<Record>> for Records {
    fn from(rs: Vec<Record>) -> Self {
        Records::Many(rs)
    }
}

impl<const N: usize> From<[Record; N]> for Records {
    fn from(rs: [Record; N]) -> Self {
        Records::Many(rs.into())
    }
}

impl Records {
    /// Normalize into the batch shape.
    ///
    /// Every record must carry the first record's columns; values are reordered to
    /// that column order.
    pub fn into_batch(self) -> QueryResult<Batch> {
        let records = match self {
            Records::One(r) => vec![r],
            Records::Many(rs) => rs,
        };

        let mut iter = records.into_iter();
        let Some(first) = iter.next() else {
            return Ok(Batch::default());
        };
        first.ensure_scalar()?;

        let columns: Vec<String> = first.columns().map(str::to_string).collect();
        let mut rows = vec![first.entries.into_iter().map(|(_, v)| v).collect::<Vec<_>>()];

        for (index, mut record) in iter.enumerate() {
            if record.len() != columns.len() {
                return Err(mismatch(index + 1));
            }
            record.ensure_scalar()?;
            let mut row = Vec::with_capacity(columns.len());
            for column in &columns {
                row.push(record.take(column).ok_or_else(|| mismatch(index + 1))?);
            }
            rows.push(row);
        }

        Ok(Batch { columns, rows })
    }
}

fn mismatch(index: usize) -> QueryError {
    QueryError::invalid_argument(format!(
        "record {index} does not have the same columns as the first record"
    ))
}

/// Records sharing one column list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Batch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Param>>,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row-major bindings, expressions skipped.
    pub fn bindings(&self) -> Vec<Value> {
        let mut out = Vec::new();
        for row in &self.rows {
            for value in row {
                value.collect_into(&mut out);
            }
        }
        out
    }
}

/// What an upsert assigns when the conflict target already exists.
#[derive(Clone, Debug, PartialEq)]
pub enum UpsertUpdate {
    /// Copy these columns from the row that failed to insert.
    Columns(Vec<String>),
    /// Explicit assignments.
    Values(Record),
}

impl UpsertUpdate {
    pub fn is_empty(&self) -> bool {
        match self {
            UpsertUpdate::Columns(c) => c.is_empty(),
            UpsertUpdate::Values(r) => r.is_empty(),
        }
    }

    pub fn bindings(&self) -> Vec<Value> {
        match self {
            UpsertUpdate::Columns(_) => Vec::new(),
            UpsertUpdate::Values(r) => r.bindings(),
        }
    }
}

impl From<Record> for UpsertUpdate {
    fn from(r: Record) -> Self {
        UpsertUpdate::Values(r)
    }
}

impl From<Vec<String>> for UpsertUpdate {
    fn from(c: Vec<String>) -> Self {
        UpsertUpdate::Columns(c)
    }
}

impl From<Vec<&str>> for UpsertUpdate {
    fn from(c: Vec<&str>) -> Self {
        UpsertUpdate::Columns(c.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for UpsertUpdate {
    fn from(c: &[&str]) -> Self {
        UpsertUpdate::Columns(c.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for UpsertUpdate {
    fn from(c: [&str; N]) -> Self {
        UpsertUpdate::Columns(c.iter().map(|s| s.to_string()).collect())
    }
}
