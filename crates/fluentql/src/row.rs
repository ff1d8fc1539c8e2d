//! Backend-agnostic result rows and row mapping.

use crate::error::{QueryError, QueryResult};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// One result row: column names and their values, in select order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row; `columns` and `values` are paired by position.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Convert a `tokio_postgres` row, decoding every column into a [`Value`].
    pub fn from_pg(row: &tokio_postgres::Row) -> QueryResult<Self> {
        let mut columns = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());
        for (i, column) in row.columns().iter().enumerate() {
            let value: Value = row
                .try_get(i)
                .map_err(|e| QueryError::decode(column.name(), e.to_string()))?;
            columns.push(column.name().to_string());
            values.push(value);
        }
        Ok(Self { columns, values })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// Case-insensitive lookup.
    pub fn get_ci(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .and_then(|i| self.values.get(i))
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Typed access, failing with [`QueryError::Decode`].
    pub fn try_get<T: FromValue>(&self, column: &str) -> QueryResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| QueryError::decode(column, "no such column"))?;
        T::from_value(value).map_err(|message| QueryError::decode(column, message))
    }
}

/// Trait for types that can be built from a result row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> QueryResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> QueryResult<Self> {
        Ok(row.clone())
    }
}

/// Conversion out of a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, String>;
}

fn mismatch(expected: &str, value: &Value) -> String {
    format!("expected {expected}, got {value:?}")
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Int(i) => Ok(*i),
            Value::Decimal(_) | Value::String(_) => {
                value.as_i64().ok_or_else(|| mismatch("integer", value))
            }
            other => Err(mismatch("integer", other)),
        }
    }
}

macro_rules! from_value_narrow {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &Value) -> Result<Self, String> {
                    let wide = i64::from_value(value)?;
                    <$t>::try_from(wide).map_err(|e| e.to_string())
                }
            }
        )*
    };
}

from_value_narrow!(i32, i16, u32, u64);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        value.as_f64().ok_or_else(|| mismatch("float", value))
    }
}

impl FromValue for Decimal {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Decimal(d) => Ok(*d),
            Value::Int(i) => Ok(Decimal::from(*i)),
            Value::Float(f) => Decimal::try_from(*f).map_err(|e| e.to_string()),
            Value::String(s) => s.parse().map_err(|e: rust_decimal::Error| e.to_string()),
            other => Err(mismatch("decimal", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch("string", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            other => Err(mismatch("bytes", other)),
        }
    }
}

macro_rules! from_value_variant {
    ($($t:ty => $variant:ident, $name:literal);* $(;)?) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &Value) -> Result<Self, String> {
                    match value {
                        Value::$variant(v) => Ok(v.clone()),
                        other => Err(mismatch($name, other)),
                    }
                }
            }
        )*
    };
}

from_value_variant! {
    NaiveDate => Date, "date";
    NaiveDateTime => DateTime, "timestamp";
    DateTime<Utc> => DateTimeTz, "timestamptz";
    NaiveTime => Time, "time";
    Uuid => Uuid, "uuid";
    serde_json::Value => Json, "json";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::new(
            vec!["id".into(), "Aggregate".into(), "deleted_at".into()],
            vec![Value::Int(7), Value::Decimal(Decimal::new(42, 0)), Value::Null],
        )
    }

    #[test]
    fn test_lookup() {
        let row = row();
        assert_eq!(row.get("id"), Some(&Value::Int(7)));
        assert_eq!(row.get("aggregate"), None);
        assert_eq!(row.get_ci("aggregate"), Some(&Value::Decimal(Decimal::new(42, 0))));
    }

    #[test]
    fn test_typed_access() {
        let row = row();
        assert_eq!(row.try_get::<i32>("id").unwrap(), 7);
        assert_eq!(row.try_get::<Option<String>>("deleted_at").unwrap(), None);
        let err = row.try_get::<String>("id").unwrap_err();
        assert!(matches!(err, QueryError::Decode { ref column, .. } if column == "id"));
        assert!(row.try_get::<i64>("missing").is_err());
    }
}
