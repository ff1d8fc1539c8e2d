//! Backend-agnostic bound values.
//!
//! [`Value`] is what ends up in the binding store and is handed to a
//! [`Connection`](crate::Connection) next to the compiled SQL. It also implements
//! `tokio_postgres`'s `ToSql`/`FromSql` so it can be bound and decoded directly.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};
use uuid::Uuid;

/// A single value destined for a positional placeholder.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// SQL NULL.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<Utc>),
    Time(NaiveTime),
    Uuid(Uuid),
    Json(serde_json::Value),
    /// A list of values. Lists are flattened when bindings are collected, one
    /// placeholder per leaf.
    List(Vec<Value>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Lossy integer view used for aggregate results.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) => Some(*v as i64),
            Value::Decimal(d) => i64::try_from(d.trunc()).ok(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Lossy float view used for aggregate results.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Decimal(d) => f64::try_from(*d).ok(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Append this value to `out`, expanding nested lists depth-first.
    pub fn flatten_into(&self, out: &mut Vec<Value>) {
        match self {
            Value::List(items) => items.iter().for_each(|item| item.flatten_into(out)),
            other => out.push(other.clone()),
        }
    }

    /// Number of leaf values after flattening.
    pub fn leaf_count(&self) -> usize {
        match self {
            Value::List(items) => items.iter().map(Value::leaf_count).sum(),
            _ => 1,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::DateTimeTz(dt) => write!(f, "{dt}"),
            Self::Time(t) => write!(f, "{t}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Json(j) => write!(f, "{j}"),
            Self::List(vals) => {
                write!(f, "[")?;
                for (i, v) in vals.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

// ── From implementations ───────────────────────────────────────────────

macro_rules! value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    Decimal => Decimal,
    String => String,
    &str => String,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    DateTime<Utc> => DateTimeTz,
    NaiveTime => Time,
    Uuid => Uuid,
    serde_json::Value => Json,
    Vec<Value> => List,
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::String(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ── tokio-postgres integration ─────────────────────────────────────────

type BoxError = Box<dyn Error + Sync + Send>;

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::Int(v) => int_to_sql(*v, ty, out),
            Value::Float(v) => {
                if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else if *ty == Type::NUMERIC {
                    Decimal::try_from(*v)?.to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Decimal(d) => d.to_sql(ty, out),
            Value::String(s) => s.to_sql(ty, out),
            Value::Bytes(b) => b.to_sql(ty, out),
            Value::Date(d) => d.to_sql(ty, out),
            Value::DateTime(dt) => dt.to_sql(ty, out),
            Value::DateTimeTz(dt) => dt.to_sql(ty, out),
            Value::Time(t) => t.to_sql(ty, out),
            Value::Uuid(u) => u.to_sql(ty, out),
            Value::Json(j) => j.to_sql(ty, out),
            Value::List(items) => items.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Integers are narrowed or widened to whatever the server inferred for the slot.
fn int_to_sql(v: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::INT2 {
        i16::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::FLOAT4 {
        (v as f32).to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        (v as f64).to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        Decimal::from(v).to_sql(ty, out)
    } else if *ty == Type::TEXT || *ty == Type::VARCHAR {
        v.to_string().to_sql(ty, out)
    } else {
        v.to_sql(ty, out)
    }
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        if let Kind::Array(_) = ty.kind() {
            return Ok(Value::List(Vec::<Value>::from_sql(ty, raw)?));
        }

        let value = if *ty == Type::BOOL {
            Value::Bool(bool::from_sql(ty, raw)?)
        } else if *ty == Type::INT2 {
            Value::Int(i16::from_sql(ty, raw)?.into())
        } else if *ty == Type::INT4 {
            Value::Int(i32::from_sql(ty, raw)?.into())
        } else if *ty == Type::INT8 {
            Value::Int(i64::from_sql(ty, raw)?)
        } else if *ty == Type::OID {
            Value::Int(u32::from_sql(ty, raw)?.into())
        } else if *ty == Type::FLOAT4 {
            Value::Float(f32::from_sql(ty, raw)?.into())
        } else if *ty == Type::FLOAT8 {
            Value::Float(f64::from_sql(ty, raw)?)
        } else if *ty == Type::NUMERIC {
            Value::Decimal(Decimal::from_sql(ty, raw)?)
        } else if *ty == Type::TEXT
            || *ty == Type::VARCHAR
            || *ty == Type::BPCHAR
            || *ty == Type::NAME
            || *ty == Type::UNKNOWN
        {
            Value::String(String::from_sql(ty, raw)?)
        } else if *ty == Type::BYTEA {
            Value::Bytes(Vec::<u8>::from_sql(ty, raw)?)
        } else if *ty == Type::DATE {
            Value::Date(NaiveDate::from_sql(ty, raw)?)
        } else if *ty == Type::TIMESTAMP {
            Value::DateTime(NaiveDateTime::from_sql(ty, raw)?)
        } else if *ty == Type::TIMESTAMPTZ {
            Value::DateTimeTz(DateTime::<Utc>::from_sql(ty, raw)?)
        } else if *ty == Type::TIME {
            Value::Time(NaiveTime::from_sql(ty, raw)?)
        } else if *ty == Type::UUID {
            Value::Uuid(Uuid::from_sql(ty, raw)?)
        } else if *ty == Type::JSON || *ty == Type::JSONB {
            Value::Json(serde_json::Value::from_sql(ty, raw)?)
        } else {
            return Err(format!("unsupported column type '{ty}'").into());
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Value::Null)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_scalars() {
        assert_eq!(Value::from(42_i32), Value::Int(42));
        assert_eq!(Value::from("a"), Value::String("a".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(true)), Value::Bool(true));
    }

    #[test]
    fn test_flatten_nested_lists() {
        let v = Value::List(vec![
            Value::Int(1),
            Value::List(vec![Value::Int(2), Value::List(vec![Value::Int(3)])]),
        ]);
        let mut out = Vec::new();
        v.flatten_into(&mut out);
        assert_eq!(out, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(v.leaf_count(), 3);
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::String(" 7 ".into()).as_i64(), Some(7));
        assert_eq!(Value::Decimal(Decimal::new(255, 1)).as_f64(), Some(25.5));
        assert_eq!(Value::Null.as_i64(), None);
    }
}
