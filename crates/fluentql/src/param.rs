//! Builder arguments: either a bindable value or a raw expression.

use crate::expression::Expression;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A value passed to a builder method.
///
/// [`Param::Value`] contributes a placeholder and a binding; [`Param::Expr`] is
/// written into the SQL as-is and is skipped by every binding collection.
#[derive(Clone, Debug, PartialEq)]
pub enum Param {
    Value(Value),
    Expr(Expression),
}

impl Param {
    /// `true` for an absent value (`NULL`), which where-clauses rewrite into null checks.
    pub fn is_null(&self) -> bool {
        matches!(self, Param::Value(Value::Null))
    }

    /// `true` for a list value, which only `IN` lists can expand.
    pub fn is_list(&self) -> bool {
        matches!(self, Param::Value(Value::List(_)))
    }

    /// Number of placeholders this argument occupies once compiled.
    pub fn placeholder_count(&self) -> usize {
        match self {
            Param::Value(v) => v.leaf_count(),
            Param::Expr(_) => 0,
        }
    }

    /// Append this argument's bindings (if any) to `out`.
    pub fn collect_into(&self, out: &mut Vec<Value>) {
        if let Param::Value(v) = self {
            v.flatten_into(out);
        }
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        Param::Value(v)
    }
}

impl From<Expression> for Param {
    fn from(e: Expression) -> Self {
        Param::Expr(e)
    }
}

impl<T: Into<Value>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        Param::Value(Value::from(v))
    }
}

macro_rules! param_from_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Param {
                fn from(v: $t) -> Self {
                    Param::Value(Value::from(v))
                }
            }
        )*
    };
}

param_from_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    Decimal,
    String,
    &str,
    &String,
    NaiveDate,
    NaiveDateTime,
    DateTime<Utc>,
    NaiveTime,
    Uuid,
    serde_json::Value,
    Vec<Value>,
);

/// Convert list arguments (e.g. for `IN`) into params.
pub(crate) fn collect_params<I, V>(values: I) -> Vec<Param>
where
    I: IntoIterator<Item = V>,
    V: Into<Param>,
{
    values.into_iter().map(Into::into).collect()
}
