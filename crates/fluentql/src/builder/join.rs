//! Join clauses.

use crate::builder::state::{Boolean, Predicate};
use crate::operator::Operator;
use crate::param::{Param, collect_params};
use crate::resolve;
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

/// A join: type, table and its own condition list.
///
/// Conditions comparing a column to a literal record their bindings here; the
/// owning builder copies them into its join slot when the join is added.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub conditions: Vec<Predicate>,
    bindings: Vec<Value>,
    operators: &'static [&'static str],
    error: Option<String>,
}

impl JoinClause {
    pub(crate) fn new(
        join_type: JoinType,
        table: impl Into<String>,
        operators: &'static [&'static str],
    ) -> Self {
        Self {
            join_type,
            table: table.into(),
            conditions: Vec::new(),
            bindings: Vec::new(),
            operators,
            error: None,
        }
    }

    pub fn bindings(&self) -> &[Value] {
        &self.bindings
    }

    /// First invalid condition added, handed to the owning builder.
    pub(crate) fn take_error(&mut self) -> Option<String> {
        self.error.take()
    }

    /// `ON first op second`
    pub fn on(&mut self, first: &str, operator: &str, second: &str) -> &mut Self {
        self.push_on(first, operator, second, Boolean::And)
    }

    pub fn or_on(&mut self, first: &str, operator: &str, second: &str) -> &mut Self {
        self.push_on(first, operator, second, Boolean::Or)
    }

    /// `column op ?` inside the join condition.
    pub fn where_(&mut self, column: &str, operator: &str, value: impl Into<Param>) -> &mut Self {
        self.push_where(column, operator, value.into(), Boolean::And)
    }

    pub fn or_where(&mut self, column: &str, operator: &str, value: impl Into<Param>) -> &mut Self {
        self.push_where(column, operator, value.into(), Boolean::Or)
    }

    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.conditions.push(Predicate::Null {
            column: column.to_string(),
            negated: false,
            boolean: Boolean::And,
        });
        self
    }

    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.conditions.push(Predicate::Null {
            column: column.to_string(),
            negated: true,
            boolean: Boolean::And,
        });
        self
    }

    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        let values = collect_params(values);
        for value in &values {
            value.collect_into(&mut self.bindings);
        }
        self.conditions.push(Predicate::In {
            column: column.to_string(),
            values,
            negated: false,
            boolean: Boolean::And,
        });
        self
    }

    fn push_on(
        &mut self,
        first: &str,
        operator: &str,
        second: &str,
        boolean: Boolean,
    ) -> &mut Self {
        let (operator, second) = match Operator::parse(operator, self.operators) {
            Some(op) => (op, second),
            None => (Operator::EQ, operator),
        };
        self.conditions.push(Predicate::Column {
            first: first.to_string(),
            operator,
            second: second.to_string(),
            boolean,
        });
        self
    }

    fn push_where(
        &mut self,
        column: &str,
        operator: &str,
        value: Param,
        boolean: Boolean,
    ) -> &mut Self {
        let (operator, value) = resolve::resolve_operator(operator, value, self.operators);
        if value.is_list() {
            if self.error.is_none() {
                self.error = Some(format!("list value compared with `{column}` outside IN"));
            }
            return self;
        }
        let predicate = resolve::null_rewrite(column.to_string(), operator, value, boolean);
        if let Predicate::Basic { value, .. } = &predicate {
            value.collect_into(&mut self.bindings);
        }
        self.conditions.push(predicate);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_contributes_no_bindings() {
        let mut join = JoinClause::new(JoinType::Inner, "contacts", &[]);
        join.on("users.id", "=", "contacts.user_id")
            .or_on("users.id", "contacts.owner_id", "");
        assert!(join.bindings().is_empty());
        assert_eq!(join.conditions.len(), 2);
        assert!(matches!(
            &join.conditions[1],
            Predicate::Column { second, operator, boolean: Boolean::Or, .. }
                if second == "contacts.owner_id" && *operator == Operator::EQ
        ));
    }

    #[test]
    fn test_where_contributes_one_binding_each() {
        let mut join = JoinClause::new(JoinType::Left, "contacts", &[]);
        join.on("users.id", "=", "contacts.user_id")
            .where_("contacts.kind", "=", "email")
            .where_in("contacts.state", [1, 2]);
        assert_eq!(
            join.bindings(),
            &[Value::from("email"), Value::Int(1), Value::Int(2)]
        );
    }

    #[test]
    fn test_where_null_value_has_no_binding() {
        let mut join = JoinClause::new(JoinType::Inner, "contacts", &[]);
        join.where_("contacts.deleted_at", "=", None::<i64>);
        assert!(join.bindings().is_empty());
        assert!(matches!(join.conditions[0], Predicate::Null { negated: false, .. }));
    }

    #[test]
    fn test_null_condition_keeps_later_bindings_aligned() {
        let mut join = JoinClause::new(JoinType::Left, "contacts", &[]);
        join.on("users.id", "=", "contacts.user_id")
            .where_("contacts.deleted_at", "=", None::<i64>)
            .where_("contacts.kind", "=", "email");
        assert_eq!(join.bindings(), &[Value::from("email")]);
        assert_eq!(join.conditions.len(), 3);
    }

    #[test]
    fn test_list_value_is_rejected() {
        let mut join = JoinClause::new(JoinType::Inner, "contacts", &[]);
        join.where_("contacts.id", "=", Value::List(vec![Value::Int(1)]));
        assert!(join.conditions.is_empty());
        assert!(join.bindings().is_empty());
        assert!(join.take_error().is_some());
        assert!(join.take_error().is_none());
    }
}
