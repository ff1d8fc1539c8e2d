//! Shorthand argument resolution.
//!
//! Each rule is a separate function so the builder's fluent methods stay thin:
//!
//! - [`expand_map`]: `{a: 1, b: 2}` becomes one AND-connected nested group.
//! - [`pair`]: `(column, value)` means `column = value`.
//! - [`resolve_operator`]: an operator outside the allow-list is the value, `=` is used.
//! - [`null_rewrite`]: an absent value turns into `IS NULL` / `IS NOT NULL`.

use crate::builder::state::{Boolean, Predicate};
use crate::operator::Operator;
use crate::param::Param;

/// Resolve the explicit `(operator, value)` form.
///
/// When `operator` is not an allowed operator it is taken as the value and the
/// operator becomes `=`; the supplied `value` is discarded in that case.
pub fn resolve_operator(operator: &str, value: Param, extra: &[&'static str]) -> (Operator, Param) {
    match Operator::parse(operator, extra) {
        Some(op) => (op, value),
        None => (Operator::EQ, Param::from(operator)),
    }
}

/// Build a comparison, rewriting `NULL` values into null checks.
///
/// A negating operator (`!=`, `<>`, `not like`, ...) yields `IS NOT NULL`.
pub fn null_rewrite(
    column: String,
    operator: Operator,
    value: Param,
    boolean: Boolean,
) -> Predicate {
    if value.is_null() {
        return Predicate::Null {
            column,
            negated: operator.is_negation(),
            boolean,
        };
    }
    Predicate::Basic {
        column,
        operator,
        value,
        boolean,
    }
}

/// Two-argument form: `column = value`.
pub fn pair(column: impl Into<String>, value: Param, boolean: Boolean) -> Predicate {
    null_rewrite(column.into(), Operator::EQ, value, boolean)
}

/// Mapping form: one nested group of `column = value` predicates joined by AND.
///
/// Returns `None` for an empty mapping.
pub fn expand_map<I, K, V>(pairs: I, boolean: Boolean) -> Option<Predicate>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Param>,
{
    let predicates: Vec<Predicate> = pairs
        .into_iter()
        .map(|(column, value)| pair(column, value.into(), Boolean::And))
        .collect();

    if predicates.is_empty() {
        None
    } else {
        Some(Predicate::Nested { predicates, boolean })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_invalid_operator_becomes_value() {
        let (op, value) = resolve_operator("bob", Param::from(99), &[]);
        assert_eq!(op, Operator::EQ);
        assert_eq!(value, Param::from("bob"));
    }

    #[test]
    fn test_valid_operator_keeps_value() {
        let (op, value) = resolve_operator(">", Param::from(18), &[]);
        assert_eq!(op, Operator::GT);
        assert_eq!(value, Param::from(18));
    }

    #[test]
    fn test_dialect_operator_needs_extra_list() {
        let (op, _) = resolve_operator("ilike", Param::from("a%"), &["ilike"]);
        assert_eq!(op.as_str(), "ilike");
    }

    #[test]
    fn test_null_rewrite() {
        let eq = null_rewrite("deleted_at".into(), Operator::EQ, Param::from(Value::Null), Boolean::And);
        assert_eq!(
            eq,
            Predicate::Null {
                column: "deleted_at".into(),
                negated: false,
                boolean: Boolean::And,
            }
        );

        let ne = null_rewrite("deleted_at".into(), Operator::NE, Param::from(None::<i64>), Boolean::Or);
        assert_eq!(
            ne,
            Predicate::Null {
                column: "deleted_at".into(),
                negated: true,
                boolean: Boolean::Or,
            }
        );
    }

    #[test]
    fn test_pair_defaults_to_equality() {
        assert_eq!(
            pair("id", Param::from(1), Boolean::And),
            Predicate::Basic {
                column: "id".into(),
                operator: Operator::EQ,
                value: Param::from(1),
                boolean: Boolean::And,
            }
        );
    }

    #[test]
    fn test_expand_map() {
        let group = expand_map([("a", 1), ("b", 2)], Boolean::Or).unwrap();
        let Predicate::Nested { predicates, boolean } = group else {
            panic!("expected nested group");
        };
        assert_eq!(boolean, Boolean::Or);
        assert_eq!(predicates.len(), 2);
        assert!(predicates.iter().all(|p| p.boolean() == Boolean::And));

        assert!(expand_map(Vec::<(&str, i32)>::new(), Boolean::And).is_none());
    }
}
