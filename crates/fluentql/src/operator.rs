//! Comparison / pattern / bitwise operator allow-list.
//!
//! Operators are never spliced into SQL from user input directly: they are first
//! matched against [`BASE_OPERATORS`] plus the active grammar's extra operators, and
//! the canonical `&'static str` from the list is what gets emitted.

use std::fmt;

/// Operators every grammar accepts.
pub const BASE_OPERATORS: &[&str] = &[
    "=", "<", ">", "<=", ">=", "<>", "!=", "like", "not like", "&", "|", "^", "<<", ">>",
];

/// A validated operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Operator(&'static str);

impl Operator {
    pub const EQ: Operator = Operator("=");
    pub const NE: Operator = Operator("!=");
    pub const GT: Operator = Operator(">");
    pub const GTE: Operator = Operator(">=");
    pub const LT: Operator = Operator("<");
    pub const LTE: Operator = Operator("<=");
    pub const LIKE: Operator = Operator("like");

    /// Match `op` (case-insensitively, surrounding whitespace ignored) against the
    /// base list and `extra`.
    pub fn parse(op: &str, extra: &[&'static str]) -> Option<Operator> {
        let wanted = op.trim().to_ascii_lowercase();
        BASE_OPERATORS
            .iter()
            .chain(extra.iter())
            .find(|candidate| **candidate == wanted)
            .map(|candidate| Operator(candidate))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Whether the operator denotes negation (`!=`, `<>`, `not like`, `!~`, ...).
    pub fn is_negation(&self) -> bool {
        self.0 == "<>" || self.0.starts_with('!') || self.0.starts_with("not ")
    }
}

impl fmt::Display for Operator {
    /// Keyword operators are rendered upper-case (`NOT LIKE`), symbols as-is.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.chars().any(|c| c.is_ascii_alphabetic()) {
            f.write_str(&self.0.to_ascii_uppercase())
        } else {
            f.write_str(self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Operator::parse(" LIKE ", &[]), Some(Operator::LIKE));
        assert_eq!(Operator::parse("Not Like", &[]).map(|o| o.as_str()), Some("not like"));
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        assert_eq!(Operator::parse("drop table", &[]), None);
        assert_eq!(Operator::parse("ilike", &[]), None);
        assert!(Operator::parse("ilike", &["ilike"]).is_some());
    }

    #[test]
    fn test_negation() {
        assert!(Operator::NE.is_negation());
        assert!(Operator::parse("<>", &[]).unwrap().is_negation());
        assert!(Operator::parse("not like", &[]).unwrap().is_negation());
        assert!(Operator::parse("!~", &["!~"]).unwrap().is_negation());
        assert!(!Operator::EQ.is_negation());
        assert!(!Operator::LIKE.is_negation());
    }

    #[test]
    fn test_display() {
        assert_eq!(Operator::parse("not like", &[]).unwrap().to_string(), "NOT LIKE");
        assert_eq!(Operator::GTE.to_string(), ">=");
    }
}
