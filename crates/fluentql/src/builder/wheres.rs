//! WHERE and HAVING construction.

use super::Builder;
use super::state::{Boolean, DatePart, Predicate};
use crate::bindings::BindingKind;
use crate::operator::Operator;
use crate::param::{Param, collect_params};
use crate::resolve;
use crate::value::Value;

/// Which predicate forest a call targets.
#[derive(Clone, Copy, Debug)]
enum Target {
    Where,
    Having,
}

impl Target {
    fn kind(self) -> BindingKind {
        match self {
            Target::Where => BindingKind::Where,
            Target::Having => BindingKind::Having,
        }
    }
}

fn param_bindings<'a>(params: impl IntoIterator<Item = &'a Param>) -> Vec<Value> {
    let mut out = Vec::new();
    for param in params {
        param.collect_into(&mut out);
    }
    out
}

impl Builder {
    fn push_predicate(
        &mut self,
        target: Target,
        predicate: Predicate,
        bindings: Vec<Value>,
    ) -> &mut Self {
        self.bindings.extend(target.kind(), bindings);
        match target {
            Target::Where => self.state.wheres.push(predicate),
            Target::Having => self.state.havings.push(predicate),
        }
        self
    }

    /// List values only expand inside `IN`. Records a build error and returns
    /// `true` when any of `params` is one.
    fn reject_list(&mut self, column: &str, params: &[&Param]) -> bool {
        if params.iter().any(|p| p.is_list()) {
            self.fail_list(column);
            return true;
        }
        false
    }

    fn fail_list(&mut self, column: &str) -> &mut Self {
        self.fail(format!("list value compared with `{column}` outside IN"));
        self
    }

    /// Comparison after operator resolution and the null rewrite.
    fn push_comparison(
        &mut self,
        target: Target,
        column: &str,
        operator: Operator,
        value: Param,
        boolean: Boolean,
    ) -> &mut Self {
        if self.reject_list(column, &[&value]) {
            return self;
        }
        let bindings = param_bindings([&value]);
        let predicate = resolve::null_rewrite(column.to_string(), operator, value, boolean);
        let bindings = match predicate {
            Predicate::Null { .. } => Vec::new(),
            _ => bindings,
        };
        self.push_predicate(target, predicate, bindings)
    }

    fn push_op(
        &mut self,
        target: Target,
        column: &str,
        operator: &str,
        value: Param,
        boolean: Boolean,
    ) -> &mut Self {
        let (operator, value) =
            resolve::resolve_operator(operator, value, self.grammar.operators());
        self.push_comparison(target, column, operator, value, boolean)
    }

    fn push_raw(
        &mut self,
        target: Target,
        sql: &str,
        values: Vec<Value>,
        boolean: Boolean,
    ) -> &mut Self {
        let binding_count = self.raw_binding_count(sql, &values);
        let predicate = Predicate::Raw {
            sql: sql.to_string(),
            binding_count,
            boolean,
        };
        self.push_predicate(target, predicate, values)
    }

    fn push_between(
        &mut self,
        target: Target,
        column: &str,
        low: Param,
        high: Param,
        negated: bool,
        boolean: Boolean,
    ) -> &mut Self {
        if self.reject_list(column, &[&low, &high]) {
            return self;
        }
        let bindings = param_bindings([&low, &high]);
        let predicate = Predicate::Between {
            column: column.to_string(),
            low,
            high,
            negated,
            boolean,
        };
        self.push_predicate(target, predicate, bindings)
    }

    fn push_null(
        &mut self,
        target: Target,
        column: &str,
        negated: bool,
        boolean: Boolean,
    ) -> &mut Self {
        let predicate = Predicate::Null {
            column: column.to_string(),
            negated,
            boolean,
        };
        self.push_predicate(target, predicate, Vec::new())
    }

    // ==================== Shorthand forms ====================

    /// `column = value` for every pair, as one AND-connected group.
    ///
    /// ```ignore
    /// q.where_map([("status", "active"), ("role", "admin")]);
    /// // WHERE ("status" = $1 AND "role" = $2)
    /// ```
    pub fn where_map<I, K, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Param>,
    {
        self.push_map(pairs, Boolean::And)
    }

    pub fn or_where_map<I, K, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Param>,
    {
        self.push_map(pairs, Boolean::Or)
    }

    fn push_map<I, K, V>(&mut self, pairs: I, boolean: Boolean) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Param>,
    {
        let Some(group) = resolve::expand_map(pairs, boolean) else {
            return self;
        };
        let mut bindings = Vec::new();
        if let Predicate::Nested { predicates, .. } = &group {
            for predicate in predicates {
                if let Predicate::Basic { column, value, .. } = predicate {
                    if value.is_list() {
                        return self.fail_list(column);
                    }
                    value.collect_into(&mut bindings);
                }
            }
        }
        self.push_predicate(Target::Where, group, bindings)
    }

    /// `column = value`; a `NULL` value becomes `column IS NULL`.
    pub fn where_eq(&mut self, column: &str, value: impl Into<Param>) -> &mut Self {
        self.push_comparison(Target::Where, column, Operator::EQ, value.into(), Boolean::And)
    }

    pub fn or_where_eq(&mut self, column: &str, value: impl Into<Param>) -> &mut Self {
        self.push_comparison(Target::Where, column, Operator::EQ, value.into(), Boolean::Or)
    }

    /// `column op value`.
    ///
    /// An operator outside the allow-list is treated as the value compared with `=`,
    /// and `value` is ignored.
    pub fn where_op(&mut self, column: &str, operator: &str, value: impl Into<Param>) -> &mut Self {
        self.push_op(Target::Where, column, operator, value.into(), Boolean::And)
    }

    pub fn or_where_op(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Param>,
    ) -> &mut Self {
        self.push_op(Target::Where, column, operator, value.into(), Boolean::Or)
    }

    // ==================== Nesting and sub-queries ====================

    /// Parenthesized group built by `f` on a builder for the same table.
    ///
    /// ```ignore
    /// q.where_eq("active", true).where_nested(|q| {
    ///     q.where_op("age", ">", 18).or_where_eq("vip", true);
    /// });
    /// // WHERE "active" = $1 AND ("age" > $2 OR "vip" = $3)
    /// ```
    pub fn where_nested(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_nested(f, Boolean::And)
    }

    pub fn or_where_nested(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_nested(f, Boolean::Or)
    }

    fn push_nested(&mut self, f: impl FnOnce(&mut Builder), boolean: Boolean) -> &mut Self {
        let base = self.nested();
        let mut sub = self.build_sub(base, f);
        if sub.state.wheres.is_empty() {
            return self;
        }
        let bindings = sub.bindings.take(BindingKind::Where);
        let predicate = Predicate::Nested {
            predicates: std::mem::take(&mut sub.state.wheres),
            boolean,
        };
        self.push_predicate(Target::Where, predicate, bindings)
    }

    /// `column op (sub-select built by f)`
    pub fn where_sub(
        &mut self,
        column: &str,
        operator: &str,
        f: impl FnOnce(&mut Builder),
    ) -> &mut Self {
        self.push_sub(column, operator, f, Boolean::And)
    }

    pub fn or_where_sub(
        &mut self,
        column: &str,
        operator: &str,
        f: impl FnOnce(&mut Builder),
    ) -> &mut Self {
        self.push_sub(column, operator, f, Boolean::Or)
    }

    fn push_sub(
        &mut self,
        column: &str,
        operator: &str,
        f: impl FnOnce(&mut Builder),
        boolean: Boolean,
    ) -> &mut Self {
        let operator = self.grammar.parse_operator(operator).unwrap_or(Operator::EQ);
        let base = self.fork();
        let sub = self.build_sub(base, f);
        let predicate = Predicate::Sub {
            column: column.to_string(),
            operator,
            query: Box::new(sub.state),
            boolean,
        };
        self.push_predicate(Target::Where, predicate, sub.bindings.flatten())
    }

    pub fn where_exists(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_exists(f, false, Boolean::And)
    }

    pub fn or_where_exists(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_exists(f, false, Boolean::Or)
    }

    pub fn where_not_exists(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_exists(f, true, Boolean::And)
    }

    pub fn or_where_not_exists(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        self.push_exists(f, true, Boolean::Or)
    }

    fn push_exists(
        &mut self,
        f: impl FnOnce(&mut Builder),
        negated: bool,
        boolean: Boolean,
    ) -> &mut Self {
        let base = self.fork();
        let sub = self.build_sub(base, f);
        let predicate = Predicate::Exists {
            query: Box::new(sub.state),
            negated,
            boolean,
        };
        self.push_predicate(Target::Where, predicate, sub.bindings.flatten())
    }

    /// `column IN (sub-select built by f)`
    pub fn where_in_sub(&mut self, column: &str, f: impl FnOnce(&mut Builder)) -> &mut Self {
        let base = self.fork();
        let sub = self.build_sub(base, f);
        self.push_in_sub(column, sub, false, Boolean::And)
    }

    pub fn or_where_in_sub(&mut self, column: &str, f: impl FnOnce(&mut Builder)) -> &mut Self {
        let base = self.fork();
        let sub = self.build_sub(base, f);
        self.push_in_sub(column, sub, false, Boolean::Or)
    }

    pub fn where_not_in_sub(&mut self, column: &str, f: impl FnOnce(&mut Builder)) -> &mut Self {
        let base = self.fork();
        let sub = self.build_sub(base, f);
        self.push_in_sub(column, sub, true, Boolean::And)
    }

    pub fn or_where_not_in_sub(&mut self, column: &str, f: impl FnOnce(&mut Builder)) -> &mut Self {
        let base = self.fork();
        let sub = self.build_sub(base, f);
        self.push_in_sub(column, sub, true, Boolean::Or)
    }

    /// `column IN (query)` for a pre-built builder.
    ///
    /// A builder from a different grammar records an invalid-argument error that
    /// every later compile or execute call returns.
    pub fn where_in_query(&mut self, column: &str, query: &Builder) -> &mut Self {
        if self.check_compatible(query) {
            self.push_in_sub(column, query.clone(), false, Boolean::And);
        }
        self
    }

    pub fn where_not_in_query(&mut self, column: &str, query: &Builder) -> &mut Self {
        if self.check_compatible(query) {
            self.push_in_sub(column, query.clone(), true, Boolean::And);
        }
        self
    }

    fn push_in_sub(
        &mut self,
        column: &str,
        sub: Builder,
        negated: bool,
        boolean: Boolean,
    ) -> &mut Self {
        let predicate = Predicate::InSub {
            column: column.to_string(),
            query: Box::new(sub.state),
            negated,
            boolean,
        };
        self.push_predicate(Target::Where, predicate, sub.bindings.flatten())
    }

    // ==================== Raw / column / between / null / in ====================

    /// Raw condition; each `?` is bound, in order, to the next value.
    pub fn where_raw<I, V>(&mut self, sql: &str, bindings: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = bindings.into_iter().map(Into::into).collect();
        self.push_raw(Target::Where, sql, values, Boolean::And)
    }

    pub fn or_where_raw<I, V>(&mut self, sql: &str, bindings: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = bindings.into_iter().map(Into::into).collect();
        self.push_raw(Target::Where, sql, values, Boolean::Or)
    }

    /// `first op second`, comparing two columns.
    pub fn where_column(&mut self, first: &str, operator: &str, second: &str) -> &mut Self {
        self.push_column(first, operator, second, Boolean::And)
    }

    pub fn or_where_column(&mut self, first: &str, operator: &str, second: &str) -> &mut Self {
        self.push_column(first, operator, second, Boolean::Or)
    }

    fn push_column(
        &mut self,
        first: &str,
        operator: &str,
        second: &str,
        boolean: Boolean,
    ) -> &mut Self {
        let (operator, second) = match self.grammar.parse_operator(operator) {
            Some(op) => (op, second),
            None => (Operator::EQ, operator),
        };
        let predicate = Predicate::Column {
            first: first.to_string(),
            operator,
            second: second.to_string(),
            boolean,
        };
        self.push_predicate(Target::Where, predicate, Vec::new())
    }

    pub fn where_between(
        &mut self,
        column: &str,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.push_between(Target::Where, column, low.into(), high.into(), false, Boolean::And)
    }

    pub fn or_where_between(
        &mut self,
        column: &str,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.push_between(Target::Where, column, low.into(), high.into(), false, Boolean::Or)
    }

    pub fn where_not_between(
        &mut self,
        column: &str,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.push_between(Target::Where, column, low.into(), high.into(), true, Boolean::And)
    }

    pub fn or_where_not_between(
        &mut self,
        column: &str,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.push_between(Target::Where, column, low.into(), high.into(), true, Boolean::Or)
    }

    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.push_null(Target::Where, column, false, Boolean::And)
    }

    pub fn or_where_null(&mut self, column: &str) -> &mut Self {
        self.push_null(Target::Where, column, false, Boolean::Or)
    }

    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.push_null(Target::Where, column, true, Boolean::And)
    }

    pub fn or_where_not_null(&mut self, column: &str) -> &mut Self {
        self.push_null(Target::Where, column, true, Boolean::Or)
    }

    /// `column IN (...)`. An empty list matches nothing.
    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        self.push_in(column, collect_params(values), false, Boolean::And)
    }

    pub fn or_where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        self.push_in(column, collect_params(values), false, Boolean::Or)
    }

    /// `column NOT IN (...)`. An empty list matches everything.
    pub fn where_not_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        self.push_in(column, collect_params(values), true, Boolean::And)
    }

    pub fn or_where_not_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        self.push_in(column, collect_params(values), true, Boolean::Or)
    }

    fn push_in(
        &mut self,
        column: &str,
        values: Vec<Param>,
        negated: bool,
        boolean: Boolean,
    ) -> &mut Self {
        let bindings = param_bindings(&values);
        let predicate = Predicate::In {
            column: column.to_string(),
            values,
            negated,
            boolean,
        };
        self.push_predicate(Target::Where, predicate, bindings)
    }

    // ==================== Date parts ====================

    pub fn where_date(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Param>,
    ) -> &mut Self {
        self.push_date(DatePart::Date, column, operator, value.into())
    }

    pub fn where_time(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Param>,
    ) -> &mut Self {
        self.push_date(DatePart::Time, column, operator, value.into())
    }

    pub fn where_day(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Param>,
    ) -> &mut Self {
        self.push_date(DatePart::Day, column, operator, value.into())
    }

    pub fn where_month(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Param>,
    ) -> &mut Self {
        self.push_date(DatePart::Month, column, operator, value.into())
    }

    pub fn where_year(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Param>,
    ) -> &mut Self {
        self.push_date(DatePart::Year, column, operator, value.into())
    }

    fn push_date(
        &mut self,
        part: DatePart,
        column: &str,
        operator: &str,
        value: Param,
    ) -> &mut Self {
        let (operator, value) =
            resolve::resolve_operator(operator, value, self.grammar.operators());
        if self.reject_list(column, &[&value]) {
            return self;
        }
        let value = self.grammar.normalize_date_value(part, value);
        let bindings = param_bindings([&value]);
        let predicate = Predicate::Date {
            part,
            column: column.to_string(),
            operator,
            value,
            boolean: Boolean::And,
        };
        self.push_predicate(Target::Where, predicate, bindings)
    }

    // ==================== HAVING ====================

    pub fn having(&mut self, column: &str, operator: &str, value: impl Into<Param>) -> &mut Self {
        self.push_op(Target::Having, column, operator, value.into(), Boolean::And)
    }

    pub fn or_having(
        &mut self,
        column: &str,
        operator: &str,
        value: impl Into<Param>,
    ) -> &mut Self {
        self.push_op(Target::Having, column, operator, value.into(), Boolean::Or)
    }

    pub fn having_raw<I, V>(&mut self, sql: &str, bindings: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = bindings.into_iter().map(Into::into).collect();
        self.push_raw(Target::Having, sql, values, Boolean::And)
    }

    pub fn or_having_raw<I, V>(&mut self, sql: &str, bindings: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = bindings.into_iter().map(Into::into).collect();
        self.push_raw(Target::Having, sql, values, Boolean::Or)
    }

    pub fn having_between(
        &mut self,
        column: &str,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.push_between(Target::Having, column, low.into(), high.into(), false, Boolean::And)
    }

    pub fn having_null(&mut self, column: &str) -> &mut Self {
        self.push_null(Target::Having, column, false, Boolean::And)
    }

    pub fn having_not_null(&mut self, column: &str) -> &mut Self {
        self.push_null(Target::Having, column, true, Boolean::And)
    }
}
