//! The fluent query builder.
//!
//! A [`Builder`] owns one [`QueryState`] and one [`BindingStore`]. Every fluent call
//! mutates the state and, when it introduces bound values, appends them to the
//! matching binding slot at that moment. Compilation is delegated to the
//! [`Grammar`] the builder was created with.
//!
//! ```ignore
//! use fluentql::Db;
//!
//! let db = Db::postgres();
//! let mut q = db.table("users");
//! q.select(["*"])
//!     .where_op("age", ">", 18)
//!     .order_by("name")
//!     .limit(10)
//!     .offset(20);
//!
//! assert_eq!(
//!     q.to_sql()?,
//!     r#"SELECT * FROM "users" WHERE "age" > $1 ORDER BY "name" ASC LIMIT 10 OFFSET 20"#
//! );
//! ```

mod aggregate;
pub mod join;
mod mutation;
pub mod state;
mod wheres;


use crate::bindings::{BindingKind, BindingStore};
use crate::config::QueryConfig;
use crate::error::{QueryError, QueryResult};
use crate::expression::Expression;
use crate::grammar::{Compiled, Dialect, Grammar, count_markers};
use crate::value::Value;
use join::{JoinClause, JoinType};
use state::{Column, Direction, LockMode, Order, OutfileSpec, QueryState, Union};
use std::sync::Arc;

/// Fluent, single-owner query builder.
#[derive(Clone, Debug)]
pub struct Builder {
    grammar: Arc<dyn Grammar>,
    config: Arc<QueryConfig>,
    state: QueryState,
    bindings: BindingStore,
    /// First construction error; returned by every later compile/execute call.
    build_error: Option<String>,
}

impl Builder {
    pub fn new(grammar: Arc<dyn Grammar>, config: Arc<QueryConfig>) -> Self {
        Self {
            grammar,
            config,
            state: QueryState::default(),
            bindings: BindingStore::new(),
            build_error: None,
        }
    }

    /// Empty builder sharing this builder's grammar and configuration.
    pub fn fork(&self) -> Builder {
        Builder::new(self.grammar.clone(), self.config.clone())
    }

    /// Empty builder on the same table, for nested predicate groups.
    pub(crate) fn nested(&self) -> Builder {
        let mut sub = self.fork();
        sub.state.table = self.state.table.clone();
        sub
    }

    pub fn grammar(&self) -> &Arc<dyn Grammar> {
        &self.grammar
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.grammar.dialect()
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Record a construction error; only the first one is kept.
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(target: "fluentql", error = %message, "query build error");
        if self.build_error.is_none() {
            self.build_error = Some(message);
        }
    }

    pub(crate) fn check_build_error(&self) -> QueryResult<()> {
        match &self.build_error {
            Some(message) => Err(QueryError::InvalidArgument(message.clone())),
            None => Ok(()),
        }
    }

    /// Run `f` on a fresh builder and return it, adopting its build error.
    pub(crate) fn build_sub(&mut self, base: Builder, f: impl FnOnce(&mut Builder)) -> Builder {
        let mut sub = base;
        f(&mut sub);
        if let Some(message) = sub.build_error.take() {
            self.fail(message);
        }
        sub
    }

    /// Placeholder count of a raw fragment. Records a build error when its
    /// `?` markers and `values` disagree.
    pub(crate) fn raw_binding_count(&mut self, sql: &str, values: &[Value]) -> usize {
        let binding_count = values.iter().map(Value::leaf_count).sum();
        let markers = count_markers(sql);
        if markers != binding_count {
            self.fail(format!(
                "raw SQL `{sql}` has {markers} `?` markers but {binding_count} bindings"
            ));
        }
        binding_count
    }

    /// Reject a pre-built builder compiled by a different grammar.
    pub(crate) fn check_compatible(&mut self, other: &Builder) -> bool {
        if other.dialect() != self.dialect() {
            self.fail(format!(
                "sub-query uses the {} grammar but the outer query uses {}",
                other.dialect(),
                self.dialect()
            ));
            return false;
        }
        if let Some(message) = &other.build_error {
            let message = message.clone();
            self.fail(message);
            return false;
        }
        true
    }

    // ==================== SELECT list ====================

    /// Replace the select list.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.columns.clear();
        self.bindings.take(BindingKind::Select);
        self.add_select(columns)
    }

    pub fn add_select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .columns
            .extend(columns.into_iter().map(|c| Column::Name(c.into())));
        self
    }

    /// Add a raw select expression.
    pub fn select_expr(&mut self, expr: Expression) -> &mut Self {
        self.state.columns.push(Column::Expr(expr));
        self
    }

    /// Add raw select SQL with `?` bindings.
    pub fn select_raw<I, V>(&mut self, sql: &str, bindings: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = bindings.into_iter().map(Into::into).collect();
        let binding_count = self.raw_binding_count(sql, &values);
        self.bindings.extend(BindingKind::Select, values);
        self.state.columns.push(Column::Raw {
            sql: sql.to_string(),
            binding_count,
        });
        self
    }

    /// Add `(sub-select) AS alias` to the select list.
    pub fn select_sub(&mut self, f: impl FnOnce(&mut Builder), alias: &str) -> &mut Self {
        let base = self.fork();
        let sub = self.build_sub(base, f);
        self.bindings.extend(BindingKind::Select, sub.bindings.flatten());
        self.state.columns.push(Column::Sub {
            query: Box::new(sub.state),
            alias: alias.to_string(),
        });
        self
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.state.distinct = true;
        self
    }

    /// Set the target table (the configured prefix is applied).
    pub fn from(&mut self, table: &str) -> &mut Self {
        self.state.table = Some(self.config.prefixed(table));
        self
    }

    // ==================== JOIN ====================

    /// `INNER JOIN table ON first op second`
    pub fn join(&mut self, table: &str, first: &str, operator: &str, second: &str) -> &mut Self {
        self.join_with(table, JoinType::Inner, |j| {
            j.on(first, operator, second);
        })
    }

    pub fn left_join(
        &mut self,
        table: &str,
        first: &str,
        operator: &str,
        second: &str,
    ) -> &mut Self {
        self.join_with(table, JoinType::Left, |j| {
            j.on(first, operator, second);
        })
    }

    pub fn right_join(
        &mut self,
        table: &str,
        first: &str,
        operator: &str,
        second: &str,
    ) -> &mut Self {
        self.join_with(table, JoinType::Right, |j| {
            j.on(first, operator, second);
        })
    }

    pub fn cross_join(&mut self, table: &str) -> &mut Self {
        self.join_with(table, JoinType::Cross, |_| {})
    }

    /// `INNER JOIN table ON first op ?`
    pub fn join_where(
        &mut self,
        table: &str,
        first: &str,
        operator: &str,
        value: impl Into<crate::param::Param>,
    ) -> &mut Self {
        let value = value.into();
        self.join_with(table, JoinType::Inner, move |j| {
            j.where_(first, operator, value);
        })
    }

    /// Join with any number of conditions added by `f`.
    ///
    /// ```ignore
    /// q.join_with("contacts", JoinType::Left, |j| {
    ///     j.on("users.id", "=", "contacts.user_id")
    ///         .where_("contacts.kind", "=", "email");
    /// });
    /// ```
    pub fn join_with(
        &mut self,
        table: &str,
        join_type: JoinType,
        f: impl FnOnce(&mut JoinClause),
    ) -> &mut Self {
        let mut clause =
            JoinClause::new(join_type, self.config.prefixed(table), self.grammar.operators());
        f(&mut clause);
        if let Some(message) = clause.take_error() {
            self.fail(message);
        }
        self.bindings
            .extend(BindingKind::Join, clause.bindings().iter().cloned());
        self.state.joins.push(clause);
        self
    }

    // ==================== GROUP / ORDER / LIMIT ====================

    pub fn group_by<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.groups.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Add super-aggregate rows for the group-by columns.
    pub fn with_rollup(&mut self) -> &mut Self {
        self.state.rollup = true;
        self
    }

    pub fn order_by(&mut self, column: &str) -> &mut Self {
        self.order_by_dir(column, Direction::Asc)
    }

    pub fn order_by_desc(&mut self, column: &str) -> &mut Self {
        self.order_by_dir(column, Direction::Desc)
    }

    pub fn order_by_dir(&mut self, column: &str, direction: Direction) -> &mut Self {
        self.state.orders.push(Order::Column {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn order_by_raw<I, V>(&mut self, sql: &str, bindings: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = bindings.into_iter().map(Into::into).collect();
        let binding_count = self.raw_binding_count(sql, &values);
        self.bindings.extend(BindingKind::Order, values);
        self.state.orders.push(Order::Raw {
            sql: sql.to_string(),
            binding_count,
        });
        self
    }

    /// Drop every ordering and its bindings.
    pub fn reorder(&mut self) -> &mut Self {
        self.state.orders.clear();
        self.bindings.take(BindingKind::Order);
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.state.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.state.offset = Some(offset);
        self
    }

    /// Set limit/offset for a 1-based page without executing anything.
    pub fn for_page(&mut self, page: u64, per_page: u64) -> &mut Self {
        let per_page = per_page.max(1);
        self.state.offset = Some((page.max(1) - 1).saturating_mul(per_page));
        self.state.limit = Some(per_page);
        self
    }

    // ==================== UNION ====================

    pub fn union(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        let base = self.fork();
        let sub = self.build_sub(base, f);
        self.push_union(sub, false)
    }

    pub fn union_all(&mut self, f: impl FnOnce(&mut Builder)) -> &mut Self {
        let base = self.fork();
        let sub = self.build_sub(base, f);
        self.push_union(sub, true)
    }

    /// Union with a pre-built builder.
    pub fn union_query(&mut self, query: &Builder, all: bool) -> &mut Self {
        if self.check_compatible(query) {
            self.push_union(query.clone(), all);
        }
        self
    }

    fn push_union(&mut self, sub: Builder, all: bool) -> &mut Self {
        self.bindings.extend(BindingKind::Union, sub.bindings.flatten());
        self.state.unions.push(Union {
            query: Box::new(sub.state),
            all,
        });
        self
    }

    // ==================== LOCK / OUTFILE ====================

    pub fn lock_for_update(&mut self) -> &mut Self {
        self.state.lock = Some(LockMode::Exclusive);
        self
    }

    pub fn shared_lock(&mut self) -> &mut Self {
        self.state.lock = Some(LockMode::Shared);
        self
    }

    /// Write the result to a server-side file (MySQL only).
    pub fn into_outfile(&mut self, file: OutfileSpec) -> &mut Self {
        self.state.outfile = Some(file);
        self
    }

    // ==================== Bindings ====================

    pub fn add_binding(&mut self, value: impl Into<Value>, kind: BindingKind) -> &mut Self {
        self.bindings.push(kind, value.into());
        self
    }

    /// Replace one binding slot.
    pub fn set_bindings(&mut self, values: Vec<Value>, kind: BindingKind) -> &mut Self {
        self.bindings.set(kind, values);
        self
    }

    /// Append every slot of `other` to this builder's slots.
    pub fn merge_bindings(&mut self, other: &Builder) -> &mut Self {
        self.bindings.merge(&other.bindings);
        self
    }

    /// Bindings in placeholder order.
    pub fn bindings(&self) -> Vec<Value> {
        self.bindings.flatten()
    }

    pub fn raw_bindings(&self) -> &BindingStore {
        &self.bindings
    }

    // ==================== Compilation ====================

    pub fn to_sql(&self) -> QueryResult<String> {
        self.check_build_error()?;
        self.grammar.compile_select(&self.state)
    }

    pub fn compile(&self) -> QueryResult<Compiled> {
        Ok(Compiled::new(self.to_sql()?, self.bindings()))
    }
}
