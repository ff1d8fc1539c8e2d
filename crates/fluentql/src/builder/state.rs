//! Structured representation of one statement under construction.

use crate::builder::join::JoinClause;
use crate::expression::Expression;
use crate::operator::Operator;
use crate::param::Param;

/// Connector joining a predicate to the one before it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl Boolean {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Boolean::And => "AND",
            Boolean::Or => "OR",
        }
    }
}

/// Date/time component compared by a date-part predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatePart {
    Date,
    Time,
    Day,
    Month,
    Year,
}

/// A where/having/join condition node.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// `column op value`
    Basic {
        column: String,
        operator: Operator,
        value: Param,
        boolean: Boolean,
    },
    /// `first op second`, both identifiers.
    Column {
        first: String,
        operator: Operator,
        second: String,
        boolean: Boolean,
    },
    /// Raw SQL; the first `binding_count` `?` markers are placeholders.
    Raw {
        sql: String,
        binding_count: usize,
        boolean: Boolean,
    },
    Between {
        column: String,
        low: Param,
        high: Param,
        negated: bool,
        boolean: Boolean,
    },
    Null {
        column: String,
        negated: bool,
        boolean: Boolean,
    },
    In {
        column: String,
        values: Vec<Param>,
        negated: bool,
        boolean: Boolean,
    },
    InSub {
        column: String,
        query: Box<QueryState>,
        negated: bool,
        boolean: Boolean,
    },
    Exists {
        query: Box<QueryState>,
        negated: bool,
        boolean: Boolean,
    },
    /// Parenthesized group. Never empty.
    Nested {
        predicates: Vec<Predicate>,
        boolean: Boolean,
    },
    /// `column op (sub-select)`
    Sub {
        column: String,
        operator: Operator,
        query: Box<QueryState>,
        boolean: Boolean,
    },
    Date {
        part: DatePart,
        column: String,
        operator: Operator,
        value: Param,
        boolean: Boolean,
    },
}

impl Predicate {
    pub fn boolean(&self) -> Boolean {
        match self {
            Predicate::Basic { boolean, .. }
            | Predicate::Column { boolean, .. }
            | Predicate::Raw { boolean, .. }
            | Predicate::Between { boolean, .. }
            | Predicate::Null { boolean, .. }
            | Predicate::In { boolean, .. }
            | Predicate::InSub { boolean, .. }
            | Predicate::Exists { boolean, .. }
            | Predicate::Nested { boolean, .. }
            | Predicate::Sub { boolean, .. }
            | Predicate::Date { boolean, .. } => *boolean,
        }
    }
}

/// One entry of the select list.
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Name(String),
    Expr(Expression),
    Raw { sql: String, binding_count: usize },
    Sub { query: Box<QueryState>, alias: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Order {
    Column { column: String, direction: Direction },
    Raw { sql: String, binding_count: usize },
}

/// Row lock requested for a select.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockMode {
    Exclusive,
    Shared,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Min,
    Max,
    Sum,
    Avg,
}

impl AggregateFunction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
        }
    }
}

/// Aggregate installed while an aggregate helper runs.
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregate {
    pub function: AggregateFunction,
    pub columns: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Union {
    pub query: Box<QueryState>,
    pub all: bool,
}

/// `SELECT ... INTO OUTFILE` options (MySQL).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutfileSpec {
    pub path: String,
    pub fields_terminated_by: Option<String>,
    pub enclosed_by: Option<String>,
    pub lines_terminated_by: Option<String>,
}

impl OutfileSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn fields_terminated_by(mut self, sep: impl Into<String>) -> Self {
        self.fields_terminated_by = Some(sep.into());
        self
    }

    pub fn enclosed_by(mut self, quote: impl Into<String>) -> Self {
        self.enclosed_by = Some(quote.into());
        self
    }

    pub fn lines_terminated_by(mut self, sep: impl Into<String>) -> Self {
        self.lines_terminated_by = Some(sep.into());
        self
    }
}

/// Handling of rows colliding with an existing unique key during a file import.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Duplicates {
    Replace,
    Ignore,
}

/// `LOAD DATA INFILE` options (MySQL).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InfileSpec {
    pub path: String,
    pub local: bool,
    pub duplicates: Option<Duplicates>,
    pub fields_terminated_by: Option<String>,
    pub enclosed_by: Option<String>,
    pub lines_terminated_by: Option<String>,
    pub ignore_lines: Option<u64>,
    pub columns: Vec<String>,
}

impl InfileSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn local(mut self) -> Self {
        self.local = true;
        self
    }

    pub fn on_duplicate(mut self, duplicates: Duplicates) -> Self {
        self.duplicates = Some(duplicates);
        self
    }

    pub fn fields_terminated_by(mut self, sep: impl Into<String>) -> Self {
        self.fields_terminated_by = Some(sep.into());
        self
    }

    pub fn enclosed_by(mut self, quote: impl Into<String>) -> Self {
        self.enclosed_by = Some(quote.into());
        self
    }

    pub fn lines_terminated_by(mut self, sep: impl Into<String>) -> Self {
        self.lines_terminated_by = Some(sep.into());
        self
    }

    pub fn ignore_lines(mut self, n: u64) -> Self {
        self.ignore_lines = Some(n);
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// Everything a select/update/delete is compiled from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryState {
    pub table: Option<String>,
    pub columns: Vec<Column>,
    pub distinct: bool,
    pub joins: Vec<JoinClause>,
    pub wheres: Vec<Predicate>,
    pub groups: Vec<String>,
    pub rollup: bool,
    pub havings: Vec<Predicate>,
    pub orders: Vec<Order>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub unions: Vec<Union>,
    pub lock: Option<LockMode>,
    pub aggregate: Option<Aggregate>,
    pub outfile: Option<OutfileSpec>,
}
