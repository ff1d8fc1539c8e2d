//! # fluentql
//!
//! A fluent SQL query builder that compiles to MySQL, PostgreSQL or SQLite.
//!
//! ## Features
//!
//! - **Fluent construction**: chain `select`, `where_*`, `join`, `group_by`,
//!   `order_by`, `limit` and friends on one mutable [`Builder`]
//! - **Aligned bindings**: values are captured per clause as they are added and
//!   flattened in exactly the order their placeholders appear
//! - **Dialect grammars**: identifier quoting, placeholders, locks, upserts, date
//!   functions and truncation per database; unsupported shapes fail loudly
//! - **Async execution**: anything implementing [`Connection`] runs compiled
//!   statements; `tokio-postgres` clients and pool objects work out of the box
//! - **Structured logging**: executed SQL goes to `tracing` under `fluentql.sql`
//!
//! ```ignore
//! use fluentql::{Db, Record};
//!
//! let db = Db::postgres();
//!
//! let mut adults = db.table("users");
//! adults.where_op("age", ">", 18).order_by("name").limit(10);
//! let compiled = adults.compile()?;
//! // SELECT * FROM "users" WHERE "age" > $1 ORDER BY "name" ASC LIMIT 10
//!
//! let rows = adults.get_rows(&client).await?;
//! let total = adults.count(&client).await?;
//!
//! db.table("users")
//!     .where_eq("id", 7)
//!     .update(&client, Record::new().set("name", "alice"))
//!     .await?;
//! ```

pub mod bindings;
pub mod builder;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod expression;
pub mod grammar;
pub mod log;
pub mod operator;
pub mod pagination;
pub mod param;
pub mod record;
pub mod row;
pub mod value;

mod resolve;

pub use bindings::{BindingKind, BindingStore};
pub use builder::Builder;
pub use builder::join::{JoinClause, JoinType};
pub use builder::state::{
    Aggregate, AggregateFunction, Boolean, Column, DatePart, Direction, Duplicates, InfileSpec,
    LockMode, Order, OutfileSpec, Predicate, QueryState, Union,
};
pub use config::{PoolSettings, QueryConfig, Recycling, SqlLogLevel};
pub use connection::Connection;
pub use db::Db;
pub use error::{QueryError, QueryResult};
pub use expression::{Expression, raw};
pub use grammar::{
    Compiled, Dialect, Grammar, MySqlGrammar, PlaceholderStyle, PostgresGrammar, SqlWriter,
    SqliteGrammar,
};
pub use log::StatementKind;
pub use operator::Operator;
pub use pagination::{Page, PageWindow};
pub use param::Param;
pub use record::{Batch, Record, Records, UpsertUpdate};
pub use row::{FromRow, FromValue, Row};
pub use value::Value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_tls};
