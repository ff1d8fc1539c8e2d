//! Error types for fluentql

use crate::grammar::Dialect;
use thiserror::Error;

/// Result type alias for fluentql operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Error types for query construction, compilation and execution
#[derive(Debug, Error)]
pub enum QueryError {
    /// Unknown binding category (usage error)
    #[error("Unknown binding kind: {0}")]
    UnknownBindingKind(String),

    /// Invalid builder argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Statement shape not supported by the active grammar
    #[error("{operation} is not supported by the {dialect} grammar")]
    Unsupported {
        dialect: Dialect,
        operation: &'static str,
    },

    /// Connection-layer failure, keeping the driver error as its source
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl QueryError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an unsupported-operation error for a dialect
    pub fn unsupported(dialect: Dialect, operation: &'static str) -> Self {
        Self::Unsupported { dialect, operation }
    }

    /// Wrap a driver failure as a connection error
    pub fn connection(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is an unsupported-operation error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Classify a tokio_postgres error.
    ///
    /// Server-side errors stay [`QueryError::Query`]; a closed or broken connection
    /// becomes [`QueryError::Connection`].
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if err.as_db_error().is_none() && err.is_closed() {
            return Self::connection("connection closed", err);
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for QueryError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
