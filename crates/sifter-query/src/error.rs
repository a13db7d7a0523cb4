//! Error types for the query crate.

use thiserror::Error;

/// Errors that can occur when building or executing queries.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A LIKE pattern could not be compiled.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Operator token is not one of the supported comparison operators.
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    /// Query or join refers to a table the database does not hold.
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    /// Raw select expression the in-memory engine cannot evaluate.
    #[error("unsupported select expression '{0}'")]
    UnsupportedExpression(String),
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
