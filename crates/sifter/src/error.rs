//! Error types for filter construction, application and counting.

use std::fmt;

use sifter_query::QueryError;

use crate::validation::Messages;

/// Boxed error returned by fallible strategy factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which engine pass failed to handle a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Filter,
    Countable,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParameterKind::Filter => "filter",
            ParameterKind::Countable => "countable",
        })
    }
}

/// Errors raised by filter data, filters and countable filters.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// Supplied attributes failed the declared rules.
    #[error("Filter data validation failed: {messages}")]
    ValidationFailed { messages: Messages },

    /// A strategy declaration could not be turned into a usable strategy.
    #[error("Invalid strategy for parameter '{name}': {reason}")]
    InvalidStrategy {
        name: String,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A set parameter had no strategy and the fallback hook did not handle it.
    #[error("No fallback strategy determined for {kind} parameter '{name}'")]
    ParameterUnhandled { kind: ParameterKind, name: String },

    /// A built-in strategy received a value shape it cannot use.
    #[error("Parameter '{name}' must be {expected}")]
    InvalidParameterValue { name: String, expected: &'static str },

    /// Filter data built from a different schema than the filter expects.
    #[error("Filter data '{actual}' does not match the filter's data type '{expected}'")]
    DataMismatch { expected: String, actual: String },

    /// Raw filter data was not an object.
    #[error("Filter data must be an object, got {0}")]
    InvalidData(&'static str),

    /// A validation rule could not be parsed.
    #[error("Invalid validation rule '{0}'")]
    InvalidRule(String),

    /// A YAML schema could not be parsed.
    #[error("Invalid filter schema: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON schema could not be parsed.
    #[error("Invalid filter schema: {0}")]
    Json(#[from] serde_json::Error),

    /// The query builder rejected an operation.
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl FilterError {
    /// Create an invalid strategy error without an underlying cause.
    pub fn invalid_strategy(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStrategy {
            name: name.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Create an unhandled filter parameter error.
    pub fn unhandled_parameter(name: impl Into<String>) -> Self {
        Self::ParameterUnhandled {
            kind: ParameterKind::Filter,
            name: name.into(),
        }
    }

    /// Create an unhandled countable parameter error.
    pub fn unhandled_countable(name: impl Into<String>) -> Self {
        Self::ParameterUnhandled {
            kind: ParameterKind::Countable,
            name: name.into(),
        }
    }

    /// Create an invalid parameter value error.
    pub fn invalid_value(name: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidParameterValue {
            name: name.into(),
            expected,
        }
    }
}

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;
