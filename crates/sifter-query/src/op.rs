//! Comparison operators for predicates and join conditions.
//!
//! The [`Op`] enum covers the operators a filter strategy can hand to the
//! query builder. Operators parse from their SQL tokens so they can come from
//! configuration.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;

/// Comparison operator for a predicate.
///
/// - **Ordering**: `Eq`, `Ne`, `Gt`, `Gte`, `Lt`, `Lte`
/// - **Pattern**: `Like`, `NotLike` (SQL `%` and `_` wildcards)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Op {
    /// Equal.
    #[default]
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Pattern match.
    Like,
    /// Negated pattern match.
    NotLike,
}

impl Op {
    /// Returns `true` for `Like` and `NotLike`.
    pub fn is_pattern(self) -> bool {
        matches!(self, Op::Like | Op::NotLike)
    }

    /// Evaluates a comparison given an ordering result.
    ///
    /// Pattern operators never match on an ordering.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Gte => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
            Op::Like | Op::NotLike => false,
        }
    }

    /// Returns the SQL token of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Like => "like",
            Op::NotLike => "not like",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Op {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match token.to_ascii_lowercase().as_str() {
            "=" | "==" => Ok(Op::Eq),
            "!=" | "<>" => Ok(Op::Ne),
            ">" => Ok(Op::Gt),
            ">=" => Ok(Op::Gte),
            "<" => Ok(Op::Lt),
            "<=" => Ok(Op::Lte),
            "like" => Ok(Op::Like),
            "not like" => Ok(Op::NotLike),
            _ => Err(QueryError::UnknownOperator(s.to_string())),
        }
    }
}
