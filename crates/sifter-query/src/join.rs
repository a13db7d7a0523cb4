//! Join kinds and join clauses.

use std::fmt;

use crate::op::Op;

/// How a joined table is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinKind {
    Inner,
    #[default]
    Left,
    Right,
}

impl JoinKind {
    /// Classifies a free-form join token, case-insensitively.
    ///
    /// `"join"` or anything containing `"inner"` is an inner join, anything
    /// containing `"right"` a right join, everything else a left join.
    ///
    /// ```
    /// use sifter_query::JoinKind;
    ///
    /// assert_eq!(JoinKind::from_token("INNER JOIN"), JoinKind::Inner);
    /// assert_eq!(JoinKind::from_token("join"), JoinKind::Inner);
    /// assert_eq!(JoinKind::from_token("rightJoin"), JoinKind::Right);
    /// assert_eq!(JoinKind::from_token("outer"), JoinKind::Left);
    /// ```
    pub fn from_token(token: &str) -> JoinKind {
        let token = token.trim().to_ascii_lowercase();
        if token == "join" || token.contains("inner") {
            JoinKind::Inner
        } else if token.contains("right") {
            JoinKind::Right
        } else {
            JoinKind::Left
        }
    }

    /// Returns the SQL keyword preceding `join`.
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
            JoinKind::Right => "right",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A join attached to a query: `<kind> join table on first <op> second`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    pub first: String,
    pub op: Op,
    pub second: String,
}

impl JoinClause {
    /// Creates an equality join.
    pub fn new(
        kind: JoinKind,
        table: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        JoinClause {
            kind,
            table: table.into(),
            first: first.into(),
            op: Op::Eq,
            second: second.into(),
        }
    }

    /// Replaces the join operator.
    pub fn with_op(mut self, op: Op) -> Self {
        self.op = op;
        self
    }
}
