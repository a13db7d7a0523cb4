//! The query-builder contract consumed by filter strategies.

use crate::condition::Where;
use crate::error::Result;
use crate::join::{JoinClause, JoinKind};
use crate::op::Op;
use crate::select::Selection;
use crate::value_map::ValueMap;

/// A mutable query that strategies attach predicates, joins and
/// aggregations to.
///
/// Only the operations filters and counters need are part of the contract.
/// Execution beyond [`pluck`](QueryBuilder::pluck) belongs to the
/// implementation.
pub trait QueryBuilder: Where {
    /// Attaches a join.
    fn join(&mut self, join: JoinClause) -> &mut Self;

    /// Replaces the select list.
    fn select(&mut self, columns: Vec<Selection>) -> &mut Self;

    /// Adds a group-by column.
    fn group_by(&mut self, column: &str) -> &mut Self;

    /// Executes the query and maps each row's `key` column to its `value`
    /// column.
    fn pluck(&self, value: &str, key: &str) -> Result<ValueMap>;

    fn inner_join(&mut self, table: &str, first: &str, op: Op, second: &str) -> &mut Self {
        self.join(JoinClause::new(JoinKind::Inner, table, first, second).with_op(op))
    }

    fn left_join(&mut self, table: &str, first: &str, op: Op, second: &str) -> &mut Self {
        self.join(JoinClause::new(JoinKind::Left, table, first, second).with_op(op))
    }

    fn right_join(&mut self, table: &str, first: &str, op: Op, second: &str) -> &mut Self {
        self.join(JoinClause::new(JoinKind::Right, table, first, second).with_op(op))
    }
}
