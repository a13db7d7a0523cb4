//! Built-in parameter counters.

mod simple_belongs_to;
mod simple_distinct_value;

pub use simple_belongs_to::SimpleBelongsTo;
pub use simple_distinct_value::SimpleDistinctValue;

use sifter_query::{QueryBuilder, Selection, ValueMap};

use crate::error::Result;

/// Groups `query` by `column` and plucks `expression` keyed by the column.
///
/// Null column values are excluded unless `include_empty`.
pub(crate) fn grouped_counts<Q: QueryBuilder>(
    query: &mut Q,
    column: &str,
    include_empty: bool,
    expression: &str,
    column_alias: &str,
    count_alias: &str,
) -> Result<ValueMap> {
    if !include_empty {
        query.where_not_null(column);
    }
    query
        .select(vec![
            Selection::column(column).alias(column_alias),
            Selection::raw(expression).alias(count_alias),
        ])
        .group_by(column);
    Ok(query.pluck(count_alias, column_alias)?)
}
