use sifter_query::{QueryBuilder, ValueMap};

use super::grouped_counts;
use crate::error::Result;
use crate::filter::FilterContext;
use crate::inflect::singular;
use crate::strategy::ParameterCounter;

/// Counts rows per foreign key.
///
/// The key column defaults to `<singular countable>_id`, so a countable named
/// `relateds` counts on `related_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleBelongsTo {
    column: Option<String>,
    include_empty: bool,
    count: String,
    column_alias: String,
    count_alias: String,
}

impl Default for SimpleBelongsTo {
    fn default() -> Self {
        SimpleBelongsTo {
            column: None,
            include_empty: false,
            count: "COUNT(*)".to_string(),
            column_alias: "id".to_string(),
            count_alias: "count".to_string(),
        }
    }
}

impl SimpleBelongsTo {
    pub fn new() -> Self {
        SimpleBelongsTo::default()
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Also counts rows without a key, under a null key.
    pub fn include_empty(mut self, include_empty: bool) -> Self {
        self.include_empty = include_empty;
        self
    }

    /// Aggregate expression, `COUNT(*)` by default.
    pub fn count_expression(mut self, expression: impl Into<String>) -> Self {
        self.count = expression.into();
        self
    }

    pub fn aliases(
        mut self,
        column_alias: impl Into<String>,
        count_alias: impl Into<String>,
    ) -> Self {
        self.column_alias = column_alias.into();
        self.count_alias = count_alias.into();
        self
    }

    fn column_for(&self, name: &str) -> String {
        match self.column.as_deref().filter(|c| !c.is_empty()) {
            Some(column) => column.to_string(),
            None => format!("{}_id", singular(name)),
        }
    }
}

impl<Q: QueryBuilder> ParameterCounter<Q> for SimpleBelongsTo {
    fn count(&self, name: &str, query: &mut Q, _ctx: &mut FilterContext<'_>) -> Result<ValueMap> {
        grouped_counts(
            query,
            &self.column_for(name),
            self.include_empty,
            &self.count,
            &self.column_alias,
            &self.count_alias,
        )
    }
}
