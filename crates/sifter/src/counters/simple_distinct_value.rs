use sifter_query::{QueryBuilder, ValueMap};

use super::grouped_counts;
use crate::error::Result;
use crate::filter::FilterContext;
use crate::strategy::ParameterCounter;

/// Counts rows per distinct value of a column, the countable's name by
/// default.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleDistinctValue {
    column: Option<String>,
    include_empty: bool,
    count: String,
    column_alias: String,
    count_alias: String,
}

impl Default for SimpleDistinctValue {
    fn default() -> Self {
        SimpleDistinctValue {
            column: None,
            include_empty: false,
            count: "count(*)".to_string(),
            column_alias: "value".to_string(),
            count_alias: "count".to_string(),
        }
    }
}

impl SimpleDistinctValue {
    pub fn new() -> Self {
        SimpleDistinctValue::default()
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn include_empty(mut self, include_empty: bool) -> Self {
        self.include_empty = include_empty;
        self
    }

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
}

impl<Q: QueryBuilder> ParameterCounter<Q> for SimpleDistinctValue {
    fn count(&self, name: &str, query: &mut Q, _ctx: &mut FilterContext<'_>) -> Result<ValueMap> {
        let column = self.column.as_deref().filter(|c| !c.is_empty()).unwrap_or(name);
        grouped_counts(
            query,
            column,
            self.include_empty,
            &self.count,
            &self.column_alias,
            &self.count_alias,
        )
    }
}
