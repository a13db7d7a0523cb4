use serde_json::Value;
use sifter_query::{QueryBuilder, Where};

use super::qualified_column;
use crate::error::Result;
use crate::filter::FilterContext;
use crate::strategy::ParameterFilter;

/// Matches rows whose column is null or the empty string.
///
/// The parameter value only switches the filter on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IsEmpty {
    table: Option<String>,
    column: Option<String>,
}

impl IsEmpty {
    pub fn new() -> Self {
        IsEmpty::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

impl<Q: QueryBuilder> ParameterFilter<Q> for IsEmpty {
    fn apply(
        &self,
        name: &str,
        _value: &Value,
        query: &mut Q,
        _ctx: &mut FilterContext<'_>,
    ) -> Result<()> {
        let column = qualified_column(self.table.as_deref(), self.column.as_deref(), name);
        query.where_group(|group| {
            group.where_null(&column).or_where_eq(&column, "");
        });
        Ok(())
    }
}
