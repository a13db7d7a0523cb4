use serde_json::Value;
use sifter_query::QueryBuilder;

use super::{qualified_column, string_predicate, text_value};
use crate::error::Result;
use crate::filter::FilterContext;
use crate::strategy::ParameterFilter;

/// Substring match on a text column, or equality when `exact`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleString {
    table: Option<String>,
    column: Option<String>,
    exact: bool,
}

impl SimpleString {
    pub fn new() -> Self {
        SimpleString::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }
}

impl<Q: QueryBuilder> ParameterFilter<Q> for SimpleString {
    fn apply(
        &self,
        name: &str,
        value: &Value,
        query: &mut Q,
        _ctx: &mut FilterContext<'_>,
    ) -> Result<()> {
        let column = qualified_column(self.table.as_deref(), self.column.as_deref(), name);
        let text = text_value(name, value)?;
        string_predicate(query, &column, &text, self.exact);
        Ok(())
    }
}
