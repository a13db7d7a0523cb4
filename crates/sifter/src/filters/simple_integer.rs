use serde_json::Value;
use sifter_query::{Op, QueryBuilder};

use super::qualified_column;
use crate::error::{FilterError, Result};
use crate::filter::FilterContext;
use crate::strategy::ParameterFilter;

/// Comparison against a numeric column.
///
/// A list value becomes an `in (...)` check and the operator is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleInteger {
    table: Option<String>,
    column: Option<String>,
    operator: Op,
}

impl SimpleInteger {
    pub fn new() -> Self {
        SimpleInteger::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn operator(mut self, operator: Op) -> Self {
        self.operator = operator;
        self
    }
}

impl<Q: QueryBuilder> ParameterFilter<Q> for SimpleInteger {
    fn apply(
        &self,
        name: &str,
        value: &Value,
        query: &mut Q,
        _ctx: &mut FilterContext<'_>,
    ) -> Result<()> {
        let column = qualified_column(self.table.as_deref(), self.column.as_deref(), name);
        match value {
            Value::Array(items) => {
                query.where_in(&column, items);
            }
            Value::Object(_) => return Err(FilterError::invalid_value(name, "a number or a list")),
            scalar => {
                query.where_cmp(&column, self.operator, scalar);
            }
        }
        Ok(())
    }
}
