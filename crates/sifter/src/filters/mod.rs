//! Built-in parameter filters.
//!
//! Each filter targets `table.column` when configured, falling back to the
//! parameter name for the column.

mod is_empty;
mod simple_integer;
mod simple_string;
mod simple_translated_string;

pub use is_empty::IsEmpty;
pub use simple_integer::SimpleInteger;
pub use simple_string::SimpleString;
pub use simple_translated_string::{SimpleTranslatedString, DEFAULT_LOCALE, LOCALE_SETTING};

use serde_json::Value;
use sifter_query::Where;

use crate::error::{FilterError, Result};

/// `table.column`, with the parameter name standing in for a missing column.
pub(crate) fn qualified_column(table: Option<&str>, column: Option<&str>, name: &str) -> String {
    let column = column.filter(|c| !c.is_empty()).unwrap_or(name);
    match table.filter(|t| !t.is_empty()) {
        Some(table) => format!("{table}.{column}"),
        None => column.to_string(),
    }
}

/// Text form of a scalar parameter value.
pub(crate) fn text_value(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(if *flag { "1" } else { "0" }.to_string()),
        _ => Err(FilterError::invalid_value(name, "a string or number")),
    }
}

/// `column = text` when exact, `column like %text%` otherwise.
pub(crate) fn string_predicate<W: Where>(query: &mut W, column: &str, text: &str, exact: bool) {
    if exact {
        query.where_eq(column, text);
    } else {
        query.where_like(column, format!("%{text}%"));
    }
}
