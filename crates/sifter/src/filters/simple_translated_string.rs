use serde_json::Value;
use sifter_query::QueryBuilder;

use super::{string_predicate, text_value};
use crate::error::Result;
use crate::filter::FilterContext;
use crate::inflect::singular;
use crate::joins::{JoinKey, JoinParameters};
use crate::strategy::ParameterFilter;

/// Setting consulted for the locale when the strategy names none.
pub const LOCALE_SETTING: &str = "locale";

/// Locale used when neither the strategy nor the settings name one.
pub const DEFAULT_LOCALE: &str = "en";

/// String match against a column of a per-locale translation table.
///
/// Registers the [`JoinKey::TRANSLATIONS`] join
/// `translation_table on translation_table.<singular table>_id = table.id`,
/// so several translated parameters share one join.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleTranslatedString {
    table: String,
    translation_table: String,
    column: Option<String>,
    locale: Option<String>,
    exact: bool,
}

impl SimpleTranslatedString {
    /// Filter on the translations of `table`, stored in
    /// `<singular table>_translations` unless overridden.
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        SimpleTranslatedString {
            translation_table: format!("{}_translations", singular(&table)),
            table,
            column: None,
            locale: None,
            exact: false,
        }
    }

    pub fn translation_table(mut self, translation_table: impl Into<String>) -> Self {
        self.translation_table = translation_table.into();
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    fn resolve_locale(&self, ctx: &FilterContext<'_>) -> String {
        if let Some(locale) = self.locale.as_deref().filter(|l| !l.is_empty()) {
            return locale.to_string();
        }
        ctx.setting(LOCALE_SETTING)
            .and_then(Value::as_str)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LOCALE)
            .to_string()
    }
}

impl<Q: QueryBuilder> ParameterFilter<Q> for SimpleTranslatedString {
    fn apply(
        &self,
        name: &str,
        value: &Value,
        query: &mut Q,
        ctx: &mut FilterContext<'_>,
    ) -> Result<()> {
        let text = text_value(name, value)?;
        let locale = self.resolve_locale(ctx);
        let translations = &self.translation_table;
        let column = self
            .column
            .as_deref()
            .filter(|column| !column.is_empty())
            .unwrap_or(name);
        let column = format!("{translations}.{column}");

        query.where_eq(&format!("{translations}.locale"), locale);
        string_predicate(query, &column, &text, self.exact);

        ctx.add_join(
            JoinKey::TRANSLATIONS,
            JoinParameters::on(
                translations.as_str(),
                format!("{translations}.{}_id", singular(&self.table)),
                format!("{}.id", self.table),
            ),
            None,
        );
        Ok(())
    }
}
