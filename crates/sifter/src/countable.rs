//! Facet counting on top of the filter engine.
//!
//! For each countable attribute, [`CountableFilter::get_counts`] takes a fresh
//! base query, applies the filter with that attribute's own parameter ignored
//! (so the counts show what *other* values of it would yield), and hands the
//! query to the attribute's count strategy.

use std::ops::{Deref, DerefMut};

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use sifter_query::{QueryBuilder, ValueMap};

use crate::data::{Attributes, FilterData};
use crate::error::{FilterError, Result};
use crate::filter::{Filter, FilterContext, FilterDefinition};
use crate::strategy::{CountStrategies, CountStrategy};

/// What a countable filter declares on top of [`FilterDefinition`].
pub trait CountableDefinition<Q: QueryBuilder>: FilterDefinition<Q> {
    /// Attributes eligible for counting, in output order.
    fn countables(&self) -> Vec<String>;

    /// Count strategy per countable.
    fn count_strategies(&self) -> CountStrategies<Q>;

    /// Countables whose own filter stays applied while they are counted.
    fn include_self_in_count(&self) -> Vec<String> {
        Vec::new()
    }

    /// Fresh query each counting pass starts from.
    fn countable_base_query(&self, countable: Option<&str>) -> Q;

    /// Counts countables without a strategy.
    fn count_parameter(
        &self,
        name: &str,
        _query: &mut Q,
        _ctx: &mut FilterContext<'_>,
    ) -> Result<ValueMap> {
        Err(FilterError::unhandled_countable(name))
    }
}

/// Counts per countable, in counting order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountableResults {
    entries: Vec<(String, ValueMap)>,
}

impl CountableResults {
    pub fn new() -> Self {
        CountableResults::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, counts: ValueMap) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = counts,
            None => self.entries.push((name, counts)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ValueMap> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, counts)| counts)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueMap)> {
        self.entries.iter().map(|(name, counts)| (name.as_str(), counts))
    }
}

impl IntoIterator for CountableResults {
    type Item = (String, ValueMap);
    type IntoIter = std::vec::IntoIter<(String, ValueMap)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for CountableResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, counts) in &self.entries {
            map.serialize_entry(name, counts)?;
        }
        map.end()
    }
}

/// A [`Filter`] that can also count facets.
///
/// Dereferences to the wrapped filter, so `apply`, settings and joins are
/// available directly.
pub struct CountableFilter<Q, D> {
    filter: Filter<Q, D>,
    countables: Vec<String>,
    count_strategies: CountStrategies<Q>,
    include_self: Vec<String>,
    ignored_countables: Vec<String>,
}

impl<Q, D> CountableFilter<Q, D>
where
    Q: QueryBuilder + 'static,
    D: CountableDefinition<Q>,
{
    pub fn new(definition: D, attributes: Attributes) -> Result<Self> {
        Ok(Self::wrap(Filter::new(definition, attributes)?))
    }

    pub fn from_value(definition: D, value: Value) -> Result<Self> {
        Ok(Self::wrap(Filter::from_value(definition, value)?))
    }

    pub fn with_data(definition: D, data: FilterData) -> Result<Self> {
        Ok(Self::wrap(Filter::with_data(definition, data)?))
    }

    fn wrap(filter: Filter<Q, D>) -> Self {
        let definition = filter.definition();
        CountableFilter {
            countables: definition.countables(),
            count_strategies: definition.count_strategies(),
            include_self: definition.include_self_in_count(),
            ignored_countables: Vec::new(),
            filter,
        }
    }

    /// Declared countables.
    pub fn countables(&self) -> &[String] {
        &self.countables
    }

    /// Declared countables that are not ignored.
    pub fn active_countables(&self) -> Vec<&str> {
        self.countables
            .iter()
            .filter(|name| !self.is_countable_ignored(name))
            .map(String::as_str)
            .collect()
    }

    pub fn ignore_countable(&mut self, name: impl Into<String>) {
        self.ignored_countables.push(name.into());
    }

    pub fn ignore_countables<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_countables
            .extend(names.into_iter().map(Into::into));
    }

    pub fn unignore_countable(&mut self, name: &str) {
        self.ignored_countables.retain(|ignored| ignored != name);
    }

    pub fn unignore_countables<'n>(&mut self, names: impl IntoIterator<Item = &'n str>) {
        for name in names {
            self.unignore_countable(name);
        }
    }

    pub fn is_countable_ignored(&self, name: &str) -> bool {
        self.ignored_countables.iter().any(|ignored| ignored == name)
    }

    pub fn into_filter(self) -> Filter<Q, D> {
        self.filter
    }

    /// Computes counts for the requested countables.
    ///
    /// A non-empty `only` restricts counting to those declared countables, in
    /// declared order. Otherwise every non-ignored countable is counted.
    /// Ignored countables are skipped either way.
    pub fn get_counts(&mut self, only: &[&str]) -> Result<CountableResults> {
        self.build_count_strategies()?;

        let targets: Vec<String> = if only.is_empty() {
            self.active_countables()
                .into_iter()
                .map(str::to_string)
                .collect()
        } else {
            self.countables
                .iter()
                .filter(|name| only.contains(&name.as_str()))
                .cloned()
                .collect()
        };
        tracing::debug!(countables = ?targets, "counting facets");

        let mut results = CountableResults::new();
        for name in targets {
            if self.is_countable_ignored(&name) {
                continue;
            }
            let mut query = self.filter.definition().countable_base_query(Some(&name));
            if self.include_self.contains(&name) {
                self.filter.apply(&mut query)?;
            } else {
                self.filter.apply_ignoring(&name, &mut query)?;
            }
            let counts = self.count(&name, &mut query)?;
            tracing::trace!(countable = %name, values = counts.len(), "counted");
            results.insert(name, counts);
        }
        Ok(results)
    }

    fn build_count_strategies(&mut self) -> Result<()> {
        let registry = self.filter.registry();
        for (name, strategy) in self.count_strategies.iter_mut() {
            let CountStrategy::Named(class) = strategy else {
                continue;
            };
            let resolved = registry.resolve_counter(name, class)?;
            *strategy = CountStrategy::Counter(resolved);
        }
        Ok(())
    }

    fn count(&mut self, name: &str, query: &mut Q) -> Result<ValueMap> {
        let (definition, mut ctx) = self.filter.context();
        match self.count_strategies.get(name) {
            Some(CountStrategy::Counter(counter)) => counter.count(name, query, &mut ctx),
            Some(CountStrategy::Callback(callback)) => callback(name, query, &mut ctx),
            Some(CountStrategy::Fallback) | None => {
                definition.count_parameter(name, query, &mut ctx)
            }
            Some(CountStrategy::Named(class)) => Err(FilterError::invalid_strategy(
                name,
                format!("counting strategy '{class}' was not resolved"),
            )),
        }
    }
}

impl<Q, D> Deref for CountableFilter<Q, D> {
    type Target = Filter<Q, D>;

    fn deref(&self) -> &Self::Target {
        &self.filter
    }
}

impl<Q, D> DerefMut for CountableFilter<Q, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.filter
    }
}
