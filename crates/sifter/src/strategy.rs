//! Strategy abstractions, declarations and the named-strategy registry.
//!
//! A filter declares, per attribute, *how* that attribute is applied:
//!
//! | Declaration | Meaning |
//! |-------------|---------|
//! | [`Strategy::Filter`] | a [`ParameterFilter`] instance |
//! | [`Strategy::Named`] | a name resolved through the [`StrategyRegistry`] |
//! | [`Strategy::Setting`] | the value is stored as a setting, never applied |
//! | [`Strategy::Callback`] | a closure |
//! | [`Strategy::Fallback`] | the definition's `apply_parameter` hook |
//!
//! Counting strategies follow the same shape with [`CountStrategy`].

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use sifter_query::{QueryBuilder, ValueMap};

use crate::counters::{SimpleBelongsTo, SimpleDistinctValue};
use crate::error::{BoxError, FilterError, Result};
use crate::filter::FilterContext;
use crate::filters::{IsEmpty, SimpleInteger, SimpleString};

/// Declaration marker for setting attributes in configuration.
pub const SETTING: &str = "_setting_";

/// Applies one parameter to a query.
pub trait ParameterFilter<Q> {
    fn apply(
        &self,
        name: &str,
        value: &Value,
        query: &mut Q,
        ctx: &mut FilterContext<'_>,
    ) -> Result<()>;
}

/// Computes the counts for one countable from a prepared query.
pub trait ParameterCounter<Q> {
    fn count(&self, name: &str, query: &mut Q, ctx: &mut FilterContext<'_>) -> Result<ValueMap>;
}

/// Closure form of [`ParameterFilter`].
pub type FilterFn<Q> = Box<dyn Fn(&str, &Value, &mut Q, &mut FilterContext<'_>) -> Result<()>>;

/// Closure form of [`ParameterCounter`].
pub type CounterFn<Q> = Box<dyn Fn(&str, &mut Q, &mut FilterContext<'_>) -> Result<ValueMap>>;

/// How one attribute is applied.
pub enum Strategy<Q> {
    Filter(Box<dyn ParameterFilter<Q>>),
    Named(String),
    Setting,
    Callback(FilterFn<Q>),
    Fallback,
}

impl<Q> Strategy<Q> {
    pub fn filter(filter: impl ParameterFilter<Q> + 'static) -> Self {
        Strategy::Filter(Box::new(filter))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Strategy::Named(name.into())
    }

    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&str, &Value, &mut Q, &mut FilterContext<'_>) -> Result<()> + 'static,
    {
        Strategy::Callback(Box::new(callback))
    }

    /// Reads a configuration declaration: missing means fallback, [`SETTING`]
    /// marks a setting, anything else names a registered strategy.
    pub fn from_declaration(declaration: Option<&str>) -> Self {
        match declaration {
            None => Strategy::Fallback,
            Some(SETTING) => Strategy::Setting,
            Some(name) => Strategy::Named(name.to_string()),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Strategy::Filter(_) => "filter",
            Strategy::Named(_) => "named",
            Strategy::Setting => "setting",
            Strategy::Callback(_) => "callback",
            Strategy::Fallback => "fallback",
        }
    }
}

impl<Q> fmt::Debug for Strategy<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Named(name) => f.debug_tuple("Named").field(name).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// How one countable is counted.
pub enum CountStrategy<Q> {
    Counter(Box<dyn ParameterCounter<Q>>),
    Named(String),
    Callback(CounterFn<Q>),
    Fallback,
}

impl<Q> CountStrategy<Q> {
    pub fn counter(counter: impl ParameterCounter<Q> + 'static) -> Self {
        CountStrategy::Counter(Box::new(counter))
    }

    pub fn named(name: impl Into<String>) -> Self {
        CountStrategy::Named(name.into())
    }

    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&str, &mut Q, &mut FilterContext<'_>) -> Result<ValueMap> + 'static,
    {
        CountStrategy::Callback(Box::new(callback))
    }
}

impl<Q> fmt::Debug for CountStrategy<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountStrategy::Counter(_) => f.write_str("counter"),
            CountStrategy::Named(name) => f.debug_tuple("Named").field(name).finish(),
            CountStrategy::Callback(_) => f.write_str("callback"),
            CountStrategy::Fallback => f.write_str("fallback"),
        }
    }
}

/// Ordered attribute-name to declaration map.
///
/// Declaring a name twice replaces the first declaration in place.
#[derive(Debug)]
pub struct StrategyMap<S> {
    entries: Vec<(String, S)>,
}

/// Filter strategies keyed by attribute.
pub type Strategies<Q> = StrategyMap<Strategy<Q>>;

/// Count strategies keyed by countable.
pub type CountStrategies<Q> = StrategyMap<CountStrategy<Q>>;

impl<S> Default for StrategyMap<S> {
    fn default() -> Self {
        StrategyMap {
            entries: Vec::new(),
        }
    }
}

impl<S> StrategyMap<S> {
    pub fn new() -> Self {
        StrategyMap::default()
    }

    /// Declares (or redeclares) the strategy for `name`.
    pub fn with(mut self, name: impl Into<String>, strategy: S) -> Self {
        self.insert(name, strategy);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, strategy: S) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = strategy,
            None => self.entries.push((name, strategy)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&S> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, strategy)| strategy)
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

    pub fn iter(&self) -> impl Iterator<Item = (&str, &S)> {
        self.entries.iter().map(|(name, strategy)| (name.as_str(), strategy))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut S)> {
        self.entries
            .iter_mut()
            .map(|(name, strategy)| (name.as_str(), strategy))
    }
}

impl<Q> StrategyMap<Strategy<Q>> {
    pub fn filter(
        self,
        name: impl Into<String>,
        filter: impl ParameterFilter<Q> + 'static,
    ) -> Self {
        self.with(name, Strategy::filter(filter))
    }

    pub fn named(self, name: impl Into<String>, strategy: impl Into<String>) -> Self {
        self.with(name, Strategy::named(strategy))
    }

    pub fn setting(self, name: impl Into<String>) -> Self {
        self.with(name, Strategy::Setting)
    }

    pub fn callback<F>(self, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&str, &Value, &mut Q, &mut FilterContext<'_>) -> Result<()> + 'static,
    {
        self.with(name, Strategy::callback(callback))
    }

    pub fn fallback(self, name: impl Into<String>) -> Self {
        self.with(name, Strategy::Fallback)
    }

    /// Builds strategies from `(attribute, declaration)` pairs, as read from
    /// configuration. See [`Strategy::from_declaration`].
    pub fn from_declarations<I, K, V>(declarations: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut strategies = StrategyMap::new();
        for (name, declaration) in declarations {
            let declaration: Option<&str> = declaration.as_ref().map(|d| d.as_ref());
            strategies.insert(name, Strategy::from_declaration(declaration));
        }
        strategies
    }
}

impl<Q> StrategyMap<CountStrategy<Q>> {
    pub fn counter(
        self,
        name: impl Into<String>,
        counter: impl ParameterCounter<Q> + 'static,
    ) -> Self {
        self.with(name, CountStrategy::counter(counter))
    }

    pub fn named(self, name: impl Into<String>, strategy: impl Into<String>) -> Self {
        self.with(name, CountStrategy::named(strategy))
    }

    pub fn callback<F>(self, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&str, &mut Q, &mut FilterContext<'_>) -> Result<ValueMap> + 'static,
    {
        self.with(name, CountStrategy::callback(callback))
    }

    pub fn fallback(self, name: impl Into<String>) -> Self {
        self.with(name, CountStrategy::Fallback)
    }
}

type FilterFactory<Q> = Box<dyn Fn() -> std::result::Result<Box<dyn ParameterFilter<Q>>, BoxError>>;
type CounterFactory<Q> =
    Box<dyn Fn() -> std::result::Result<Box<dyn ParameterCounter<Q>>, BoxError>>;

enum Registered<Q> {
    Filter(FilterFactory<Q>),
    Counter(CounterFactory<Q>),
}

/// Zero-argument factories for strategies declared by name.
///
/// Resolution fails with [`FilterError::InvalidStrategy`] when the name is
/// unknown, when its factory fails, or when it names the wrong capability
/// (a counter used as a filter or the reverse).
///
/// ```
/// use sifter::{FilterError, SimpleString, StrategyRegistry};
/// use sifter_query::MemoryQuery;
///
/// let mut registry = StrategyRegistry::<MemoryQuery>::with_builtins();
/// registry.register_filter("ExactName", || SimpleString::new().exact(true));
///
/// assert!(registry.resolve_filter("name", "ExactName").is_ok());
/// let err = registry.resolve_filter("name", "NotAClass").err().unwrap();
/// assert!(err.to_string().contains("NotAClass"));
/// assert!(matches!(
///     registry.resolve_filter("name", "SimpleBelongsTo"),
///     Err(FilterError::InvalidStrategy { .. })
/// ));
/// ```
pub struct StrategyRegistry<Q> {
    entries: HashMap<String, Registered<Q>>,
}

impl<Q> Default for StrategyRegistry<Q> {
    fn default() -> Self {
        StrategyRegistry {
            entries: HashMap::new(),
        }
    }
}

impl<Q> StrategyRegistry<Q> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        StrategyRegistry::default()
    }

    pub fn register_filter<F, P>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> P + 'static,
        P: ParameterFilter<Q> + 'static,
    {
        let factory: FilterFactory<Q> =
            Box::new(move || Ok(Box::new(factory()) as Box<dyn ParameterFilter<Q>>));
        self.entries.insert(name.into(), Registered::Filter(factory));
        self
    }

    /// Registers a factory that can fail.
    pub fn try_register_filter<F, P, E>(
        &mut self,
        name: impl Into<String>,
        factory: F,
    ) -> &mut Self
    where
        F: Fn() -> std::result::Result<P, E> + 'static,
        P: ParameterFilter<Q> + 'static,
        E: Into<BoxError>,
    {
        let factory: FilterFactory<Q> = Box::new(move || match factory() {
            Ok(filter) => Ok(Box::new(filter) as Box<dyn ParameterFilter<Q>>),
            Err(err) => Err(err.into()),
        });
        self.entries.insert(name.into(), Registered::Filter(factory));
        self
    }

    pub fn register_counter<F, P>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> P + 'static,
        P: ParameterCounter<Q> + 'static,
    {
        let factory: CounterFactory<Q> =
            Box::new(move || Ok(Box::new(factory()) as Box<dyn ParameterCounter<Q>>));
        self.entries.insert(name.into(), Registered::Counter(factory));
        self
    }

    /// Registers a counter factory that can fail.
    pub fn try_register_counter<F, P, E>(
        &mut self,
        name: impl Into<String>,
        factory: F,
    ) -> &mut Self
    where
        F: Fn() -> std::result::Result<P, E> + 'static,
        P: ParameterCounter<Q> + 'static,
        E: Into<BoxError>,
    {
        let factory: CounterFactory<Q> = Box::new(move || match factory() {
            Ok(counter) => Ok(Box::new(counter) as Box<dyn ParameterCounter<Q>>),
            Err(err) => Err(err.into()),
        });
        self.entries.insert(name.into(), Registered::Counter(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Instantiates the filter registered as `strategy` for `parameter`.
    pub fn resolve_filter(
        &self,
        parameter: &str,
        strategy: &str,
    ) -> Result<Box<dyn ParameterFilter<Q>>> {
        match self.entries.get(strategy) {
            Some(Registered::Filter(factory)) => {
                factory().map_err(|source| instantiation_failed(parameter, strategy, source))
            }
            Some(Registered::Counter(_)) => Err(FilterError::invalid_strategy(
                parameter,
                format!("'{strategy}' is not a parameter filter"),
            )),
            None => Err(unregistered(parameter, strategy)),
        }
    }

    /// Instantiates the counter registered as `strategy` for `countable`.
    pub fn resolve_counter(
        &self,
        countable: &str,
        strategy: &str,
    ) -> Result<Box<dyn ParameterCounter<Q>>> {
        match self.entries.get(strategy) {
            Some(Registered::Counter(factory)) => {
                factory().map_err(|source| instantiation_failed(countable, strategy, source))
            }
            Some(Registered::Filter(_)) => Err(FilterError::invalid_strategy(
                countable,
                format!("'{strategy}' is not a parameter counter"),
            )),
            None => Err(unregistered(countable, strategy)),
        }
    }
}

impl<Q: QueryBuilder + 'static> StrategyRegistry<Q> {
    /// Registry holding the built-in strategies that need no arguments.
    pub fn with_builtins() -> Self {
        let mut registry = StrategyRegistry::new();
        registry
            .register_filter("SimpleString", SimpleString::new)
            .register_filter("SimpleInteger", SimpleInteger::new)
            .register_filter("IsEmpty", IsEmpty::new)
            .register_counter("SimpleBelongsTo", SimpleBelongsTo::new)
            .register_counter("SimpleDistinctValue", SimpleDistinctValue::new);
        registry
    }
}

impl<Q> fmt::Debug for StrategyRegistry<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("StrategyRegistry").field("names", &names).finish()
    }
}

fn unregistered(parameter: &str, strategy: &str) -> FilterError {
    FilterError::invalid_strategy(
        parameter,
        format!("uninstantiable strategy '{strategy}', no strategy is registered under that name"),
    )
}

fn instantiation_failed(parameter: &str, strategy: &str, source: BoxError) -> FilterError {
    FilterError::InvalidStrategy {
        name: parameter.to_string(),
        reason: format!("strategy '{strategy}' could not be instantiated"),
        source: Some(source),
    }
}
