//! The filter engine.
//!
//! A [`Filter`] pairs a [`FilterDefinition`] (schema, strategies, fallback
//! hook) with the [`FilterData`] of one request, and applies it to a query:
//!
//! 1. registered joins are forgotten,
//! 2. setting attributes are copied into the settings bag,
//! 3. named strategies of set attributes are resolved,
//! 4. each applicable attribute is dispatched to its strategy, in declaration
//!    order, skipping ignored and unset ones,
//! 5. the joins strategies registered are attached.

use serde_json::Value;
use sifter_query::{JoinKind, QueryBuilder};

use crate::data::{Attributes, FilterData, FilterDataSchema};
use crate::error::{FilterError, Result};
use crate::joins::{JoinParameters, JoinRegistry};
use crate::strategy::{Strategies, Strategy, StrategyRegistry};

/// Returns `true` when a parameter should be skipped.
///
/// `false` is always a value. `null`, empty strings, empty lists, empty
/// objects and numeric zero are not.
///
/// ```
/// use serde_json::json;
/// use sifter::is_unset;
///
/// assert!(!is_unset(&json!(false)));
/// assert!(is_unset(&json!(null)));
/// assert!(is_unset(&json!("")));
/// assert!(is_unset(&json!([])));
/// assert!(is_unset(&json!(0)));
/// assert!(!is_unset(&json!("0")));
/// ```
pub fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(_) => false,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Per-application state handed to strategies.
pub struct FilterContext<'a> {
    data: &'a FilterData,
    settings: &'a mut Attributes,
    joins: &'a mut JoinRegistry,
}

impl<'a> FilterContext<'a> {
    /// Context over caller-owned state, for driving strategies directly.
    pub fn new(
        data: &'a FilterData,
        settings: &'a mut Attributes,
        joins: &'a mut JoinRegistry,
    ) -> Self {
        FilterContext {
            data,
            settings,
            joins,
        }
    }

    pub fn filter_data(&self) -> &FilterData {
        self.data
    }

    pub fn parameter_value(&self, name: &str) -> Option<&Value> {
        self.data.parameter_value(name)
    }

    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    pub fn set_setting(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.settings.insert(key.into(), value.into());
    }

    /// Registers a join to attach once every parameter is applied.
    pub fn add_join(
        &mut self,
        key: impl Into<String>,
        parameters: JoinParameters,
        kind: Option<JoinKind>,
    ) {
        self.joins.add(key, parameters, kind);
    }

    pub fn joins(&self) -> &JoinRegistry {
        self.joins
    }
}

/// What a concrete filter declares.
pub trait FilterDefinition<Q: QueryBuilder> {
    /// Schema of the data this filter applies.
    fn schema(&self) -> FilterDataSchema;

    /// Strategy per attribute.
    fn strategies(&self) -> Strategies<Q>;

    /// Hook to register named strategies beyond the built-ins.
    fn register_strategies(&self, _registry: &mut StrategyRegistry<Q>) {}

    /// Handles set attributes without a strategy.
    fn apply_parameter(
        &self,
        name: &str,
        _value: &Value,
        _query: &mut Q,
        _ctx: &mut FilterContext<'_>,
    ) -> Result<()> {
        Err(FilterError::unhandled_parameter(name))
    }

    /// Decides whether a value counts as absent. Defaults to [`is_unset`].
    fn is_parameter_value_unset(&self, _name: &str, value: &Value) -> bool {
        is_unset(value)
    }
}

/// A definition bound to filter data, ready to apply.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use serde_json::json;
/// use sifter::{Filter, FilterDataSchema, FilterDefinition, SimpleString, Strategies};
/// use sifter_query::{Database, MemoryQuery, Value};
///
/// struct Models;
///
/// impl FilterDefinition<MemoryQuery> for Models {
///     fn schema(&self) -> FilterDataSchema {
///         FilterDataSchema::new("models").with_default("name", json!(null))
///     }
///
///     fn strategies(&self) -> Strategies<MemoryQuery> {
///         Strategies::new().filter("name", SimpleString::new())
///     }
/// }
///
/// let mut db = Database::new();
/// db.create_table("models", ["name"])
///     .insert([("name", Value::from("simple name"))])
///     .insert([("name", Value::from("special name"))]);
/// let db = Rc::new(db);
///
/// let mut filter = Filter::from_value(Models, json!({ "name": "special" })).unwrap();
/// let mut query = MemoryQuery::new(db, "models");
/// filter.apply(&mut query).unwrap();
///
/// assert_eq!(query.count().unwrap(), 1);
/// ```
pub struct Filter<Q, D> {
    definition: D,
    data: FilterData,
    strategies: Strategies<Q>,
    registry: StrategyRegistry<Q>,
    settings: Attributes,
    joins: JoinRegistry,
    ignored: Vec<String>,
}

impl<Q, D> Filter<Q, D>
where
    Q: QueryBuilder + 'static,
    D: FilterDefinition<Q>,
{
    /// Builds filter data from raw attributes with the definition's schema.
    pub fn new(definition: D, attributes: Attributes) -> Result<Self> {
        let data = FilterData::new(&definition.schema(), attributes)?;
        Self::with_data(definition, data)
    }

    /// Like [`new`](Self::new), from a JSON object.
    pub fn from_value(definition: D, value: Value) -> Result<Self> {
        let data = FilterData::from_value(&definition.schema(), value)?;
        Self::with_data(definition, data)
    }

    /// Uses already built filter data; its schema must match the definition's.
    pub fn with_data(definition: D, data: FilterData) -> Result<Self> {
        check_schema(&definition.schema(), &data)?;
        let mut registry = StrategyRegistry::with_builtins();
        definition.register_strategies(&mut registry);
        let strategies = definition.strategies();
        Ok(Filter {
            definition,
            data,
            strategies,
            registry,
            settings: Attributes::new(),
            joins: JoinRegistry::new(),
            ignored: Vec::new(),
        })
    }

    pub fn definition(&self) -> &D {
        &self.definition
    }

    pub fn filter_data(&self) -> &FilterData {
        &self.data
    }

    /// Replaces the filter data.
    pub fn set_filter_data(&mut self, data: FilterData) -> Result<()> {
        check_schema(&self.definition.schema(), &data)?;
        self.data = data;
        Ok(())
    }

    pub fn parameter_value(&self, name: &str) -> Option<&Value> {
        self.data.parameter_value(name)
    }

    pub fn strategies(&self) -> &Strategies<Q> {
        &self.strategies
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    pub fn set_setting(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.settings.insert(key.into(), value.into());
    }

    pub fn settings(&self) -> &Attributes {
        &self.settings
    }

    // ========================================================================
    // Joins
    // ========================================================================

    /// Registers a join for the current application.
    pub fn add_join(
        &mut self,
        key: impl Into<String>,
        parameters: JoinParameters,
        kind: Option<JoinKind>,
    ) {
        self.joins.add(key, parameters, kind);
    }

    /// Joins registered by the last application.
    pub fn joins(&self) -> &JoinRegistry {
        &self.joins
    }

    // ========================================================================
    // Ignored parameters
    // ========================================================================

    pub fn ignore_parameter(&mut self, name: impl Into<String>) {
        self.ignored.push(name.into());
    }

    pub fn ignore_parameters<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.extend(names.into_iter().map(Into::into));
    }

    pub fn unignore_parameter(&mut self, name: &str) {
        self.ignored.retain(|ignored| ignored != name);
    }

    pub fn is_parameter_ignored(&self, name: &str) -> bool {
        self.ignored.iter().any(|ignored| ignored == name)
    }

    pub fn is_parameter_value_unset(&self, name: &str, value: &Value) -> bool {
        self.definition.is_parameter_value_unset(name, value)
    }

    // ========================================================================
    // Application
    // ========================================================================

    /// Applies every set, applicable, non-ignored parameter to `query`.
    pub fn apply<'q>(&mut self, query: &'q mut Q) -> Result<&'q mut Q> {
        self.joins.clear();
        tracing::debug!(
            data = %self.data.schema_name(),
            ignored = ?self.ignored,
            "applying filter"
        );
        self.apply_parameters(query)?;
        self.apply_joins(query);
        Ok(query)
    }

    /// Applies with `name` ignored, restoring the ignore list on every path.
    pub(crate) fn apply_ignoring(&mut self, name: &str, query: &mut Q) -> Result<()> {
        self.ignored.push(name.to_string());
        let outcome = self.apply(query).map(|_| ());
        if let Some(index) = self.ignored.iter().rposition(|ignored| ignored == name) {
            self.ignored.remove(index);
        }
        outcome
    }

    pub(crate) fn registry(&self) -> &StrategyRegistry<Q> {
        &self.registry
    }

    /// Splits out the definition and a context for counters.
    pub(crate) fn context(&mut self) -> (&D, FilterContext<'_>) {
        let ctx = FilterContext {
            data: &self.data,
            settings: &mut self.settings,
            joins: &mut self.joins,
        };
        (&self.definition, ctx)
    }

    fn store_global_settings(&mut self) {
        for (name, strategy) in self.strategies.iter() {
            if matches!(strategy, Strategy::Setting) {
                let value = self.data.parameter_value(name).cloned().unwrap_or(Value::Null);
                self.settings.insert(name.to_string(), value);
            }
        }
    }

    fn build_strategies(&mut self) -> Result<()> {
        let Filter {
            definition,
            data,
            strategies,
            registry,
            ignored,
            ..
        } = self;

        for (name, strategy) in strategies.iter_mut() {
            let Strategy::Named(class) = strategy else {
                continue;
            };
            if ignored.iter().any(|ignored| ignored == name) {
                continue;
            }
            let set = data
                .parameter_value(name)
                .is_some_and(|value| !definition.is_parameter_value_unset(name, value));
            if !set {
                continue;
            }
            let resolved = registry.resolve_filter(name, class)?;
            tracing::trace!(parameter = name, strategy = %class, "resolved named strategy");
            *strategy = Strategy::Filter(resolved);
        }
        Ok(())
    }

    fn apply_parameters(&mut self, query: &mut Q) -> Result<()> {
        self.store_global_settings();
        self.build_strategies()?;

        let Filter {
            definition,
            data,
            strategies,
            settings,
            joins,
            ignored,
            ..
        } = self;
        let data: &FilterData = data;

        for name in data.applicable_attributes() {
            if ignored.iter().any(|ignored| ignored == name) {
                tracing::trace!(parameter = name, "ignored");
                continue;
            }
            let Some(value) = data.parameter_value(name) else {
                continue;
            };
            if definition.is_parameter_value_unset(name, value) {
                continue;
            }

            let strategy = strategies.get(name);
            tracing::trace!(
                parameter = name,
                strategy = strategy.map_or("fallback", Strategy::kind),
                "applying parameter"
            );
            let mut ctx = FilterContext {
                data,
                settings: &mut *settings,
                joins: &mut *joins,
            };
            match strategy {
                Some(Strategy::Setting) => {}
                Some(Strategy::Filter(filter)) => filter.apply(name, value, query, &mut ctx)?,
                Some(Strategy::Callback(callback)) => callback(name, value, query, &mut ctx)?,
                Some(Strategy::Fallback) | None => {
                    definition.apply_parameter(name, value, query, &mut ctx)?
                }
                Some(Strategy::Named(class)) => {
                    return Err(FilterError::invalid_strategy(
                        name,
                        format!("strategy '{class}' was not resolved"),
                    ))
                }
            }
        }
        Ok(())
    }

    fn apply_joins(&self, query: &mut Q) {
        for clause in self.joins.clauses() {
            tracing::trace!(table = %clause.table, kind = %clause.kind, "attaching join");
            query.join(clause);
        }
    }
}

fn check_schema(expected: &FilterDataSchema, data: &FilterData) -> Result<()> {
    if expected.name() != data.schema_name() {
        return Err(FilterError::DataMismatch {
            expected: expected.name().to_string(),
            actual: data.schema_name().to_string(),
        });
    }
    Ok(())
}
