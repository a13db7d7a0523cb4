//! Filter data: the validated, defaults-merged parameters a filter applies.
//!
//! A [`FilterDataSchema`] declares which attributes a filter understands
//! (its defaults, in order), how supplied attributes are sanitized, and which
//! rules they must pass. Schemas are plain data and can be loaded from YAML or
//! JSON. [`FilterData`] is built from a schema and the raw attributes of one
//! request.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{FilterError, Result};
use crate::validation::{Messages, RuleSet, RuleValidator, Rules, Validatable, Validator};

/// Ordered attribute map. Order of keys is declaration order.
pub type Attributes = serde_json::Map<String, Value>;

/// Hook transforming raw attributes before validation.
pub type Sanitizer = fn(Attributes) -> Attributes;

/// Declaration of the attributes a filter accepts.
///
/// # Example
///
/// ```
/// use sifter::{FilterDataSchema, Rule};
/// use serde_json::json;
///
/// let schema = FilterDataSchema::new("models")
///     .with_default("name", json!(null))
///     .with_default("relateds", json!([]))
///     .with_rule("relateds", Rule::Array);
///
/// let from_yaml = FilterDataSchema::from_yaml_str(
///     "name: models\ndefaults:\n  name: ~\n  relateds: []\nrules:\n  relateds: array\n",
/// )
/// .unwrap();
///
/// assert_eq!(schema.defaults(), from_yaml.defaults());
/// assert_eq!(schema.rules(), from_yaml.rules());
/// ```
#[derive(Clone, Default, Deserialize)]
pub struct FilterDataSchema {
    #[serde(default)]
    name: String,
    #[serde(default)]
    defaults: Attributes,
    #[serde(default)]
    rules: Rules,
    #[serde(skip)]
    sanitizer: Option<Sanitizer>,
    #[serde(skip)]
    validator: Option<Rc<dyn Validator>>,
}

impl FilterDataSchema {
    /// Creates an empty schema. The name identifies the data type a filter
    /// expects.
    pub fn new(name: impl Into<String>) -> Self {
        FilterDataSchema {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Loads a schema from YAML.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Loads a schema from JSON.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Declares an applicable attribute and its default value.
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Adds rules for an attribute.
    pub fn with_rule(mut self, name: impl Into<String>, rules: impl Into<RuleSet>) -> Self {
        let rules = rules.into();
        let entry = self.rules.entry(name.into()).or_default();
        *entry = entry.rules().iter().cloned().chain(rules.iter().cloned()).collect();
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = Some(sanitizer);
        self
    }

    /// Replaces the built-in [`RuleValidator`].
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Rc::new(validator));
        self
    }

    /// Renames the schema; useful after loading from configuration.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn defaults(&self) -> &Attributes {
        &self.defaults
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Builds filter data for one set of raw attributes.
    pub fn build(&self, attributes: Attributes) -> Result<FilterData> {
        FilterData::new(self, attributes)
    }
}

impl fmt::Debug for FilterDataSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDataSchema")
            .field("name", &self.name)
            .field("defaults", &self.defaults)
            .field("rules", &self.rules)
            .field("sanitizer", &self.sanitizer.is_some())
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// Validated parameters for one filter application.
///
/// After construction `attributes` is the defaults overlaid with the supplied
/// values. Only attributes declared in the defaults are applicable.
#[derive(Clone)]
pub struct FilterData {
    schema: String,
    attributes: Attributes,
    defaults: Attributes,
    rules: Rules,
    validator: Rc<dyn Validator>,
    messages: Option<Messages>,
}

impl FilterData {
    /// Sanitizes, validates and merges `attributes` with the schema defaults.
    ///
    /// Only the supplied attributes are validated; defaults never are.
    pub fn new(schema: &FilterDataSchema, attributes: Attributes) -> Result<Self> {
        Self::build(schema, attributes, None)
    }

    /// Like [`new`](Self::new), with `defaults` replacing the schema defaults
    /// wholesale.
    pub fn with_defaults(
        schema: &FilterDataSchema,
        attributes: Attributes,
        defaults: Attributes,
    ) -> Result<Self> {
        Self::build(schema, attributes, Some(defaults))
    }

    /// Builds filter data from a JSON object. `null` counts as no attributes.
    pub fn from_value(schema: &FilterDataSchema, value: Value) -> Result<Self> {
        match value {
            Value::Object(attributes) => Self::new(schema, attributes),
            Value::Null => Self::new(schema, Attributes::new()),
            other => Err(FilterError::InvalidData(json_kind(&other))),
        }
    }

    fn build(
        schema: &FilterDataSchema,
        attributes: Attributes,
        defaults: Option<Attributes>,
    ) -> Result<Self> {
        let attributes = match schema.sanitizer {
            Some(sanitize) => sanitize(attributes),
            None => attributes,
        };
        let validator: Rc<dyn Validator> = schema
            .validator
            .clone()
            .unwrap_or_else(|| Rc::new(RuleValidator));

        let mut messages = None;
        if !schema.rules.is_empty() {
            let found = validator.validate(&attributes, &schema.rules);
            if !found.is_empty() {
                tracing::debug!(
                    schema = %schema.name,
                    invalid = found.len(),
                    "filter data failed validation"
                );
                return Err(FilterError::ValidationFailed { messages: found });
            }
            messages = Some(found);
        }

        let defaults = defaults.unwrap_or_else(|| schema.defaults.clone());
        let mut merged = defaults.clone();
        for (name, value) in attributes {
            merged.insert(name, value);
        }

        Ok(FilterData {
            schema: schema.name.clone(),
            attributes: merged,
            defaults,
            rules: schema.rules.clone(),
            validator,
            messages,
        })
    }

    /// Name of the schema this data was built from.
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    /// Current value of a parameter, `None` when absent.
    pub fn parameter_value(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Attributes a filter may apply, in declaration order.
    pub fn applicable_attributes(&self) -> impl Iterator<Item = &str> {
        self.defaults.keys().map(String::as_str)
    }

    pub fn is_applicable(&self, name: &str) -> bool {
        self.defaults.contains_key(name)
    }

    pub fn defaults(&self) -> &Attributes {
        &self.defaults
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Owned copy of the merged attributes.
    pub fn to_map(&self) -> Attributes {
        self.attributes.clone()
    }
}

impl Validatable for FilterData {
    fn validate(&mut self) -> bool {
        let messages = self.validator.validate(&self.attributes, &self.rules);
        let passed = messages.is_empty();
        self.messages = Some(messages);
        passed
    }

    fn messages(&self) -> Messages {
        self.messages
            .clone()
            .unwrap_or_else(|| self.validator.validate(&self.attributes, &self.rules))
    }

    fn rules(&self) -> &Rules {
        &self.rules
    }

    fn set_rules(&mut self, rules: Rules) {
        self.rules = rules;
        self.messages = None;
    }
}

impl fmt::Debug for FilterData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterData")
            .field("schema", &self.schema)
            .field("attributes", &self.attributes)
            .field("defaults", &self.defaults)
            .field("rules", &self.rules)
            .finish()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Rule;
    use serde_json::json;

    fn schema() -> FilterDataSchema {
        FilterDataSchema::new("models")
            .with_default("name", Value::Null)
            .with_default("position", Value::Null)
            .with_default("with_inactive", false)
    }

    #[test]
    fn merged_in_declaration_order() {
        let data = FilterData::from_value(&schema(), json!({ "position": 3, "extra": 1 })).unwrap();
        let order: Vec<_> = data.applicable_attributes().collect();
        assert_eq!(order, vec!["name", "position", "with_inactive"]);
        assert_eq!(data.parameter_value("position"), Some(&json!(3)));
        assert_eq!(data.parameter_value("with_inactive"), Some(&json!(false)));
        assert_eq!(data.parameter_value("extra"), Some(&json!(1)));
        assert!(!data.is_applicable("extra"));
        assert_eq!(data.parameter_value("missing"), None);
    }

    #[test]
    fn rejects_non_objects() {
        let err = FilterData::from_value(&schema(), json!([1])).unwrap_err();
        assert_eq!(err.to_string(), "Filter data must be an object, got a list");
        assert!(FilterData::from_value(&schema(), Value::Null).is_ok());
    }

    #[test]
    fn rules_accumulate() {
        let schema = FilterDataSchema::new("x")
            .with_rule("list", Rule::Array)
            .with_rule("list", Rule::Size(2.0));
        assert_eq!(schema.rules()["list"].to_string(), "array|size:2");
    }

    #[test]
    fn revalidation_after_rule_change() {
        let mut data = FilterData::from_value(&schema(), json!({ "name": 5 })).unwrap();
        assert!(data.validate());

        let mut rules = Rules::new();
        rules.insert("name".into(), Rule::String.into());
        data.set_rules(rules);
        assert_eq!(data.messages().len(), 1);
        assert!(!data.validate());
        assert!(data.messages().has("name"));
    }
}
