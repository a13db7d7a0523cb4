//! Attribute validation: rules, rule sets, messages and validators.
//!
//! Rules use the familiar pipe syntax (`"array|size:2"`) so they can be
//! declared in configuration, and are also available as the typed [`Rule`]
//! enum. A [`Validator`] checks a set of attributes against rules and returns
//! [`Messages`]; an empty message bag means the attributes passed.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::Attributes;
use crate::error::{FilterError, Result};

/// Rule sets keyed by attribute name.
pub type Rules = BTreeMap<String, RuleSet>;

/// A single validation rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Attribute must be present and not empty.
    Required,
    /// `null` passes every other rule.
    Nullable,
    String,
    Integer,
    Numeric,
    Boolean,
    /// A list or an object.
    Array,
    /// Exact size: item count, character count, or numeric value.
    Size(f64),
    Min(f64),
    Max(f64),
    /// Value must be one of the listed options.
    In(Vec<String>),
}

impl FromStr for Rule {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || FilterError::InvalidRule(s.to_string());
        let (name, argument) = match s.split_once(':') {
            Some((name, argument)) => (name.trim(), Some(argument.trim())),
            None => (s.trim(), None),
        };
        let bound = || -> Result<f64> {
            argument
                .and_then(|a| a.parse::<f64>().ok())
                .ok_or_else(invalid)
        };

        match name.to_ascii_lowercase().as_str() {
            "required" => Ok(Rule::Required),
            "nullable" => Ok(Rule::Nullable),
            "string" => Ok(Rule::String),
            "integer" | "int" => Ok(Rule::Integer),
            "numeric" => Ok(Rule::Numeric),
            "boolean" | "bool" => Ok(Rule::Boolean),
            "array" => Ok(Rule::Array),
            "size" => Ok(Rule::Size(bound()?)),
            "min" => Ok(Rule::Min(bound()?)),
            "max" => Ok(Rule::Max(bound()?)),
            "in" => {
                let options = argument.ok_or_else(invalid)?;
                Ok(Rule::In(
                    options.split(',').map(|o| o.trim().to_string()).collect(),
                ))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Required => f.write_str("required"),
            Rule::Nullable => f.write_str("nullable"),
            Rule::String => f.write_str("string"),
            Rule::Integer => f.write_str("integer"),
            Rule::Numeric => f.write_str("numeric"),
            Rule::Boolean => f.write_str("boolean"),
            Rule::Array => f.write_str("array"),
            Rule::Size(n) => write!(f, "size:{n}"),
            Rule::Min(n) => write!(f, "min:{n}"),
            Rule::Max(n) => write!(f, "max:{n}"),
            Rule::In(options) => write!(f, "in:{}", options.join(",")),
        }
    }
}

/// The rules declared for one attribute.
///
/// ```
/// use sifter::{Rule, RuleSet};
///
/// let rules: RuleSet = "array|size:2".parse().unwrap();
/// assert_eq!(rules.rules(), &[Rule::Array, Rule::Size(2.0)]);
/// assert_eq!(rules.to_string(), "array|size:2");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "RuleSpec")]
pub struct RuleSet(Vec<Rule>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleSpec {
    Piped(String),
    List(Vec<String>),
}

impl TryFrom<RuleSpec> for RuleSet {
    type Error = FilterError;

    fn try_from(spec: RuleSpec) -> Result<Self> {
        match spec {
            RuleSpec::Piped(text) => text.parse(),
            RuleSpec::List(items) => items.iter().map(|item| item.parse::<Rule>()).collect(),
        }
    }
}

impl RuleSet {
    pub fn new() -> Self {
        RuleSet::default()
    }

    /// Adds a rule.
    pub fn with(mut self, rule: Rule) -> Self {
        self.0.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.0
    }

    pub fn contains(&self, rule: &Rule) -> bool {
        self.0.contains(rule)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.0.iter()
    }

    fn is_numeric(&self) -> bool {
        self.contains(&Rule::Integer) || self.contains(&Rule::Numeric)
    }
}

impl FromStr for RuleSet {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        s.split('|')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse::<Rule>)
            .collect()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        RuleSet(iter.into_iter().collect())
    }
}

impl From<Rule> for RuleSet {
    fn from(rule: Rule) -> Self {
        RuleSet(vec![rule])
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Rule::to_string).collect();
        f.write_str(&parts.join("|"))
    }
}

/// Validation messages keyed by attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Messages {
    fields: BTreeMap<String, Vec<String>>,
}

impl Messages {
    pub fn new() -> Self {
        Messages::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field).first().map(String::as_str)
    }

    /// Number of invalid attributes.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl fmt::Display for Messages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Checks attributes against rules.
pub trait Validator {
    /// Returns the failures; empty means the attributes passed.
    fn validate(&self, attributes: &Attributes, rules: &Rules) -> Messages;
}

/// Capability of objects that carry rules and validate themselves.
pub trait Validatable {
    /// Validates the current attributes and records the messages.
    fn validate(&mut self) -> bool;

    /// Messages of the last validation.
    fn messages(&self) -> Messages;

    fn rules(&self) -> &Rules;

    fn set_rules(&mut self, rules: Rules);
}

/// Validator for the built-in [`Rule`] set.
///
/// Rules only apply to attributes that are present, except `required`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleValidator;

impl Validator for RuleValidator {
    fn validate(&self, attributes: &Attributes, rules: &Rules) -> Messages {
        let mut messages = Messages::new();
        for (field, set) in rules {
            match attributes.get(field) {
                None => {
                    if set.contains(&Rule::Required) {
                        messages.add(field, format!("The {field} field is required."));
                    }
                }
                Some(Value::Null) if set.contains(&Rule::Nullable) => {
                    if set.contains(&Rule::Required) {
                        messages.add(field, format!("The {field} field is required."));
                    }
                }
                Some(value) => {
                    for rule in set.iter() {
                        if let Some(message) = check(field, rule, value, set) {
                            messages.add(field, message);
                        }
                    }
                }
            }
        }
        messages
    }
}

fn check(field: &str, rule: &Rule, value: &Value, set: &RuleSet) -> Option<String> {
    let fails = match rule {
        Rule::Required => is_blank(value),
        Rule::Nullable => false,
        Rule::String => !value.is_string(),
        Rule::Integer => !is_integer(value),
        Rule::Numeric => numeric(value).is_none(),
        Rule::Boolean => !is_boolean(value),
        Rule::Array => !(value.is_array() || value.is_object()),
        Rule::Size(n) => measure(value, set) != Some(*n),
        Rule::Min(n) => measure(value, set).map_or(true, |size| size < *n),
        Rule::Max(n) => measure(value, set).map_or(true, |size| size > *n),
        Rule::In(options) => !text(value).is_some_and(|t| options.contains(&t)),
    };
    if !fails {
        return None;
    }

    let unit = unit(value, set);
    Some(match rule {
        Rule::Required => format!("The {field} field is required."),
        Rule::String => format!("The {field} must be a string."),
        Rule::Integer => format!("The {field} must be an integer."),
        Rule::Numeric => format!("The {field} must be a number."),
        Rule::Boolean => format!("The {field} field must be true or false."),
        Rule::Array => format!("The {field} must be an array."),
        Rule::Size(n) => format!("The {field} must be {n}{unit}."),
        Rule::Min(n) => format!("The {field} must be at least {n}{unit}."),
        Rule::Max(n) => format!("The {field} must not be greater than {n}{unit}."),
        Rule::In(_) | Rule::Nullable => format!("The selected {field} is invalid."),
    })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn is_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Number(n) => matches!(n.as_u64(), Some(0 | 1)),
        Value::String(s) => matches!(s.as_str(), "0" | "1" | "true" | "false"),
        _ => false,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

/// Size of a value for `size`/`min`/`max`.
fn measure(value: &Value, set: &RuleSet) -> Option<f64> {
    match value {
        Value::Array(items) => Some(items.len() as f64),
        Value::Object(map) => Some(map.len() as f64),
        Value::String(s) if set.is_numeric() => numeric(value).or(Some(s.chars().count() as f64)),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn unit(value: &Value, set: &RuleSet) -> &'static str {
    match value {
        Value::Array(_) | Value::Object(_) => " items",
        Value::String(_) if !set.is_numeric() => " characters",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attributes(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => Attributes::new(),
        }
    }

    fn rules(pairs: &[(&str, &str)]) -> Rules {
        pairs
            .iter()
            .map(|(field, spec)| (field.to_string(), spec.parse().unwrap()))
            .collect()
    }

    #[test]
    fn parse_rules() {
        let set: RuleSet = "required|in:a, b|min:1|max:3".parse().unwrap();
        assert_eq!(
            set.rules(),
            &[
                Rule::Required,
                Rule::In(vec!["a".into(), "b".into()]),
                Rule::Min(1.0),
                Rule::Max(3.0)
            ]
        );
        assert!(matches!("size".parse::<Rule>(), Err(FilterError::InvalidRule(r)) if r == "size"));
        assert!("unknown".parse::<RuleSet>().is_err());
    }

    #[test]
    fn rule_sets_deserialize_from_strings_and_lists() {
        let piped: RuleSet = serde_json::from_value(json!("string|nullable")).unwrap();
        let listed: RuleSet = serde_json::from_value(json!(["string", "nullable"])).unwrap();
        assert_eq!(piped, listed);
        assert!(serde_json::from_value::<RuleSet>(json!("bogus")).is_err());
    }

    #[test]
    fn messages_count_invalid_fields() {
        let messages = RuleValidator.validate(
            &attributes(json!({
                "name": 123,
                "relateds": "1",
                "with_inactive": "yes",
                "unique_field": 1,
            })),
            &rules(&[
                ("name", "string"),
                ("relateds", "array|size:2"),
                ("with_inactive", "boolean"),
                ("unique_field", "integer"),
            ]),
        );
        assert_eq!(messages.len(), 3);
        assert_eq!(messages.get("relateds").len(), 2);
        assert_eq!(messages.first("name"), Some("The name must be a string."));
        assert!(!messages.has("unique_field"));
    }

    #[test]
    fn absent_attributes_only_fail_required() {
        let messages = RuleValidator.validate(
            &Attributes::new(),
            &rules(&[("name", "string"), ("position", "required|integer")]),
        );
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages.first("position"),
            Some("The position field is required.")
        );
    }

    #[test]
    fn nullable_lets_null_through() {
        let input = attributes(json!({ "a": null, "b": null }));
        let messages = RuleValidator.validate(
            &input,
            &rules(&[("a", "nullable|string"), ("b", "string")]),
        );
        assert!(!messages.has("a"));
        assert!(messages.has("b"));
    }

    #[test]
    fn sizes_by_type() {
        let input = attributes(json!({
            "list": [1, 2],
            "text": "abc",
            "number": "5",
        }));
        let messages = RuleValidator.validate(
            &input,
            &rules(&[
                ("list", "array|size:2"),
                ("text", "string|max:2"),
                ("number", "integer|min:6"),
            ]),
        );
        assert!(!messages.has("list"));
        assert_eq!(
            messages.first("text"),
            Some("The text must not be greater than 2 characters.")
        );
        assert_eq!(messages.first("number"), Some("The number must be at least 6."));
    }

    #[test]
    fn in_and_boolean() {
        let input = attributes(json!({ "sort": "name", "flag": 1, "other": "x" }));
        let messages = RuleValidator.validate(
            &input,
            &rules(&[("sort", "in:name,position"), ("flag", "boolean"), ("other", "in:a")]),
        );
        assert_eq!(messages.len(), 1);
        assert_eq!(messages.first("other"), Some("The selected other is invalid."));
    }

    #[test]
    fn messages_display() {
        let mut messages = Messages::new();
        messages.add("b", "B is bad.");
        messages.add("a", "A is bad.");
        assert_eq!(messages.to_string(), "a: A is bad.; b: B is bad.");
        assert_eq!(
            serde_json::to_value(&messages).unwrap(),
            json!({ "a": ["A is bad."], "b": ["B is bad."] })
        );
    }
}
