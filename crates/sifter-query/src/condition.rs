//! Predicates and the chainable `where` surface.
//!
//! A [`Predicate`] is a single test against a row. [`Conditions`] is an
//! ordered list of predicates joined by `and`/`or`, evaluated with SQL
//! precedence (`and` binds tighter than `or`). The [`Where`] trait is the
//! surface filter strategies use to attach predicates, implemented both by
//! [`Conditions`] (for nested groups) and by every query builder.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::op::Op;
use crate::value::Value;

/// Connective joining a predicate to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl Boolean {
    /// Returns the SQL keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Boolean::And => "and",
            Boolean::Or => "or",
        }
    }
}

/// A single row test.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column <op> value`
    Compare { column: String, op: Op, value: Value },
    /// `column [not] in (values...)`
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    /// `column is [not] null`
    Null { column: String, negated: bool },
    /// Parenthesized group.
    Group(Conditions),
}

impl Predicate {
    /// Creates a comparison predicate.
    pub fn compare(column: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Evaluates this predicate against a row.
    ///
    /// `lookup` resolves a column name to the row's cell, `Null` when absent.
    pub fn matches<F>(&self, lookup: &F) -> Result<bool>
    where
        F: Fn(&str) -> Value,
    {
        match self {
            Predicate::Compare { column, op, value } => {
                let actual = lookup(column);
                if op.is_pattern() {
                    let (Some(text), Some(pattern)) = (actual.to_text(), value.to_text()) else {
                        return Ok(false);
                    };
                    let hit = like_matches(&pattern, &text)?;
                    Ok(if *op == Op::Like { hit } else { !hit })
                } else {
                    Ok(actual
                        .compare(value)
                        .is_some_and(|ordering| op.eval_ordering(ordering)))
                }
            }
            Predicate::In {
                column,
                values,
                negated,
            } => {
                let actual = lookup(column);
                if actual.is_null() {
                    return Ok(false);
                }
                let found = values.iter().any(|v| actual.loose_eq(v));
                Ok(found != *negated)
            }
            Predicate::Null { column, negated } => Ok(lookup(column).is_null() != *negated),
            Predicate::Group(conditions) => conditions.matches(lookup),
        }
    }
}

/// Matches `text` against a SQL LIKE pattern, case-insensitively.
///
/// `%` matches any run of characters and `_` exactly one.
pub fn like_matches(pattern: &str, text: &str) -> Result<bool> {
    Ok(like_regex(pattern)?.is_match(text))
}

/// Compiled LIKE patterns, reused across rows and queries.
static LIKE_PATTERNS: Lazy<Mutex<HashMap<String, Regex>>> = Lazy::new(Default::default);

const LIKE_CACHE_LIMIT: usize = 256;

fn like_regex(pattern: &str) -> Result<Regex> {
    let mut cache = LIKE_PATTERNS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }
    let regex = compile_like(pattern)?;
    if cache.len() >= LIKE_CACHE_LIMIT {
        cache.clear();
    }
    cache.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

fn compile_like(pattern: &str) -> Result<Regex> {
    let mut source = String::from("(?is)^");
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    source.push('$');
    Ok(Regex::new(&source)?)
}

/// Ordered list of predicates with their connectives.
///
/// # Example
///
/// ```
/// use sifter_query::{Conditions, Value, Where};
///
/// let mut conditions = Conditions::new();
/// conditions.where_null("name").or_where_eq("name", "");
///
/// assert!(conditions.matches(&|_| Value::Null).unwrap());
/// assert!(conditions.matches(&|_| Value::from("")).unwrap());
/// assert!(!conditions.matches(&|_| Value::from("x")).unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    items: Vec<(Boolean, Predicate)>,
}

impl Conditions {
    /// Creates an empty list. An empty list matches every row.
    pub fn new() -> Self {
        Conditions::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Predicates in the order they were attached.
    pub fn items(&self) -> &[(Boolean, Predicate)] {
        &self.items
    }

    /// Evaluates the list against a row. The first connective is ignored.
    pub fn matches<F>(&self, lookup: &F) -> Result<bool>
    where
        F: Fn(&str) -> Value,
    {
        let mut any = false;
        let mut all = true;
        for (index, (boolean, predicate)) in self.items.iter().enumerate() {
            if index > 0 && *boolean == Boolean::Or {
                any |= all;
                all = true;
            }
            if all {
                all = predicate.matches(lookup)?;
            }
        }
        Ok(any || all)
    }
}

impl Where for Conditions {
    fn push_condition(&mut self, boolean: Boolean, predicate: Predicate) -> &mut Self {
        self.items.push((boolean, predicate));
        self
    }
}

/// Chainable predicate attachment.
///
/// Implementors provide [`push_condition`](Where::push_condition); every other
/// method is built on it.
pub trait Where {
    /// Appends a predicate with its connective.
    fn push_condition(&mut self, boolean: Boolean, predicate: Predicate) -> &mut Self;

    // ========================================================================
    // Comparisons
    // ========================================================================

    fn where_cmp(&mut self, column: &str, op: Op, value: impl Into<Value>) -> &mut Self {
        self.push_condition(Boolean::And, Predicate::compare(column, op, value))
    }

    fn or_where_cmp(&mut self, column: &str, op: Op, value: impl Into<Value>) -> &mut Self {
        self.push_condition(Boolean::Or, Predicate::compare(column, op, value))
    }

    fn where_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.where_cmp(column, Op::Eq, value)
    }

    fn or_where_eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.or_where_cmp(column, Op::Eq, value)
    }

    fn where_like(&mut self, column: &str, pattern: impl Into<Value>) -> &mut Self {
        self.where_cmp(column, Op::Like, pattern)
    }

    // ========================================================================
    // Membership and nullness
    // ========================================================================

    fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let predicate = Predicate::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        };
        self.push_condition(Boolean::And, predicate)
    }

    fn where_not_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let predicate = Predicate::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        };
        self.push_condition(Boolean::And, predicate)
    }

    fn where_null(&mut self, column: &str) -> &mut Self {
        let predicate = Predicate::Null {
            column: column.to_string(),
            negated: false,
        };
        self.push_condition(Boolean::And, predicate)
    }

    fn or_where_null(&mut self, column: &str) -> &mut Self {
        let predicate = Predicate::Null {
            column: column.to_string(),
            negated: false,
        };
        self.push_condition(Boolean::Or, predicate)
    }

    fn where_not_null(&mut self, column: &str) -> &mut Self {
        let predicate = Predicate::Null {
            column: column.to_string(),
            negated: true,
        };
        self.push_condition(Boolean::And, predicate)
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// Attaches a parenthesized group built by `build`. Empty groups are dropped.
    fn where_group<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut Conditions),
    {
        let mut group = Conditions::new();
        build(&mut group);
        if group.is_empty() {
            return self;
        }
        self.push_condition(Boolean::And, Predicate::Group(group))
    }

    fn or_where_group<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut Conditions),
    {
        let mut group = Conditions::new();
        build(&mut group);
        if group.is_empty() {
            return self;
        }
        self.push_condition(Boolean::Or, Predicate::Group(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, position: i64) -> impl Fn(&str) -> Value {
        let name = name.to_string();
        move |column| match column {
            "name" => Value::from(name.as_str()),
            "position" => Value::from(position),
            _ => Value::Null,
        }
    }

    #[test]
    fn like_wildcards() {
        assert!(like_matches("%name%", "Special Name").unwrap());
        assert!(like_matches("sp_cial%", "special name").unwrap());
        assert!(!like_matches("%other%", "special name").unwrap());
        assert!(like_matches("a.b", "a.b").unwrap());
        assert!(!like_matches("a.b", "axb").unwrap());
    }

    #[test]
    fn like_patterns_compile_once() {
        let pattern = "%compiled once%";
        assert!(like_matches(pattern, "compiled once here").unwrap());
        let first = like_regex(pattern).unwrap();
        assert!(LIKE_PATTERNS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(pattern));
        assert!(!like_matches(pattern, "compiled twice").unwrap());
        assert_eq!(like_regex(pattern).unwrap().as_str(), first.as_str());
    }

    #[test]
    fn and_binds_tighter_than_or() {
        // name = 'a' and position = 1 or position = 14
        let mut conditions = Conditions::new();
        conditions
            .where_eq("name", "a")
            .where_eq("position", 1)
            .or_where_eq("position", 14);

        assert!(conditions.matches(&row("a", 1)).unwrap());
        assert!(conditions.matches(&row("b", 14)).unwrap());
        assert!(!conditions.matches(&row("b", 1)).unwrap());
    }

    #[test]
    fn groups_nest() {
        let mut conditions = Conditions::new();
        conditions
            .where_eq("position", 14)
            .where_group(|g| {
                g.where_eq("name", "a").or_where_eq("name", "b");
            });

        assert!(conditions.matches(&row("b", 14)).unwrap());
        assert!(!conditions.matches(&row("c", 14)).unwrap());
        assert!(!conditions.matches(&row("a", 1)).unwrap());
    }

    #[test]
    fn empty_group_is_dropped() {
        let mut conditions = Conditions::new();
        conditions.where_group(|_| {});
        assert!(conditions.is_empty());
    }

    #[test]
    fn in_lists() {
        let mut conditions = Conditions::new();
        conditions.where_in("position", [1, 2]);
        assert!(conditions.matches(&row("a", 2)).unwrap());
        assert!(!conditions.matches(&row("a", 3)).unwrap());

        let mut negated = Conditions::new();
        negated.where_not_in("position", [1, 2]);
        assert!(negated.matches(&row("a", 3)).unwrap());

        let mut empty = Conditions::new();
        empty.where_in("position", Vec::<i64>::new());
        assert!(!empty.matches(&row("a", 1)).unwrap());
    }

    #[test]
    fn null_tests() {
        let mut conditions = Conditions::new();
        conditions.where_null("missing");
        assert!(conditions.matches(&row("a", 1)).unwrap());

        let mut not_null = Conditions::new();
        not_null.where_not_null("name");
        assert!(not_null.matches(&row("a", 1)).unwrap());
    }

    #[test]
    fn comparisons_with_null_never_match() {
        let mut conditions = Conditions::new();
        conditions.where_cmp("missing", Op::Ne, 1);
        assert!(!conditions.matches(&row("a", 1)).unwrap());
    }

    #[test]
    fn not_like() {
        let mut conditions = Conditions::new();
        conditions.where_cmp("name", Op::NotLike, "%spec%");
        assert!(conditions.matches(&row("random", 1)).unwrap());
        assert!(!conditions.matches(&row("special", 1)).unwrap());
    }
}
