//! Join collection for one filter application.
//!
//! Strategies register joins by key while a filter applies; the filter
//! attaches every registered join once, after all parameters ran. Keys make
//! registration idempotent: two strategies needing the same translation table
//! share one join.

use std::collections::HashMap;

use sifter_query::{JoinClause, JoinKind, Op};

/// Conventional join keys used by the built-in strategies.
pub struct JoinKey;

impl JoinKey {
    pub const TRANSLATIONS: &'static str = "translations";
    pub const PARENT: &'static str = "parent";
    pub const CHILDREN: &'static str = "children";
    pub const CHILD: &'static str = "child";
}

/// Table and condition of a join, without its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinParameters {
    pub table: String,
    pub first: String,
    pub op: Op,
    pub second: String,
}

impl JoinParameters {
    pub fn new(
        table: impl Into<String>,
        first: impl Into<String>,
        op: Op,
        second: impl Into<String>,
    ) -> Self {
        JoinParameters {
            table: table.into(),
            first: first.into(),
            op,
            second: second.into(),
        }
    }

    /// Equality join: `table on first = second`.
    pub fn on(
        table: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        JoinParameters::new(table, first, Op::Eq, second)
    }

    pub fn to_clause(&self, kind: JoinKind) -> JoinClause {
        JoinClause {
            kind,
            table: self.table.clone(),
            first: self.first.clone(),
            op: self.op,
            second: self.second.clone(),
        }
    }
}

/// Joins keyed by name, in first-registration order.
///
/// Kinds are tracked separately and survive [`clear`](JoinRegistry::clear);
/// a key without a recorded kind joins as [`JoinKind::Left`].
///
/// ```
/// use sifter::{JoinParameters, JoinRegistry};
/// use sifter_query::JoinKind;
///
/// let mut joins = JoinRegistry::new();
/// joins.add("t", JoinParameters::on("t", "t.a_id", "a.id"), Some(JoinKind::Inner));
/// joins.add("t", JoinParameters::on("t", "t.a_id", "a.id"), None);
///
/// assert_eq!(joins.len(), 1);
/// assert_eq!(joins.kind_of("t"), JoinKind::Inner);
/// ```
#[derive(Debug, Clone, Default)]
pub struct JoinRegistry {
    joins: Vec<(String, JoinParameters)>,
    kinds: HashMap<String, JoinKind>,
}

impl JoinRegistry {
    pub fn new() -> Self {
        JoinRegistry::default()
    }

    /// Registers `parameters` under `key`, replacing earlier parameters in
    /// place. `Some(kind)` reclassifies the key, `None` keeps its kind.
    pub fn add(
        &mut self,
        key: impl Into<String>,
        parameters: JoinParameters,
        kind: Option<JoinKind>,
    ) {
        let key = key.into();
        match kind {
            Some(JoinKind::Left) => {
                self.kinds.remove(&key);
            }
            Some(kind) => {
                self.kinds.insert(key.clone(), kind);
            }
            None => {}
        }
        match self.joins.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = parameters,
            None => self.joins.push((key, parameters)),
        }
    }

    /// Forgets registered joins. Kinds are kept.
    pub fn clear(&mut self) {
        self.joins.clear();
    }

    pub fn kind_of(&self, key: &str) -> JoinKind {
        self.kinds.get(key).copied().unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&JoinParameters> {
        self.joins
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, parameters)| parameters)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.joins.iter().map(|(key, _)| key.as_str())
    }

    /// Join clauses in registration order, with their kinds.
    pub fn clauses(&self) -> Vec<JoinClause> {
        self.joins
            .iter()
            .map(|(key, parameters)| parameters.to_clause(self.kind_of(key)))
            .collect()
    }
}
