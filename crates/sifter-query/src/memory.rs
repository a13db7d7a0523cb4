//! In-memory tables and a query builder that executes against them.
//!
//! [`MemoryQuery`] implements [`QueryBuilder`] with SQL-like semantics:
//! rows are qualified as `table.column`, joins run in the order they were
//! attached, predicates run after joins, and grouped selections support
//! `COUNT(*)` and `COUNT(column)`.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use sifter_query::{Database, MemoryQuery, QueryBuilder, Selection, Value, Where};
//!
//! let mut db = Database::new();
//! db.create_table("items", ["name", "position"])
//!     .insert([("name", Value::from("a")), ("position", Value::from(0))])
//!     .insert([("name", Value::from("b")), ("position", Value::from(14))])
//!     .insert([("name", Value::from("c")), ("position", Value::from(14))]);
//!
//! let mut query = MemoryQuery::new(Rc::new(db), "items");
//! query
//!     .select(vec![
//!         Selection::column("position").alias("value"),
//!         Selection::raw("count(*)").alias("count"),
//!     ])
//!     .group_by("position");
//!
//! let counts = query.pluck("count", "value").unwrap();
//! assert_eq!(counts.get(14), Some(&Value::from(2)));
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::builder::QueryBuilder;
use crate::condition::{Boolean, Conditions, Predicate, Where};
use crate::error::{QueryError, Result};
use crate::join::{JoinClause, JoinKind};
use crate::select::Selection;
use crate::sql;
use crate::value::Value;
use crate::value_map::ValueMap;

static COUNT_EXPRESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*count\s*\(\s*(\*|[A-Za-z0-9_.]+)\s*\)\s*$")
        .expect("count expression pattern is valid")
});

/// A row: column name to cell.
pub type Record = BTreeMap<String, Value>;

/// A named list of columns and the records stored under them.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            records: Vec::new(),
        }
    }

    /// Appends a record. Columns not declared yet are added to the table.
    pub fn insert<I, K, V>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Record::new();
        for (column, value) in cells {
            let column = column.into();
            if !self.columns.contains(&column) {
                self.columns.push(column.clone());
            }
            record.insert(column, value.into());
        }
        self.records.push(record);
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn qualified_rows(&self, name: &str) -> Vec<Record> {
        self.records
            .iter()
            .map(|record| {
                self.columns
                    .iter()
                    .map(|column| {
                        let cell = record.get(column).cloned().unwrap_or_default();
                        (format!("{name}.{column}"), cell)
                    })
                    .collect()
            })
            .collect()
    }
}

/// A set of named tables.
#[derive(Debug, Clone, Default)]
pub struct Database {
    tables: BTreeMap<String, Table>,
}

impl Database {
    pub fn new() -> Self {
        Database::default()
    }

    /// Creates (or replaces) a table and returns it for seeding.
    pub fn create_table<I, S>(&mut self, name: &str, columns: I) -> &mut Table
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables.insert(name.to_string(), Table::new(columns));
        self.tables.entry(name.to_string()).or_default()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }
}

enum Aggregate {
    CountAll,
    CountColumn(String),
}

fn parse_aggregate(expression: &str) -> Option<Aggregate> {
    let captures = COUNT_EXPRESSION.captures(expression)?;
    match &captures[1] {
        "*" => Some(Aggregate::CountAll),
        column => Some(Aggregate::CountColumn(column.to_string())),
    }
}

/// Resolves `column` in `row`: exact key, then `base.column`, then any
/// `*.column` for bare names.
fn lookup(row: &Record, base: &str, column: &str) -> Value {
    if let Some(value) = row.get(column) {
        return value.clone();
    }
    if column.contains('.') {
        return Value::Null;
    }
    if let Some(value) = row.get(&format!("{base}.{column}")) {
        return value.clone();
    }
    let suffix = format!(".{column}");
    row.iter()
        .find(|(key, _)| key.ends_with(&suffix))
        .map(|(_, value)| value.clone())
        .unwrap_or_default()
}

fn merged(left: &Record, right: &Record) -> Record {
    let mut row = left.clone();
    row.extend(right.iter().map(|(k, v)| (k.clone(), v.clone())));
    row
}

fn compare_keys(a: &[Value], b: &[Value]) -> std::cmp::Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(std::cmp::Ordering::Equal)
}

/// Query builder over a shared [`Database`].
#[derive(Debug, Clone)]
pub struct MemoryQuery {
    db: Rc<Database>,
    table: String,
    conditions: Conditions,
    joins: Vec<JoinClause>,
    selections: Vec<Selection>,
    groups: Vec<String>,
}

impl MemoryQuery {
    /// Creates a query selecting from `table`.
    pub fn new(db: Rc<Database>, table: &str) -> Self {
        MemoryQuery {
            db,
            table: table.to_string(),
            conditions: Conditions::new(),
            joins: Vec::new(),
            selections: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Renders the query as SQL with `?` placeholders.
    pub fn to_sql(&self) -> String {
        sql::render(
            &self.table,
            &self.selections,
            &self.joins,
            &self.conditions,
            &self.groups,
        )
    }

    /// Values bound to the placeholders of [`to_sql`](Self::to_sql), in order.
    pub fn bindings(&self) -> Vec<Value> {
        sql::bindings(&self.conditions)
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Executes the query and returns its result rows.
    pub fn get(&self) -> Result<Vec<Record>> {
        let rows = self.matching_rows()?;

        if !self.groups.is_empty() {
            let mut groups: Vec<(Vec<Value>, Vec<Record>)> = Vec::new();
            for row in rows {
                let key: Vec<Value> = self
                    .groups
                    .iter()
                    .map(|column| lookup(&row, &self.table, column))
                    .collect();
                match groups
                    .iter_mut()
                    .find(|(existing, _)| compare_keys(existing, &key).is_eq())
                {
                    Some((_, members)) => members.push(row),
                    None => groups.push((key, vec![row])),
                }
            }
            groups.sort_by(|(a, _), (b, _)| compare_keys(a, b));
            return groups
                .iter()
                .map(|(_, members)| self.project(members))
                .collect();
        }

        let aggregated = self
            .selections
            .iter()
            .any(|s| matches!(s, Selection::Raw { .. }));
        if aggregated {
            Ok(vec![self.project(&rows)?])
        } else if self.selections.is_empty() {
            Ok(rows)
        } else {
            rows.iter()
                .map(|row| self.project(std::slice::from_ref(row)))
                .collect()
        }
    }

    /// Returns the first result row, if any.
    pub fn first(&self) -> Result<Option<Record>> {
        Ok(self.get()?.into_iter().next())
    }

    /// Number of rows matching the joins and predicates, ignoring grouping.
    pub fn count(&self) -> Result<usize> {
        Ok(self.matching_rows()?.len())
    }

    fn matching_rows(&self) -> Result<Vec<Record>> {
        let base = self
            .db
            .table(&self.table)
            .ok_or_else(|| QueryError::UnknownTable(self.table.clone()))?;
        let mut rows = base.qualified_rows(&self.table);

        for join in &self.joins {
            rows = self.join_rows(rows, join)?;
        }

        let mut matching = Vec::with_capacity(rows.len());
        for row in rows {
            let hit = self
                .conditions
                .matches(&|column: &str| lookup(&row, &self.table, column))?;
            if hit {
                matching.push(row);
            }
        }
        Ok(matching)
    }

    fn join_rows(&self, left: Vec<Record>, join: &JoinClause) -> Result<Vec<Record>> {
        let table = self
            .db
            .table(&join.table)
            .ok_or_else(|| QueryError::UnknownTable(join.table.clone()))?;
        let right = table.qualified_rows(&join.table);

        let on = |row: &Record| {
            let first = lookup(row, &self.table, &join.first);
            let second = lookup(row, &self.table, &join.second);
            first
                .compare(&second)
                .is_some_and(|ordering| join.op.eval_ordering(ordering))
        };

        let mut joined = Vec::new();
        match join.kind {
            JoinKind::Inner | JoinKind::Left => {
                for l in &left {
                    let before = joined.len();
                    for r in &right {
                        let row = merged(l, r);
                        if on(&row) {
                            joined.push(row);
                        }
                    }
                    if join.kind == JoinKind::Left && joined.len() == before {
                        joined.push(l.clone());
                    }
                }
            }
            JoinKind::Right => {
                for r in &right {
                    let before = joined.len();
                    for l in &left {
                        let row = merged(l, r);
                        if on(&row) {
                            joined.push(row);
                        }
                    }
                    if joined.len() == before {
                        joined.push(r.clone());
                    }
                }
            }
        }
        Ok(joined)
    }

    fn project(&self, members: &[Record]) -> Result<Record> {
        if self.selections.is_empty() {
            return Ok(members.first().cloned().unwrap_or_default());
        }
        let mut row = Record::new();
        for selection in &self.selections {
            let value = match selection {
                Selection::Column { column, .. } => members
                    .first()
                    .map(|member| lookup(member, &self.table, column))
                    .unwrap_or_default(),
                Selection::Raw { expression, .. } => self.aggregate(expression, members)?,
            };
            row.insert(selection.output_name().to_string(), value);
        }
        Ok(row)
    }

    fn aggregate(&self, expression: &str, members: &[Record]) -> Result<Value> {
        let count = match parse_aggregate(expression) {
            Some(Aggregate::CountAll) => members.len(),
            Some(Aggregate::CountColumn(column)) => members
                .iter()
                .filter(|member| !lookup(member, &self.table, &column).is_null())
                .count(),
            None => return Err(QueryError::UnsupportedExpression(expression.to_string())),
        };
        Ok(Value::from(count))
    }
}

impl Where for MemoryQuery {
    fn push_condition(&mut self, boolean: Boolean, predicate: Predicate) -> &mut Self {
        self.conditions.push_condition(boolean, predicate);
        self
    }
}

impl QueryBuilder for MemoryQuery {
    fn join(&mut self, join: JoinClause) -> &mut Self {
        self.joins.push(join);
        self
    }

    fn select(&mut self, columns: Vec<Selection>) -> &mut Self {
        self.selections = columns;
        self
    }

    fn group_by(&mut self, column: &str) -> &mut Self {
        self.groups.push(column.to_string());
        self
    }

    fn pluck(&self, value: &str, key: &str) -> Result<ValueMap> {
        let mut plucked = ValueMap::new();
        for row in self.get()? {
            plucked.insert(lookup(&row, &self.table, key), lookup(&row, &self.table, value));
        }
        Ok(plucked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Op;

    fn database() -> Rc<Database> {
        let mut db = Database::new();
        db.create_table("models", ["id", "name", "related_id"])
            .insert([
                ("id", Value::from(1)),
                ("name", Value::from("first")),
                ("related_id", Value::from(10)),
            ])
            .insert([
                ("id", Value::from(2)),
                ("name", Value::from("second")),
                ("related_id", Value::from(20)),
            ])
            .insert([
                ("id", Value::from(3)),
                ("name", Value::from("third")),
                ("related_id", Value::Null),
            ]);
        db.create_table("relateds", ["id", "label"])
            .insert([("id", Value::from(10)), ("label", Value::from("ten"))])
            .insert([("id", Value::from(30)), ("label", Value::from("thirty"))]);
        Rc::new(db)
    }

    #[test]
    fn unknown_table() {
        let query = MemoryQuery::new(database(), "missing");
        assert!(matches!(query.get(), Err(QueryError::UnknownTable(t)) if t == "missing"));
    }

    #[test]
    fn bare_and_qualified_columns() {
        let mut query = MemoryQuery::new(database(), "models");
        query.where_eq("name", "first");
        assert_eq!(query.count().unwrap(), 1);

        let mut qualified = MemoryQuery::new(database(), "models");
        qualified.where_eq("models.name", "second");
        assert_eq!(qualified.count().unwrap(), 1);
    }

    #[test]
    fn inner_join_drops_unmatched() {
        let mut query = MemoryQuery::new(database(), "models");
        query.inner_join("relateds", "relateds.id", Op::Eq, "models.related_id");
        let rows = query.get().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("relateds.label"), Some(&Value::from("ten")));
    }

    #[test]
    fn left_join_keeps_unmatched() {
        let mut query = MemoryQuery::new(database(), "models");
        query
            .left_join("relateds", "relateds.id", Op::Eq, "models.related_id")
            .where_null("relateds.label");
        assert_eq!(query.count().unwrap(), 2);
    }

    #[test]
    fn right_join_keeps_unmatched_right_rows() {
        let mut query = MemoryQuery::new(database(), "models");
        query.right_join("relateds", "relateds.id", Op::Eq, "models.related_id");
        let rows = query.get().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows
            .iter()
            .any(|row| row.get("relateds.label") == Some(&Value::from("thirty"))));
    }

    #[test]
    fn count_column_skips_nulls() {
        let mut query = MemoryQuery::new(database(), "models");
        query.select(vec![
            Selection::raw("COUNT(*)").alias("all"),
            Selection::raw("count(related_id)").alias("set"),
        ]);
        let row = query.first().unwrap().unwrap();
        assert_eq!(row.get("all"), Some(&Value::from(3)));
        assert_eq!(row.get("set"), Some(&Value::from(2)));
    }

    #[test]
    fn unsupported_expression() {
        let mut query = MemoryQuery::new(database(), "models");
        query.select(vec![Selection::raw("SUM(id)")]);
        assert!(matches!(
            query.get(),
            Err(QueryError::UnsupportedExpression(e)) if e == "SUM(id)"
        ));
    }

    #[test]
    fn grouping_sorts_keys_and_keeps_null_group() {
        let mut query = MemoryQuery::new(database(), "models");
        query
            .select(vec![
                Selection::column("related_id").alias("id"),
                Selection::raw("COUNT(*)").alias("count"),
            ])
            .group_by("related_id");
        let counts = query.pluck("count", "id").unwrap();
        let keys: Vec<_> = counts.keys().cloned().collect();
        assert_eq!(keys, vec![Value::Null, Value::from(10), Value::from(20)]);
    }

    #[test]
    fn plain_pluck() {
        let query = MemoryQuery::new(database(), "models");
        let names = query.pluck("name", "id").unwrap();
        assert_eq!(names.get(2), Some(&Value::from("second")));
    }
}
