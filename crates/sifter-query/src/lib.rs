//! sifter-query - the query-builder surface sifter filters write to.
//!
//! Filter strategies never talk to a database directly. They attach
//! predicates, joins, selections and groupings to anything implementing
//! [`QueryBuilder`], and counters read results back through
//! [`QueryBuilder::pluck`]. This crate defines that contract and ships
//! [`MemoryQuery`], an in-memory implementation with SQL-like semantics used
//! to exercise filters end to end.
//!
//! # Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use sifter_query::{Database, MemoryQuery, Value, Where};
//!
//! let mut db = Database::new();
//! db.create_table("models", ["name", "active"])
//!     .insert([("name", Value::from("simple name")), ("active", Value::from(true))])
//!     .insert([("name", Value::from("special name")), ("active", Value::from(true))])
//!     .insert([("name", Value::from("random name")), ("active", Value::from(false))]);
//!
//! let mut query = MemoryQuery::new(Rc::new(db), "models");
//! query.where_eq("active", true).where_like("name", "%special%");
//!
//! assert_eq!(query.count().unwrap(), 1);
//! assert_eq!(
//!     query.to_sql(),
//!     r#"select * from "models" where "active" = ? and "name" like ?"#
//! );
//! ```
//!
//! # Semantics
//!
//! | Construct | Behavior |
//! |-----------|----------|
//! | `and` / `or` | `and` binds tighter than `or`; groups parenthesize |
//! | `NULL` | compares as unknown, so `=`/`!=`/`like` never match it |
//! | `like` | case-insensitive, `%` any run, `_` one character |
//! | joins | inner, left and right, applied in attachment order |
//! | selections | columns and `COUNT(*)` / `COUNT(column)` aggregates |

mod builder;
mod condition;
mod error;
mod join;
mod memory;
mod op;
mod select;
pub mod sql;
mod value;
mod value_map;

pub use builder::QueryBuilder;
pub use condition::{like_matches, Boolean, Conditions, Predicate, Where};
pub use error::{QueryError, Result};
pub use join::{JoinClause, JoinKind};
pub use memory::{Database, MemoryQuery, Record, Table};
pub use op::Op;
pub use select::Selection;
pub use value::{Number, Value};
pub use value_map::ValueMap;
