//! Sifter - declarative, strategy-driven query filters with facet counting.
//!
//! A filter is declared once, as a [`FilterDefinition`]: the attributes it
//! understands (a [`FilterDataSchema`] with defaults and validation rules) and,
//! per attribute, a [`Strategy`] saying how a set value narrows a query.
//! Binding a definition to the attributes of one request gives a [`Filter`],
//! which applies every set, non-ignored attribute to any
//! [`QueryBuilder`](sifter_query::QueryBuilder).
//!
//! A [`CountableFilter`] additionally reports, for each countable attribute,
//! how many rows each of its values would match given all *other* active
//! filters: the counts behind faceted search.
//!
//! # Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use serde_json::json;
//! use sifter::{
//!     CountStrategies, CountableDefinition, CountableFilter, FilterDataSchema,
//!     FilterDefinition, SimpleDistinctValue, SimpleString, Strategies,
//! };
//! use sifter_query::{Database, MemoryQuery, Value};
//!
//! struct Products {
//!     db: Rc<Database>,
//! }
//!
//! impl FilterDefinition<MemoryQuery> for Products {
//!     fn schema(&self) -> FilterDataSchema {
//!         FilterDataSchema::new("products")
//!             .with_default("name", json!(null))
//!             .with_default("color", json!(null))
//!     }
//!
//!     fn strategies(&self) -> Strategies<MemoryQuery> {
//!         Strategies::new()
//!             .filter("name", SimpleString::new())
//!             .filter("color", SimpleString::new().exact(true))
//!     }
//! }
//!
//! impl CountableDefinition<MemoryQuery> for Products {
//!     fn countables(&self) -> Vec<String> {
//!         vec!["color".into()]
//!     }
//!
//!     fn count_strategies(&self) -> CountStrategies<MemoryQuery> {
//!         CountStrategies::new().counter("color", SimpleDistinctValue::new())
//!     }
//!
//!     fn countable_base_query(&self, _countable: Option<&str>) -> MemoryQuery {
//!         MemoryQuery::new(self.db.clone(), "products")
//!     }
//! }
//!
//! let mut db = Database::new();
//! db.create_table("products", ["name", "color"])
//!     .insert([("name", Value::from("red shirt")), ("color", Value::from("red"))])
//!     .insert([("name", Value::from("blue shirt")), ("color", Value::from("blue"))])
//!     .insert([("name", Value::from("red hat")), ("color", Value::from("red"))]);
//! let db = Rc::new(db);
//!
//! let mut filter = CountableFilter::from_value(
//!     Products { db: db.clone() },
//!     json!({ "name": "shirt", "color": "red" }),
//! )
//! .unwrap();
//!
//! let mut query = MemoryQuery::new(db, "products");
//! filter.apply(&mut query).unwrap();
//! assert_eq!(query.count().unwrap(), 1);
//!
//! // The color filter itself is left out while colors are counted.
//! let counts = filter.get_counts(&[]).unwrap();
//! let colors = counts.get("color").unwrap();
//! assert_eq!(colors.get("red"), Some(&Value::from(1)));
//! assert_eq!(colors.get("blue"), Some(&Value::from(1)));
//! ```
//!
//! # Strategies
//!
//! | Strategy | Effect |
//! |----------|--------|
//! | [`SimpleString`] | `column like %value%`, or `=` when exact |
//! | [`SimpleInteger`] | comparison, or `in (...)` for lists |
//! | [`IsEmpty`] | `(column is null or column = '')` |
//! | [`SimpleTranslatedString`] | string match on a joined translation table |
//! | [`SimpleBelongsTo`] | counts per foreign key |
//! | [`SimpleDistinctValue`] | counts per distinct value |
//!
//! Strategies can also be declared by name and resolved through a
//! [`StrategyRegistry`], which makes filters configurable from YAML or JSON.

mod countable;
mod counters;
mod data;
mod error;
mod filter;
mod filters;
mod inflect;
mod joins;
mod strategy;
mod validation;

pub use countable::{CountableDefinition, CountableFilter, CountableResults};
pub use counters::{SimpleBelongsTo, SimpleDistinctValue};
pub use data::{Attributes, FilterData, FilterDataSchema, Sanitizer};
pub use error::{BoxError, FilterError, ParameterKind, Result};
pub use filter::{is_unset, Filter, FilterContext, FilterDefinition};
pub use filters::{
    IsEmpty, SimpleInteger, SimpleString, SimpleTranslatedString, DEFAULT_LOCALE, LOCALE_SETTING,
};
pub use joins::{JoinKey, JoinParameters, JoinRegistry};
pub use strategy::{
    CountStrategies, CountStrategy, CounterFn, FilterFn, ParameterCounter, ParameterFilter,
    Strategies, Strategy, StrategyMap, StrategyRegistry, SETTING,
};
pub use validation::{Messages, Rule, RuleSet, RuleValidator, Rules, Validatable, Validator};
