//! Shared fixtures: seeded databases and the filter definitions under test.

#![allow(dead_code)]

use std::rc::Rc;

use serde_json::{json, Value as Json};
use sifter::{
    CountStrategies, CountableDefinition, FilterContext, FilterDataSchema, FilterDefinition,
    FilterError, IsEmpty, JoinParameters, ParameterFilter, Result, Rule, RuleSet, SimpleBelongsTo,
    SimpleDistinctValue, SimpleInteger, SimpleString, SimpleTranslatedString, Strategies,
    StrategyRegistry,
};
use sifter_query::{Database, MemoryQuery, Record, Value, Where};

pub const TABLE: &str = "test_simple_models";

// ============================================================================
// Databases
// ============================================================================

fn model(
    id: i64,
    unique: &str,
    second: Option<&str>,
    name: &str,
    related: i64,
    position: i64,
    active: bool,
) -> [(&'static str, Value); 7] {
    [
        ("id", Value::from(id)),
        ("unique_field", Value::from(unique)),
        ("second_field", Value::from(second)),
        ("name", Value::from(name)),
        ("test_related_model_id", Value::from(related)),
        ("position", Value::from(position)),
        ("active", Value::from(active)),
    ]
}

fn seed_relations(db: &mut Database) {
    db.create_table(
        "test_related_models",
        ["id", "name", "some_property", "test_simple_model_id", "active"],
    )
        .insert([
            ("id", Value::from(1)),
            ("name", Value::from("related A")),
            ("some_property", Value::from("super")),
            ("test_simple_model_id", Value::from(3)),
            ("active", Value::from(true)),
        ])
        .insert([
            ("id", Value::from(2)),
            ("name", Value::from("related B")),
            ("some_property", Value::from("generic")),
            ("test_simple_model_id", Value::from(3)),
            ("active", Value::from(true)),
        ])
        .insert([
            ("id", Value::from(3)),
            ("name", Value::from("related C")),
            ("some_property", Value::from("mild")),
            ("test_simple_model_id", Value::from(2)),
            ("active", Value::from(true)),
        ]);
    db.create_table("test_simple_model_translations", ["test_simple_model_id", "locale", "name"])
        .insert([
            ("test_simple_model_id", Value::from(1)),
            ("locale", Value::from("en")),
            ("name", Value::from("simple name")),
        ])
        .insert([
            ("test_simple_model_id", Value::from(3)),
            ("locale", Value::from("en")),
            ("name", Value::from("special name")),
        ])
        .insert([
            ("test_simple_model_id", Value::from(3)),
            ("locale", Value::from("nl")),
            ("name", Value::from("speciale naam")),
        ]);
}

/// Three models, the second one inactive.
pub fn filter_database() -> Rc<Database> {
    let mut db = Database::new();
    db.create_table(TABLE, Vec::<String>::new())
        .insert(model(1, "11", None, "simple name", 1, 0, true))
        .insert(model(2, "123", Some("random string"), "random name", 2, 1, false))
        .insert(model(3, "1337", Some("some more"), "special name", 3, 14, true));
    seed_relations(&mut db);
    Rc::new(db)
}

/// Four active models with repeating positions and related ids.
pub fn countable_database() -> Rc<Database> {
    let mut db = Database::new();
    db.create_table(TABLE, Vec::<String>::new())
        .insert(model(1, "11", None, "simple name", 1, 0, true))
        .insert(model(2, "123", Some("random string"), "random name", 2, 1, true))
        .insert(model(3, "1337", Some("some more"), "special name", 3, 14, true))
        .insert(model(4, "1980", Some("yet more fun"), "another name", 1, 14, true));
    seed_relations(&mut db);
    Rc::new(db)
}

pub fn unique_fields(rows: &[Record]) -> Vec<String> {
    rows.iter()
        .map(|row| row[&format!("{TABLE}.unique_field")].to_string())
        .collect()
}

// ============================================================================
// Filters
// ============================================================================

/// Only lets the model with unique field `1337` through.
pub struct SpecialOnly;

impl ParameterFilter<MemoryQuery> for SpecialOnly {
    fn apply(
        &self,
        _name: &str,
        _value: &Json,
        query: &mut MemoryQuery,
        _ctx: &mut FilterContext<'_>,
    ) -> Result<()> {
        query.where_eq("unique_field", "1337");
        Ok(())
    }
}

/// Filter exercising every kind of strategy declaration.
pub struct TestFilter {
    pub db: Rc<Database>,
}

impl TestFilter {
    pub fn new(db: Rc<Database>) -> Self {
        TestFilter { db }
    }

    pub fn query(&self) -> MemoryQuery {
        MemoryQuery::new(self.db.clone(), TABLE)
    }
}

pub fn test_filter_schema() -> FilterDataSchema {
    let mut schema = FilterDataSchema::new("test_filter_data");
    for name in [
        "name",
        "relateds",
        "position",
        "with_inactive",
        "no_strategy_set_no_fallback",
        "parameter_filter_instance",
        "parameter_filter_string",
        "closure_strategy",
        "global_setting",
        "invalid_strategy_string",
        "invalid_strategy_interface",
        "adding_joins",
        "no_duplicate_joins",
        "translated_name",
        "empty_second",
    ] {
        let default = match name {
            "relateds" => json!([]),
            "with_inactive" => json!(false),
            _ => Json::Null,
        };
        schema = schema.with_default(name, default);
    }
    schema
        .with_rule("name", Rule::String)
        .with_rule("relateds", Rule::Array)
        .with_rule("position", Rule::Integer)
        .with_rule("with_inactive", Rule::Boolean)
        .with_rule("closure_strategy", RuleSet::new().with(Rule::Array).with(Rule::Size(2.0)))
        .with_rule("global_setting", Rule::String)
}

impl FilterDefinition<MemoryQuery> for TestFilter {
    fn schema(&self) -> FilterDataSchema {
        test_filter_schema()
    }

    fn strategies(&self) -> Strategies<MemoryQuery> {
        Strategies::<MemoryQuery>::new()
            .filter("name", SimpleString::new())
            .filter("relateds", SimpleInteger::new().column("test_related_model_id"))
            .filter(
                "parameter_filter_instance",
                SimpleString::new().table(TABLE).column("name").exact(true),
            )
            .named("parameter_filter_string", "SpecialOnly")
            .callback("closure_strategy", |name, value, query: &mut MemoryQuery, _ctx| {
                let pair = value
                    .as_array()
                    .filter(|items| items.len() == 2)
                    .ok_or_else(|| FilterError::invalid_value(name, "a name and a related id"))?;
                query
                    .where_eq("name", &pair[0])
                    .where_eq("test_related_model_id", &pair[1]);
                Ok(())
            })
            .setting("global_setting")
            .named(
                "invalid_strategy_string",
                "uninstantiable_string_that_is_not_a_parameter_filter",
            )
            .named("invalid_strategy_interface", "SimpleBelongsTo")
            .filter(
                "translated_name",
                SimpleTranslatedString::new(TABLE).column("name"),
            )
            .filter("empty_second", IsEmpty::new().column("second_field"))
    }

    fn register_strategies(&self, registry: &mut StrategyRegistry<MemoryQuery>) {
        registry.register_filter("SpecialOnly", || SpecialOnly);
    }

    fn apply_parameter(
        &self,
        name: &str,
        value: &Json,
        query: &mut MemoryQuery,
        ctx: &mut FilterContext<'_>,
    ) -> Result<()> {
        match name {
            "with_inactive" => {
                if value != &json!(true) {
                    query.where_eq("active", true);
                }
                Ok(())
            }
            "adding_joins" | "no_duplicate_joins" => {
                ctx.add_join(
                    "UNIQUE_JOIN_KEY",
                    JoinParameters::on(
                        "test_related_models",
                        "test_related_models.id",
                        "test_simple_models.test_related_model_id",
                    ),
                    None,
                );
                query.where_eq(name, value);
                Ok(())
            }
            _ => Err(FilterError::unhandled_parameter(name)),
        }
    }
}

// ============================================================================
// Countable filters
// ============================================================================

/// Counts positions and related ids.
pub struct TestCountableFilter {
    pub db: Rc<Database>,
    pub include_self: Vec<String>,
}

impl TestCountableFilter {
    pub fn new(db: Rc<Database>) -> Self {
        TestCountableFilter {
            db,
            include_self: Vec::new(),
        }
    }

    pub fn including_self(mut self, name: &str) -> Self {
        self.include_self.push(name.to_string());
        self
    }
}

impl FilterDefinition<MemoryQuery> for TestCountableFilter {
    fn schema(&self) -> FilterDataSchema {
        FilterDataSchema::new("test_countable_filter_data")
            .with_default("name", Json::Null)
            .with_default("relateds", json!([]))
            .with_default("position", Json::Null)
            .with_default("with_inactive", false)
            .with_rule("name", Rule::String)
            .with_rule("relateds", Rule::Array)
            .with_rule("position", Rule::Integer)
            .with_rule("with_inactive", Rule::Boolean)
    }

    fn strategies(&self) -> Strategies<MemoryQuery> {
        Strategies::new()
            .filter("name", SimpleString::new())
            .filter("position", SimpleInteger::new())
            .filter("relateds", SimpleInteger::new().column("test_related_model_id"))
    }

    fn apply_parameter(
        &self,
        name: &str,
        value: &Json,
        query: &mut MemoryQuery,
        _ctx: &mut FilterContext<'_>,
    ) -> Result<()> {
        if name == "with_inactive" {
            if value != &json!(true) {
                query.where_eq("active", true);
            }
            return Ok(());
        }
        Err(FilterError::unhandled_parameter(name))
    }
}

impl CountableDefinition<MemoryQuery> for TestCountableFilter {
    fn countables(&self) -> Vec<String> {
        vec!["position".to_string(), "relateds".to_string()]
    }

    fn count_strategies(&self) -> CountStrategies<MemoryQuery> {
        CountStrategies::new()
            .counter("position", SimpleDistinctValue::new())
            .counter("relateds", SimpleBelongsTo::new().column("test_related_model_id"))
    }

    fn include_self_in_count(&self) -> Vec<String> {
        self.include_self.clone()
    }

    fn countable_base_query(&self, _countable: Option<&str>) -> MemoryQuery {
        MemoryQuery::new(self.db.clone(), TABLE)
    }
}
