//! Property-based tests for filter application and counting.

mod common;

use common::{countable_database, TestCountableFilter, TABLE};
use proptest::prelude::*;
use serde_json::json;
use sifter::{is_unset, CountableFilter};
use sifter_query::{MemoryQuery, Value};

// ============================================================================
// Test helpers
// ============================================================================

fn name_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["", "name", "special", "simple", "random", "another", "nothing"])
}

fn relateds_strategy() -> impl Strategy<Value = Vec<i64>> {
    prop::sample::subsequence(vec![1i64, 2, 3], 0..=3)
}

fn position_strategy() -> impl Strategy<Value = Option<i64>> {
    prop::option::of(prop::sample::select(vec![1i64, 14, 20]))
}

fn attributes(name: &str, relateds: &[i64], position: Option<i64>) -> serde_json::Value {
    let mut attributes = json!({ "name": name, "relateds": relateds });
    if let Some(position) = position {
        attributes["position"] = json!(position);
    }
    attributes
}

fn count(attributes: serde_json::Value, ignored: &[&str]) -> usize {
    let mut filter =
        CountableFilter::from_value(TestCountableFilter::new(countable_database()), attributes)
            .unwrap();
    filter.ignore_parameters(ignored.iter().copied());
    let mut query = MemoryQuery::new(filter.definition().db.clone(), TABLE);
    filter.apply(&mut query).unwrap();
    query.count().unwrap()
}

fn total(counts: &sifter_query::ValueMap) -> i64 {
    counts
        .iter()
        .map(|(_, count)| count.as_number().map_or(0, |n| n.to_f64() as i64))
        .sum()
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Ignoring a parameter is the same as not supplying it.
    #[test]
    fn ignoring_equals_omitting(
        name in name_strategy(),
        relateds in relateds_strategy(),
        position in position_strategy(),
    ) {
        let ignored = count(attributes(name, &relateds, position), &["relateds"]);
        let omitted = count(attributes(name, &[], position), &[]);
        prop_assert_eq!(ignored, omitted);
    }

    /// Each countable's counts add up to the rows matching every other filter.
    #[test]
    fn counts_sum_to_rows_matching_other_filters(
        name in name_strategy(),
        relateds in relateds_strategy(),
        position in position_strategy(),
    ) {
        let mut filter = CountableFilter::from_value(
            TestCountableFilter::new(countable_database()),
            attributes(name, &relateds, position),
        )
        .unwrap();
        let counts = filter.get_counts(&[]).unwrap();

        let positions = counts.get("position").unwrap();
        prop_assert_eq!(
            total(positions) as usize,
            count(attributes(name, &relateds, None), &[])
        );
        let related = counts.get("relateds").unwrap();
        prop_assert_eq!(
            total(related) as usize,
            count(attributes(name, &[], position), &[])
        );
    }

    /// Counting leaves the caller's ignore list exactly as it was.
    #[test]
    fn counting_preserves_ignored_parameters(
        ignored in prop::sample::subsequence(
            vec!["name", "position", "relateds", "position"],
            0..=4,
        ),
        position in position_strategy(),
    ) {
        let mut filter = CountableFilter::from_value(
            TestCountableFilter::new(countable_database()),
            attributes("name", &[], position),
        )
        .unwrap();
        filter.ignore_parameters(ignored.iter().copied());
        let before: Vec<bool> = ["name", "position", "relateds"]
            .iter()
            .map(|name| filter.is_parameter_ignored(name))
            .collect();

        filter.get_counts(&[]).unwrap();

        let after: Vec<bool> = ["name", "position", "relateds"]
            .iter()
            .map(|name| filter.is_parameter_ignored(name))
            .collect();
        prop_assert_eq!(before, after);
    }

    /// Non-empty strings are always values, whatever they spell.
    #[test]
    fn non_empty_strings_are_set(text in ".+") {
        prop_assert!(!is_unset(&json!(text)));
    }

    /// A list is unset exactly when it is empty.
    #[test]
    fn lists_are_unset_only_when_empty(items in prop::collection::vec(any::<i32>(), 0..4)) {
        prop_assert_eq!(is_unset(&json!(items)), items.is_empty());
    }
}

#[test]
fn counts_are_plain_numbers() {
    let mut filter = CountableFilter::from_value(
        TestCountableFilter::new(countable_database()),
        json!({}),
    )
    .unwrap();
    let counts = filter.get_counts(&["relateds"]).unwrap();
    assert_eq!(counts.get("relateds").unwrap().get(1), Some(&Value::from(2)));
    assert_eq!(total(counts.get("relateds").unwrap()), 4);
}
