//! Property tests for filters, facet encoding and score rendering.

use proptest::prelude::*;

use facetsearch::expr::Postgres;
use facetsearch::filter::{Filter, facet_eq, facet_gt, facet_lt};
use facetsearch::types::{FacetValue, decode_facet, encode_facet};
use facetsearch::{
    ScoreBuilder, SearchConfig, SearchError, SearchField, Weight, build_search_query,
};

fn facet_key() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,15}"
}

fn facet_value() -> impl Strategy<Value = FacetValue> {
    prop_oneof![
        any::<bool>().prop_map(FacetValue::Bool),
        any::<i64>().prop_map(FacetValue::Integer),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(FacetValue::Float),
        "[ -~]{0,24}".prop_map(FacetValue::Text),
    ]
}

fn weight() -> impl Strategy<Value = Weight> {
    prop_oneof![Just(Weight::A), Just(Weight::B), Just(Weight::C), Just(Weight::D)]
}

proptest! {
    #[test]
    fn facet_encoding_preserves_key_and_kind(key in facet_key(), value in facet_value()) {
        let encoded = encode_facet(&key, &value).unwrap();
        let (decoded_key, decoded) = decode_facet(&encoded).unwrap();
        prop_assert_eq!(decoded_key, key);
        prop_assert_eq!(decoded.kind(), value.kind());
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn facet_eq_accepts_every_finite_value(key in facet_key(), value in facet_value()) {
        let filter = facet_eq(key.as_str(), value.clone()).unwrap();
        prop_assert_eq!(filter.value(), &value);
    }

    #[test]
    fn score_rendering_is_deterministic(
        term in "[ -~]{0,32}",
        columns in prop::collection::vec(("[a-z]{1,10}", weight()), 1..5),
    ) {
        let fields: Vec<SearchField> = columns
            .into_iter()
            .map(|(column, weight)| SearchField::text(column, weight))
            .collect();
        let builder = ScoreBuilder::new(fields);

        let first = builder.build(&term).unwrap().expr().render(&Postgres).unwrap();
        let second = builder.build(&term).unwrap().expr().render(&Postgres).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn thresholds_add_guard_then_comparison(key in facet_key(), threshold in -1.0e6f64..1.0e6) {
        for filter in [facet_gt(key.as_str(), threshold), facet_lt(key.as_str(), threshold)] {
            let query = build_search_query(&SearchConfig::default(), "asian", [&filter]).unwrap();
            let sql = query.to_sql(&Postgres).unwrap().sql;
            let guard = sql.find("jsonb_typeof").unwrap();
            let case = sql.find("CASE WHEN").unwrap();
            prop_assert!(guard < case);
        }
    }

    #[test]
    fn reordering_independent_filters_keeps_the_predicate_set(
        eq_key in facet_key(),
        eq_value in facet_value(),
        lt_key in facet_key(),
        lt_threshold in -100.0f64..100.0,
    ) {
        let a = facet_eq(eq_key.as_str(), eq_value).unwrap();
        let b = facet_lt(lt_key.as_str(), lt_threshold);
        let config = SearchConfig::default();

        let ab = build_search_query(&config, "term", [&a as &dyn Filter, &b]).unwrap();
        let ba = build_search_query(&config, "term", [&b as &dyn Filter, &a]).unwrap();

        let mut left = ab.predicates().iter().map(|p| format!("{:?}", p)).collect::<Vec<_>>();
        let mut right = ba.predicates().iter().map(|p| format!("{:?}", p)).collect::<Vec<_>>();
        left.sort();
        right.sort();
        prop_assert_eq!(left, right);
    }
}

#[test]
fn test_non_finite_facet_values_fail_at_construction() {
    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = facet_eq("rating", value).unwrap_err();
        assert!(matches!(err, SearchError::Serialization { ref key, .. } if key == "rating"));
    }
}

#[test]
fn test_non_finite_threshold_fails_at_application() {
    let err = build_search_query(
        &SearchConfig::default(),
        "asian",
        [facet_gt("rating", f64::INFINITY)],
    )
    .unwrap_err();
    assert!(matches!(err, SearchError::FilterApplication { .. }));
}
