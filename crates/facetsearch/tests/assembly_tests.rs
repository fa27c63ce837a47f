//! Tests for search assembly and the executor seam.
//!
//! These tests use an in-process executor that records the statements it is
//! given and returns canned rows, so no database is required.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use facetsearch::expr::{Dialect, Postgres, SqlParam, Sqlite};
use facetsearch::filter::{
    Filter, apply_filters, facet_eq, facet_gt, facet_lt, filter_fn, within_radius,
};
use facetsearch::record::ColumnValue;
use facetsearch::types::GeoPoint;
use facetsearch::{
    Business, Expr, QueryExecutor, RenderError, RenderedSql, Row, SearchConfig, SearchError,
    SearchResult, SelectQuery, build_search_query, search,
};

struct StubExecutor {
    dialect: Box<dyn Dialect>,
    rows: SearchResult<Vec<Row>>,
    seen: Mutex<Vec<RenderedSql>>,
}

impl StubExecutor {
    fn returning(rows: Vec<Row>) -> Self {
        Self {
            dialect: Box::new(Postgres),
            rows: Ok(rows),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            dialect: Box::new(Postgres),
            rows: Err(SearchError::executor(message)),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<RenderedSql> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for StubExecutor {
    fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    async fn fetch(&self, query: &RenderedSql) -> SearchResult<Vec<Row>> {
        self.seen.lock().unwrap().push(query.clone());
        self.rows.clone()
    }
}

fn business_row(id: i64, name: &str, score: f64) -> Row {
    Row::new()
        .with("id", ColumnValue::Integer(id))
        .with("name", ColumnValue::Text(name.to_string()))
        .with("description", ColumnValue::Null)
        .with("street_address", ColumnValue::TextArray(vec![]))
        .with("city", ColumnValue::Text("Sandy".to_string()))
        .with("state", ColumnValue::Text("UT".to_string()))
        .with("postcode", ColumnValue::Text("84070".to_string()))
        .with("latitude", ColumnValue::Float(40.6))
        .with("longitude", ColumnValue::Float(-111.8))
        .with("facets", ColumnValue::Json(json!({})))
        .with("score", ColumnValue::Float(score))
}

const NO_FILTERS: [&dyn Filter; 0] = [];

// ============================================================================
// Assembly
// ============================================================================

#[test]
fn test_zero_filters_equals_base_query() {
    let config = SearchConfig::default();
    let without = build_search_query(&config, "asian", NO_FILTERS).unwrap();
    let empty: Vec<Box<dyn Filter>> = Vec::new();
    let with_empty = build_search_query(&config, "asian", &empty).unwrap();
    assert_eq!(without, with_empty);
}

#[test]
fn test_rendering_is_deterministic() {
    let build = || {
        let filters: Vec<Box<dyn Filter>> = vec![
            Box::new(facet_eq("kid_friendly", true).unwrap()),
            Box::new(facet_lt("price_range", 2.0)),
        ];
        build_search_query(&SearchConfig::default(), "asian", &filters)
            .unwrap()
            .to_sql(&Postgres)
            .unwrap()
    };
    assert_eq!(build(), build());
}

#[test]
fn test_within_radius_point_order_in_full_query() {
    let query = build_search_query(
        &SearchConfig::default(),
        "asian",
        [within_radius(3.0, GeoPoint::new(40.606536, -111.854952))],
    )
    .unwrap();
    let rendered = query.to_sql(&Postgres).unwrap();

    let (_, tail) = rendered
        .sql
        .split_once(r#"(point("longitude", "latitude") <@> point("#)
        .expect("distance predicate present");
    assert!(tail.starts_with("$16::float8, $17::float8)) < $18::float8"));
    assert_eq!(rendered.params[15], SqlParam::Float(-111.854952));
    assert_eq!(rendered.params[16], SqlParam::Float(40.606536));
    assert_eq!(rendered.params[17], SqlParam::Float(3.0));
}

#[test]
fn test_filter_order_is_preserved_in_where_clause() {
    let filters: Vec<Box<dyn Filter>> = vec![
        Box::new(facet_gt("rating", 4.0)),
        Box::new(facet_eq("kid_friendly", true).unwrap()),
    ];
    let sql = build_search_query(&SearchConfig::default(), "asian", &filters)
        .unwrap()
        .to_sql(&Postgres)
        .unwrap()
        .sql;

    let guard = sql.find("jsonb_typeof").unwrap();
    let case = sql.find("CASE WHEN").unwrap();
    let contains = sql.find("@>").unwrap();
    assert!(guard < case);
    assert!(case < contains);
}

#[test]
fn test_independent_filters_commute_as_predicate_sets() {
    let a = facet_eq("kid_friendly", true).unwrap();
    let b = facet_lt("price_range", 2.0);

    let ab = build_search_query(&SearchConfig::default(), "asian", [&a as &dyn Filter, &b])
        .unwrap();
    let ba = build_search_query(&SearchConfig::default(), "asian", [&b as &dyn Filter, &a])
        .unwrap();

    assert_ne!(ab.predicates(), ba.predicates());
    for predicate in ab.predicates() {
        assert!(ba.predicates().contains(predicate));
    }
    assert_eq!(ab.predicates().len(), ba.predicates().len());
}

#[test]
fn test_first_filter_error_is_returned_unchanged() {
    let filters: Vec<Box<dyn Filter>> = vec![
        Box::new(facet_lt("price_range", 2.0)),
        Box::new(within_radius(-1.0, GeoPoint::new(40.6, -111.8))),
        Box::new(facet_gt("rating", f64::NAN)),
    ];
    let err = build_search_query(&SearchConfig::default(), "asian", &filters).unwrap_err();
    assert_eq!(
        err.failed_filter(),
        Some("within_radius(-1 mi of (40.6, -111.8))")
    );
}

#[test]
fn test_custom_filter_composes_with_builtin_ones() {
    let open_now = filter_fn("open_now", |q: SelectQuery| {
        Ok(q.and_where(Expr::ident("is_open").eq(true)))
    });
    let query = build_search_query(
        &SearchConfig::default(),
        "asian",
        [&open_now as &dyn Filter, &facet_lt("price_range", 3.0)],
    )
    .unwrap();
    assert_eq!(query.predicates().len(), 4);
}

#[test]
fn test_custom_or_filter_stays_inside_its_own_clause() {
    let open_or_new = filter_fn("open_or_new", |q: SelectQuery| {
        Ok(q.and_where(Expr::raw(
            "? OR ?",
            vec![Expr::ident("is_open").eq(true), Expr::ident("is_new").eq(true)],
        )))
    });
    let cheap = facet_lt("price_range", 2.0);

    let filters = [&open_or_new as &dyn Filter, &cheap];
    let query = apply_filters(SelectQuery::from("b"), filters).unwrap();
    let rendered = query.to_sql(&Postgres).unwrap();

    assert_eq!(
        rendered.sql,
        concat!(
            r#"SELECT * FROM "b""#,
            r#" WHERE (("is_open" = $1::bool) OR ("is_new" = $2::bool))"#,
            r#" AND jsonb_typeof("facets" -> $3::text) = $4::text"#,
            r#" AND (CASE WHEN (jsonb_typeof("facets" -> $5::text) = $6::text)"#,
            r#" THEN CAST("facets" -> $7::text AS DOUBLE PRECISION) END) < $8::float8"#,
        )
    );
    assert_eq!(rendered.params[7], SqlParam::Float(2.0));
}

#[test]
fn test_sqlite_rejects_facet_filters_at_render_time() {
    let query = build_search_query(
        &SearchConfig::default(),
        "asian",
        [facet_eq("kid_friendly", true).unwrap()],
    )
    .unwrap();
    // The score uses PostgreSQL-only casts, which fail first.
    assert!(matches!(
        query.to_sql(&Sqlite),
        Err(RenderError::UnsupportedCast { .. })
    ));
}

// ============================================================================
// Execution
// ============================================================================

#[tokio::test]
async fn test_search_decodes_scored_records() {
    let executor = StubExecutor::returning(vec![
        business_row(1, "Asian Bistro", 0.5),
        business_row(2, "Asian Garden", 0.25),
    ]);

    let results = search::<Business, _, _>(
        &executor,
        &SearchConfig::default(),
        "asian",
        [facet_lt("price_range", 2.0)],
    )
    .await
    .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].record.name, "Asian Bistro");
    assert_eq!(results[0].score, 0.5);

    let seen = executor.seen();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].sql.contains(r#"AS "score""#));
    assert!(seen[0].sql.contains(r#""facets" -> $"#));
}

#[tokio::test]
async fn test_search_fails_on_missing_column() {
    let row = Row::new()
        .with("id", ColumnValue::Integer(1))
        .with("score", ColumnValue::Float(0.5));
    let executor = StubExecutor::returning(vec![row]);

    let err = search::<Business, _, _>(&executor, &SearchConfig::default(), "asian", NO_FILTERS)
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Decode(_)));
}

#[tokio::test]
async fn test_filter_error_skips_execution() {
    let executor = StubExecutor::returning(vec![]);
    let err = search::<Business, _, _>(
        &executor,
        &SearchConfig::default(),
        "asian",
        [within_radius(3.0, GeoPoint::new(95.0, 0.0))],
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SearchError::FilterApplication { .. }));
    assert!(executor.seen().is_empty());
}

#[tokio::test]
async fn test_executor_error_propagates() {
    let executor = StubExecutor::failing("connection reset");
    let err = search::<Business, _, _>(&executor, &SearchConfig::default(), "asian", NO_FILTERS)
        .await
        .unwrap_err();
    assert_eq!(err, SearchError::executor("connection reset"));
}
