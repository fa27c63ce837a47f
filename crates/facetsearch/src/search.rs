//! Search query assembly.
//!
//! [`build_search_query`] puts the pieces together:
//!
//! 1. select the configured columns plus the score expression, aliased `score`;
//! 2. order by `score DESC`;
//! 3. when enabled, require `score > 0` so non-matching rows are dropped
//!    whatever filters follow;
//! 4. fold the caller's filters over the query, in order.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SearchError, SearchResult};
use crate::filter::{Filter, apply_filters};
use crate::query::SelectQuery;
use crate::record::{Business, Record};
use crate::score::{RankFunction, ScoreBuilder, SearchField, Weight};

/// Configuration for assembling search queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Relation to search.
    #[serde(default = "default_table")]
    pub table: String,

    /// Columns returned alongside the score.
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,

    /// Weighted columns that make up the searchable document.
    #[serde(default = "default_fields")]
    pub fields: Vec<SearchField>,

    /// Text search configuration name, or the server default when unset.
    #[serde(default)]
    pub text_search_config: Option<String>,

    /// Ranking function.
    #[serde(default)]
    pub rank_function: RankFunction,

    /// Drop rows whose score is not positive.
    #[serde(default = "default_require_positive_score")]
    pub require_positive_score: bool,

    /// Maximum number of rows returned.
    #[serde(default)]
    pub limit: Option<u64>,
}

fn default_table() -> String {
    "businesses".to_string()
}

fn default_columns() -> Vec<String> {
    Business::COLUMNS.iter().map(|c| c.to_string()).collect()
}

fn default_fields() -> Vec<SearchField> {
    vec![
        SearchField::text("name", Weight::A),
        SearchField::text("description", Weight::B),
        SearchField::document("facets", Weight::C),
    ]
}

fn default_require_positive_score() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            columns: default_columns(),
            fields: default_fields(),
            text_search_config: None,
            rank_function: RankFunction::default(),
            require_positive_score: default_require_positive_score(),
            limit: None,
        }
    }
}

impl SearchConfig {
    /// Parses a configuration from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> SearchResult<Self> {
        serde_json::from_str(json).map_err(|e| SearchError::InvalidConfig {
            message: e.to_string(),
        })
    }

    /// Projects the columns of record type `R` instead of the configured ones.
    pub fn for_record<R: Record>(&self) -> Self {
        Self {
            columns: R::COLUMNS.iter().map(|c| c.to_string()).collect(),
            ..self.clone()
        }
    }

    /// Score builder for the configured fields and options.
    pub fn score_builder(&self) -> ScoreBuilder {
        let builder =
            ScoreBuilder::new(self.fields.clone()).rank_function(self.rank_function);
        match &self.text_search_config {
            Some(config) => builder.text_search_config(config.clone()),
            None => builder,
        }
    }
}

/// Builds the search query for `term` and applies `filters` in order.
///
/// Returns the first error a filter produces, unchanged.
pub fn build_search_query<I>(
    config: &SearchConfig,
    term: &str,
    filters: I,
) -> SearchResult<SelectQuery>
where
    I: IntoIterator,
    I::Item: Filter,
{
    let score = config.score_builder().build(term)?;

    let mut query = SelectQuery::from(config.table.as_str())
        .columns(&config.columns)
        .select([score.clone()])
        .order_by(score.reference().desc());

    if config.require_positive_score {
        query = query.and_where(score.expr().clone().gt(0.0));
    }
    if let Some(limit) = config.limit {
        query = query.limit(limit);
    }

    let query = apply_filters(query, filters)?;

    debug!(
        table = %config.table,
        term,
        predicates = query.predicates().len(),
        "assembled search query"
    );

    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Expr, Postgres};
    use crate::filter::facet_lt;

    const NO_FILTERS: [&dyn Filter; 0] = [];

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.table, "businesses");
        assert_eq!(config.columns.len(), 10);
        assert_eq!(config.fields.len(), 3);
        assert!(config.require_positive_score);
        assert!(config.limit.is_none());
    }

    #[test]
    fn test_partial_json_config_takes_defaults() {
        let config = SearchConfig::from_json(
            r#"{"table": "venues", "limit": 25, "rank_function": "frequency"}"#,
        )
        .unwrap();
        assert_eq!(config.table, "venues");
        assert_eq!(config.limit, Some(25));
        assert_eq!(config.rank_function, RankFunction::Frequency);
        assert_eq!(config.fields, default_fields());
    }

    #[test]
    fn test_bad_json_config() {
        let err = SearchConfig::from_json("{").unwrap_err();
        assert!(matches!(err, SearchError::InvalidConfig { .. }));
    }

    #[test]
    fn test_score_is_selected_ordered_and_filtered() {
        let config = SearchConfig {
            columns: vec!["name".to_string()],
            ..SearchConfig::default()
        };
        let query = build_search_query(&config, "asian", NO_FILTERS).unwrap();
        let score = query.named("score").unwrap();

        assert_eq!(query.ordering()[0].expr, Expr::ident("score"));
        assert_eq!(query.predicates(), &[score.expr().clone().gt(0.0)]);
    }

    #[test]
    fn test_score_text_identical_in_select_and_where() {
        let config = SearchConfig {
            columns: vec!["name".to_string()],
            ..SearchConfig::default()
        };
        let query = build_search_query(&config, "asian", NO_FILTERS).unwrap();
        let sql = query.to_sql(&Postgres).unwrap().sql;

        let select = sql
            .strip_prefix(r#"SELECT "name", "#)
            .and_then(|s| s.split_once(r#" AS "score""#))
            .map(|(expr, _)| expr)
            .unwrap();
        let filter = sql
            .split_once(" WHERE ")
            .and_then(|(_, s)| s.split_once(" > "))
            .map(|(expr, _)| expr)
            .unwrap();

        let strip = |s: &str| {
            s.chars()
                .filter(|c| !c.is_ascii_digit())
                .collect::<String>()
        };
        assert_eq!(strip(select), strip(filter));
    }

    #[test]
    fn test_min_score_precedes_user_filters() {
        let query = build_search_query(
            &SearchConfig::default(),
            "asian",
            [facet_lt("price_range", 2.0)],
        )
        .unwrap();
        let score = query.named("score").unwrap();
        assert_eq!(query.predicates().len(), 3);
        assert_eq!(query.predicates()[0], score.expr().clone().gt(0.0));
    }

    #[test]
    fn test_min_score_can_be_disabled() {
        let config = SearchConfig {
            require_positive_score: false,
            limit: Some(5),
            ..SearchConfig::default()
        };
        let query = build_search_query(&config, "asian", NO_FILTERS).unwrap();
        assert!(query.predicates().is_empty());
        assert!(query.to_sql(&Postgres).unwrap().sql.ends_with(" LIMIT $8::int8"));
    }

    #[test]
    fn test_for_record_overrides_columns() {
        let config = SearchConfig {
            columns: vec!["name".to_string()],
            ..SearchConfig::default()
        }
        .for_record::<Business>();
        assert_eq!(config.columns.len(), Business::COLUMNS.len());
    }
}
