//! Facet bag filters.

use crate::error::{SearchError, SearchResult};
use crate::expr::{Expr, SqlType};
use crate::query::SelectQuery;
use crate::types::{FacetValue, encode_facet};

use super::Filter;

/// Default name of the facet bag column.
pub const DEFAULT_FACET_COLUMN: &str = "facets";

/// Matches rows whose facet bag contains `{key: value}`.
///
/// The comparison is structural containment on the JSON document, so `2` and
/// `"2"` are different values and no numeric coercion happens.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetEquals {
    column: String,
    key: String,
    value: FacetValue,
    document: String,
}

impl FacetEquals {
    /// Encodes `{key: value}` up front; fails if the value has no JSON form.
    pub fn new(key: impl Into<String>, value: impl Into<FacetValue>) -> SearchResult<Self> {
        let key = key.into();
        let value = value.into();
        let document = encode_facet(&key, &value)?;
        Ok(Self {
            column: DEFAULT_FACET_COLUMN.to_string(),
            key,
            value,
            document,
        })
    }

    /// Targets a different bag column.
    pub fn on_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &FacetValue {
        &self.value
    }

    /// The encoded containment document.
    pub fn document(&self) -> &str {
        &self.document
    }
}

impl Filter for FacetEquals {
    fn name(&self) -> String {
        format!("facet_eq({}={})", self.key, self.value)
    }

    fn apply(&self, query: SelectQuery) -> SearchResult<SelectQuery> {
        let document = Expr::lit(self.document.as_str()).cast(SqlType::Jsonb);
        Ok(query.and_where(Expr::ident(self.column.clone()).contains(document)))
    }
}

/// Direction of a numeric facet comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    Above,
    Below,
}

/// Matches rows whose facet `key` holds a number above or below a threshold.
///
/// Adds two predicates, in this order: a guard that the stored value is a JSON
/// number, then the comparison itself. Values of any other kind never match.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetThreshold {
    column: String,
    key: String,
    direction: Threshold,
    threshold: f64,
}

impl FacetThreshold {
    pub fn greater_than(key: impl Into<String>, threshold: f64) -> Self {
        Self::new(key, Threshold::Above, threshold)
    }

    pub fn less_than(key: impl Into<String>, threshold: f64) -> Self {
        Self::new(key, Threshold::Below, threshold)
    }

    fn new(key: impl Into<String>, direction: Threshold, threshold: f64) -> Self {
        Self {
            column: DEFAULT_FACET_COLUMN.to_string(),
            key: key.into(),
            direction,
            threshold,
        }
    }

    /// Targets a different bag column.
    pub fn on_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn direction(&self) -> Threshold {
        self.direction
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn is_number(&self) -> Expr {
        Expr::func("jsonb_typeof", vec![self.facet()]).eq("number")
    }

    fn facet(&self) -> Expr {
        Expr::ident(self.column.clone()).json_get(self.key.as_str())
    }
}

impl Filter for FacetThreshold {
    fn name(&self) -> String {
        let op = match self.direction {
            Threshold::Above => "gt",
            Threshold::Below => "lt",
        };
        format!("facet_{}({}, {})", op, self.key, self.threshold)
    }

    fn apply(&self, query: SelectQuery) -> SearchResult<SelectQuery> {
        if !self.threshold.is_finite() {
            return Err(SearchError::filter(
                self.name(),
                format!("threshold {} is not a finite number", self.threshold),
            ));
        }

        // AND operands may be evaluated in any order, so the cast is only
        // reached through the CASE once the value is known to be a number.
        let value = Expr::raw(
            "CASE WHEN ? THEN ? END",
            vec![self.is_number(), self.facet().cast(SqlType::Float8)],
        );
        let comparison = match self.direction {
            Threshold::Above => value.gt(self.threshold),
            Threshold::Below => value.lt(self.threshold),
        };

        Ok(query.and_where(self.is_number()).and_where(comparison))
    }
}
