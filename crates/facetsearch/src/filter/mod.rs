//! Composable query filters.
//!
//! A [`Filter`] turns one [`SelectQuery`] into the next, usually by adding
//! predicates. Filters hold no state between calls and know nothing about each
//! other, so any list of them can be folded over a base query with
//! [`apply_filters`]. The fold stops at the first error and drops the partial
//! query.
//!
//! ```
//! use facetsearch::filter::{apply_filters, facet_eq, facet_lt, within_radius, Filter};
//! use facetsearch::query::SelectQuery;
//! use facetsearch::types::GeoPoint;
//!
//! let filters: Vec<Box<dyn Filter>> = vec![
//!     Box::new(facet_eq("kid_friendly", true).unwrap()),
//!     Box::new(facet_lt("price_range", 2.0)),
//!     Box::new(within_radius(3.0, GeoPoint::new(40.606536, -111.854952))),
//! ];
//! let query = apply_filters(SelectQuery::from("businesses"), &filters).unwrap();
//! assert_eq!(query.predicates().len(), 4);
//! ```

pub mod facet;
pub mod geo;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::SearchResult;
use crate::query::SelectQuery;
use crate::types::{FacetValue, GeoPoint};

pub use facet::{DEFAULT_FACET_COLUMN, FacetEquals, FacetThreshold, Threshold};
pub use geo::{DEFAULT_LATITUDE_COLUMN, DEFAULT_LONGITUDE_COLUMN, WithinRadius};

/// A stateless query transformation.
pub trait Filter: fmt::Debug + Send + Sync {
    /// Short description used in logs and error messages.
    fn name(&self) -> String;

    /// Returns the query with this filter's predicates added.
    fn apply(&self, query: SelectQuery) -> SearchResult<SelectQuery>;
}

impl<F: Filter + ?Sized> Filter for &F {
    fn name(&self) -> String {
        (**self).name()
    }

    fn apply(&self, query: SelectQuery) -> SearchResult<SelectQuery> {
        (**self).apply(query)
    }
}

impl<F: Filter + ?Sized> Filter for Box<F> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn apply(&self, query: SelectQuery) -> SearchResult<SelectQuery> {
        (**self).apply(query)
    }
}

impl<F: Filter + ?Sized> Filter for Arc<F> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn apply(&self, query: SelectQuery) -> SearchResult<SelectQuery> {
        (**self).apply(query)
    }
}

/// Folds `filters` over `query` left to right.
///
/// Returns the first filter error unchanged; no partially filtered query is
/// ever returned. An empty filter list returns `query` as is.
pub fn apply_filters<I>(query: SelectQuery, filters: I) -> SearchResult<SelectQuery>
where
    I: IntoIterator,
    I::Item: Filter,
{
    filters.into_iter().try_fold(query, |query, filter| {
        trace!(filter = %filter.name(), "applying filter");
        filter.apply(query).inspect_err(|e| {
            debug!(filter = %filter.name(), error = %e, "filter rejected query");
        })
    })
}

/// A filter backed by a closure.
pub struct FnFilter<F> {
    name: String,
    f: F,
}

impl<F> fmt::Debug for FnFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFilter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> Filter for FnFilter<F>
where
    F: Fn(SelectQuery) -> SearchResult<SelectQuery> + Send + Sync,
{
    fn name(&self) -> String {
        self.name.clone()
    }

    fn apply(&self, query: SelectQuery) -> SearchResult<SelectQuery> {
        (self.f)(query)
    }
}

/// Wraps a closure as a named filter.
pub fn filter_fn<F>(name: impl Into<String>, f: F) -> FnFilter<F>
where
    F: Fn(SelectQuery) -> SearchResult<SelectQuery> + Send + Sync,
{
    FnFilter {
        name: name.into(),
        f,
    }
}

/// Rows whose facet bag contains `{key: value}`.
pub fn facet_eq(
    key: impl Into<String>,
    value: impl Into<FacetValue>,
) -> SearchResult<FacetEquals> {
    FacetEquals::new(key, value)
}

/// Rows whose facet `key` is a number greater than `threshold`.
pub fn facet_gt(key: impl Into<String>, threshold: f64) -> FacetThreshold {
    FacetThreshold::greater_than(key, threshold)
}

/// Rows whose facet `key` is a number less than `threshold`.
pub fn facet_lt(key: impl Into<String>, threshold: f64) -> FacetThreshold {
    FacetThreshold::less_than(key, threshold)
}

/// Rows within `miles` statute miles of `center`.
pub fn within_radius(miles: f64, center: GeoPoint) -> WithinRadius {
    WithinRadius::new(miles, center)
}
