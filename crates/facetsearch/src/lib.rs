//! Composable full-text search queries with facet and geo filters.
//!
//! This crate builds a single parameterized SQL query from a free-text search
//! term and any number of structured filters. The relevance score is built
//! once, selected under the alias `score`, used for ordering, and (by default)
//! required to be positive.
//!
//! # Architecture
//!
//! - [`expr`] - Expression model, dialects and parameterized rendering
//! - [`score`] - Weighted multi-field relevance score
//! - [`query`] - Immutable-per-step SELECT query values
//! - [`filter`] - The [`Filter`](filter::Filter) trait, its fold, and the facet/geo filters
//! - [`search`] - Query assembly from a [`SearchConfig`]
//! - [`record`] - Result rows and typed records with their score
//! - [`executor`] - The executor seam, plus a PostgreSQL executor behind the `postgres` feature
//! - [`error`] - Error types for all of the above
//!
//! # Example
//!
//! ```
//! use facetsearch::expr::Postgres;
//! use facetsearch::filter::{facet_eq, facet_lt, within_radius, Filter};
//! use facetsearch::types::GeoPoint;
//! use facetsearch::{SearchConfig, build_search_query};
//!
//! let filters: Vec<Box<dyn Filter>> = vec![
//!     Box::new(facet_eq("kid_friendly", true)?),
//!     Box::new(facet_lt("price_range", 2.0)),
//!     Box::new(within_radius(3.0, GeoPoint::new(40.606536, -111.854952))),
//! ];
//!
//! let query = build_search_query(&SearchConfig::default(), "asian", &filters)?;
//! let rendered = query.to_sql(&Postgres)?;
//!
//! assert!(rendered.sql.starts_with(r#"SELECT "id", "name""#));
//! assert!(rendered.sql.ends_with(r#"ORDER BY "score" DESC"#));
//! # Ok::<(), facetsearch::SearchError>(())
//! ```
//!
//! # Features
//!
//! - `postgres` - [`PostgresExecutor`](executor::PostgresExecutor) over `tokio-postgres`

#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod executor;
pub mod expr;
pub mod filter;
pub mod query;
pub mod record;
pub mod score;
pub mod search;
pub mod types;

pub use error::{DecodeError, RenderError, SearchError, SearchResult};
pub use executor::{QueryExecutor, search};
pub use expr::{Expr, NamedExpr, RenderedSql, SqlParam};
pub use query::SelectQuery;
pub use record::{Business, Record, Row, Scored};
pub use score::{ScoreBuilder, SearchField, Weight};
pub use search::{SearchConfig, build_search_query};
pub use types::{FacetValue, GeoPoint};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
