//! Query execution.
//!
//! The builder never talks to a database itself. A [`QueryExecutor`] takes a
//! rendered statement and returns rows; [`search`] ties assembly, rendering,
//! execution and decoding together.

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::SearchResult;
use crate::expr::{Dialect, RenderedSql};
use crate::filter::Filter;
use crate::record::{Record, Row, Scored};
use crate::search::{SearchConfig, build_search_query};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresExecutor, PostgresExecutorConfig};

/// Runs rendered statements.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// The dialect statements must be rendered in.
    fn dialect(&self) -> &dyn Dialect;

    /// Executes `query` and returns its rows in order.
    async fn fetch(&self, query: &RenderedSql) -> SearchResult<Vec<Row>>;
}

/// Searches for `term`, applies `filters`, and decodes each row as `R`.
///
/// The select list is taken from `R::COLUMNS`; all other settings come from
/// `config`.
pub async fn search<R, E, I>(
    executor: &E,
    config: &SearchConfig,
    term: &str,
    filters: I,
) -> SearchResult<Vec<Scored<R>>>
where
    R: Record,
    E: QueryExecutor + ?Sized,
    I: IntoIterator,
    I::Item: Filter,
{
    let rendered = build_search_query(&config.for_record::<R>(), term, filters)?
        .with_row_type(std::any::type_name::<R>())
        .to_sql(executor.dialect())?;

    debug!(sql = %rendered.sql, params = rendered.params.len(), "executing search");
    let rows = executor.fetch(&rendered).await?;
    info!(term, rows = rows.len(), "search complete");

    let records = rows
        .iter()
        .map(Scored::<R>::decode)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}
