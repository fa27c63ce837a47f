//! facetsearch
//!
//! Builds a ranked search query from a term and filters. Prints the rendered
//! statement, or runs it when a database URL is given.

mod config;

use clap::Parser;
use facetsearch::expr::Postgres;
use facetsearch::filter::Filter;
use facetsearch::{SearchConfig, build_search_query};
use tracing::info;

use config::Cli;

/// Installs the log subscriber. `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("facetsearch={}", level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = cli.search_config()?;
    let filters = cli.filters()?;

    info!(
        term = %cli.term,
        table = %config.table,
        filters = filters.len(),
        "Starting search"
    );

    match &cli.database_url {
        Some(url) => execute(url, &config, &cli.term, &filters).await,
        None => print_query(&config, &cli.term, &filters),
    }
}

/// Prints the rendered statement followed by its parameters as JSON.
fn print_query(
    config: &SearchConfig,
    term: &str,
    filters: &[Box<dyn Filter>],
) -> anyhow::Result<()> {
    let rendered = build_search_query(config, term, filters)?.to_sql(&Postgres)?;
    println!("{}", rendered.sql);
    println!("{}", serde_json::to_string_pretty(&rendered.params)?);
    Ok(())
}

/// Runs the search and prints the scored businesses as JSON.
#[cfg(feature = "postgres")]
async fn execute(
    url: &str,
    config: &SearchConfig,
    term: &str,
    filters: &[Box<dyn Filter>],
) -> anyhow::Result<()> {
    use facetsearch::Business;
    use facetsearch::executor::PostgresExecutor;

    let executor = PostgresExecutor::connect_url(url).await?;
    let results = facetsearch::search::<Business, _, _>(&executor, config, term, filters).await?;
    info!(results = results.len(), "Search finished");

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

/// Fallback when the postgres feature is not enabled.
#[cfg(not(feature = "postgres"))]
async fn execute(
    _url: &str,
    _config: &SearchConfig,
    _term: &str,
    _filters: &[Box<dyn Filter>],
) -> anyhow::Result<()> {
    anyhow::bail!(
        "Running searches requires the 'postgres' feature. \
         Build with: cargo build -p facetsearch-cli --features postgres"
    )
}
