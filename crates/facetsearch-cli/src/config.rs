//! Command-line configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SEARCH_CONFIG` | | JSON file with a `SearchConfig` |
//! | `SEARCH_LIMIT` | | Maximum number of results |
//! | `SEARCH_DATABASE_URL` | | PostgreSQL connection string |
//! | `SEARCH_LOG_LEVEL` | warn | Log level |

use std::path::PathBuf;

use clap::Parser;
use facetsearch::filter::{Filter, facet_eq, facet_gt, facet_lt, within_radius};
use facetsearch::{FacetValue, GeoPoint, SearchConfig, SearchResult};

/// Full-text search with facet and distance filters.
#[derive(Debug, Clone, Parser)]
#[command(name = "facetsearch")]
#[command(about = "Full-text search with facet and distance filters")]
pub struct Cli {
    /// Free-text search term.
    pub term: String,

    /// Facet equality filter (repeatable).
    #[arg(long = "facet-eq", value_name = "KEY=VALUE", value_parser = parse_facet)]
    pub facet_eq: Vec<(String, FacetValue)>,

    /// Keep rows whose numeric facet is greater than the threshold (repeatable).
    #[arg(long = "facet-gt", value_name = "KEY=NUMBER", value_parser = parse_threshold)]
    pub facet_gt: Vec<(String, f64)>,

    /// Keep rows whose numeric facet is less than the threshold (repeatable).
    #[arg(long = "facet-lt", value_name = "KEY=NUMBER", value_parser = parse_threshold)]
    pub facet_lt: Vec<(String, f64)>,

    /// Keep rows within a distance in miles of a point.
    #[arg(long, value_name = "MILES,LAT,LON", value_parser = parse_within)]
    pub within: Option<(f64, GeoPoint)>,

    /// Keep rows with a zero score.
    #[arg(long)]
    pub no_min_score: bool,

    /// Maximum number of results.
    #[arg(long, env = "SEARCH_LIMIT")]
    pub limit: Option<u64>,

    /// JSON file with search settings.
    #[arg(long, env = "SEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database connection string. Without one the query is printed instead.
    #[arg(long, env = "SEARCH_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "SEARCH_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Loads the settings file, if any, and applies command-line overrides.
    pub fn search_config(&self) -> anyhow::Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|e| {
                    anyhow::anyhow!("Failed to read config {}: {}", path.display(), e)
                })?;
                SearchConfig::from_json(&json)?
            }
            None => SearchConfig::default(),
        };

        if self.no_min_score {
            config.require_positive_score = false;
        }
        if self.limit.is_some() {
            config.limit = self.limit;
        }
        Ok(config)
    }

    /// Builds the filters in command-line order: equality, greater-than,
    /// less-than, then distance.
    pub fn filters(&self) -> SearchResult<Vec<Box<dyn Filter>>> {
        let mut filters: Vec<Box<dyn Filter>> = Vec::new();
        for (key, value) in &self.facet_eq {
            filters.push(Box::new(facet_eq(key.as_str(), value.clone())?));
        }
        for (key, threshold) in &self.facet_gt {
            filters.push(Box::new(facet_gt(key.as_str(), *threshold)));
        }
        for (key, threshold) in &self.facet_lt {
            filters.push(Box::new(facet_lt(key.as_str(), *threshold)));
        }
        if let Some((miles, center)) = self.within {
            filters.push(Box::new(within_radius(miles, center)));
        }
        Ok(filters)
    }
}

fn split_pair(s: &str) -> Result<(&str, &str), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn parse_facet(s: &str) -> Result<(String, FacetValue), String> {
    let (key, value) = split_pair(s)?;
    Ok((key.to_string(), FacetValue::parse(value)))
}

fn parse_threshold(s: &str) -> Result<(String, f64), String> {
    let (key, value) = split_pair(s)?;
    let threshold = value
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a number", value))?;
    Ok((key.to_string(), threshold))
}

fn parse_within(s: &str) -> Result<(f64, GeoPoint), String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("expected MILES,LAT,LON, got '{}'", s))?;
    match parts.as_slice() {
        [miles, latitude, longitude] => Ok((*miles, GeoPoint::new(*latitude, *longitude))),
        _ => Err(format!("expected MILES,LAT,LON, got '{}'", s)),
    }
}
