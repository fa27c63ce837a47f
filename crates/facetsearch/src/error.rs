//! Error types for query construction, rendering, and result decoding.
//!
//! Every fallible operation in this crate returns [`SearchResult`]. Errors are
//! grouped by the stage that produced them: encoding a facet value, applying a
//! filter, rendering an expression for a dialect, decoding a result row, or
//! running the finished query.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all search operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// A facet value could not be encoded into the bag's exchange format.
    #[error("cannot encode facet '{key}': {message}")]
    Serialization { key: String, message: String },

    /// A filter rejected the query it was applied to.
    #[error("filter {filter} failed: {message}")]
    FilterApplication { filter: String, message: String },

    /// The search configuration is unusable.
    #[error("invalid search configuration: {message}")]
    InvalidConfig { message: String },

    /// An expression could not be rendered in the target dialect.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A result row could not be decoded into a record.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The executor failed to run the query.
    #[error("query execution failed: {message}")]
    Executor { message: String },
}

/// Errors raised while rendering an expression tree to SQL text.
///
/// These indicate a composition mistake (an operator or cast the dialect has
/// no spelling for) rather than bad user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("operator '{operator}' is not supported by the {dialect} dialect")]
    UnsupportedOperator {
        dialect: &'static str,
        operator: &'static str,
    },

    #[error("cast to {target} is not supported by the {dialect} dialect")]
    UnsupportedCast {
        dialect: &'static str,
        target: &'static str,
    },

    #[error("raw fragment '{text}' has {placeholders} placeholders but {bound} bound values")]
    PlaceholderMismatch {
        text: String,
        placeholders: usize,
        bound: usize,
    },
}

/// Errors raised while decoding results: mapping a row onto a typed record,
/// or reading a facet document back into a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    #[error("column '{column}': expected {expected}, found {found}")]
    UnexpectedType {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("column '{column}' has unsupported database type {type_name}")]
    UnsupportedColumnType { column: String, type_name: String },

    #[error("malformed facet document: {message}")]
    MalformedFacet { message: String },
}

impl SearchError {
    /// Creates a filter application error.
    pub fn filter(filter: impl Into<String>, message: impl Into<String>) -> Self {
        SearchError::FilterApplication {
            filter: filter.into(),
            message: message.into(),
        }
    }

    /// Creates an executor error.
    pub fn executor(message: impl Into<String>) -> Self {
        SearchError::Executor {
            message: message.into(),
        }
    }

    /// Returns the name of the failing filter, if this is a filter error.
    pub fn failed_filter(&self) -> Option<&str> {
        match self {
            SearchError::FilterApplication { filter, .. } => Some(filter),
            _ => None,
        }
    }
}

/// Result type alias for search operations.
pub type SearchResult<T> = Result<T, SearchError>;
