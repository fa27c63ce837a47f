//! Weighted relevance score expression.
//!
//! The score is PostgreSQL full-text ranking over a weighted document built
//! from several columns:
//!
//! ```text
//! ts_rank_cd(
//!     setweight(to_tsvector(coalesce(name, '')), 'A') ||
//!     setweight(to_tsvector(coalesce(description, '')), 'B') ||
//!     setweight(to_tsvector(coalesce(facets::text, '')), 'C'),
//!     plainto_tsquery(term)
//! ) AS score
//! ```
//!
//! Every source column is coalesced to empty text so a NULL column contributes
//! nothing instead of turning the whole document NULL.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SearchError, SearchResult};
use crate::expr::{Expr, NamedExpr, SqlType};

/// Output alias of the score expression.
pub const SCORE_ALIAS: &str = "score";

/// Relative field priority for ranking.
///
/// Ordered so that `A > B > C > D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weight {
    D,
    C,
    B,
    A,
}

impl Weight {
    /// The weight label understood by `setweight`.
    pub fn as_str(self) -> &'static str {
        match self {
            Weight::A => "A",
            Weight::B => "B",
            Weight::C => "C",
            Weight::D => "D",
        }
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a source column is turned into searchable text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// A text column, used as is.
    #[default]
    Text,
    /// A document column, cast to its text form first.
    Document,
}

/// A column that contributes to the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchField {
    pub column: String,
    pub weight: Weight,
    #[serde(default)]
    pub kind: FieldKind,
}

impl SearchField {
    /// A text column with the given weight.
    pub fn text(column: impl Into<String>, weight: Weight) -> Self {
        Self {
            column: column.into(),
            weight,
            kind: FieldKind::Text,
        }
    }

    /// A document column with the given weight.
    pub fn document(column: impl Into<String>, weight: Weight) -> Self {
        Self {
            column: column.into(),
            weight,
            kind: FieldKind::Document,
        }
    }

    fn source(&self) -> Expr {
        let column = Expr::ident(self.column.clone());
        match self.kind {
            FieldKind::Text => column,
            FieldKind::Document => column.cast(SqlType::Text),
        }
    }
}

/// Ranking function applied to the weighted document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankFunction {
    /// `ts_rank_cd`, cover density ranking.
    #[default]
    CoverDensity,
    /// `ts_rank`, frequency ranking.
    Frequency,
}

impl RankFunction {
    pub fn function_name(self) -> &'static str {
        match self {
            RankFunction::CoverDensity => "ts_rank_cd",
            RankFunction::Frequency => "ts_rank",
        }
    }
}

/// Builds the score expression for a search term.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBuilder {
    fields: Vec<SearchField>,
    text_search_config: Option<String>,
    rank: RankFunction,
}

impl ScoreBuilder {
    /// Creates a builder over `fields`, in the order given.
    pub fn new(fields: Vec<SearchField>) -> Self {
        Self {
            fields,
            text_search_config: None,
            rank: RankFunction::default(),
        }
    }

    /// Uses a named text search configuration (e.g. `english`).
    pub fn text_search_config(mut self, config: impl Into<String>) -> Self {
        self.text_search_config = Some(config.into());
        self
    }

    /// Selects the ranking function.
    pub fn rank_function(mut self, rank: RankFunction) -> Self {
        self.rank = rank;
        self
    }

    pub fn fields(&self) -> &[SearchField] {
        &self.fields
    }

    /// Builds the score for `term`, aliased as [`SCORE_ALIAS`].
    ///
    /// The term is passed to the backend untouched, including when empty.
    pub fn build(&self, term: &str) -> SearchResult<NamedExpr> {
        let document = self
            .fields
            .iter()
            .map(|field| self.weighted_vector(field))
            .reduce(Expr::concat)
            .ok_or_else(|| SearchError::InvalidConfig {
                message: "at least one weighted search field is required".to_string(),
            })?;

        let query = Expr::func("plainto_tsquery", self.with_config(Expr::lit(term)));
        let score = Expr::func(self.rank.function_name(), vec![document, query]);

        Ok(score.named(SCORE_ALIAS))
    }

    fn weighted_vector(&self, field: &SearchField) -> Expr {
        let text = Expr::func("coalesce", vec![field.source(), Expr::lit("")]);
        let vector = Expr::func("to_tsvector", self.with_config(text));
        Expr::func(
            "setweight",
            vec![vector, Expr::lit(field.weight.as_str()).cast(SqlType::Char)],
        )
    }

    /// Prepends the text search configuration argument when one is set.
    fn with_config(&self, arg: Expr) -> Vec<Expr> {
        match &self.text_search_config {
            Some(config) => vec![Expr::lit(config.as_str()).cast(SqlType::RegConfig), arg],
            None => vec![arg],
        }
    }
}
