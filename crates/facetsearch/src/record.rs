//! Result rows and typed records.
//!
//! Executors hand back [`Row`]s: ordered, named column values in a
//! backend-neutral form. A [`Record`] decodes itself from a row and fails on a
//! missing column or a value of the wrong kind; nothing is defaulted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::score::SCORE_ALIAS;

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    TextArray(Vec<String>),
    Json(Value),
}

impl ColumnValue {
    /// Kind name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ColumnValue::Null => "null",
            ColumnValue::Bool(_) => "bool",
            ColumnValue::Integer(_) => "integer",
            ColumnValue::Float(_) => "float",
            ColumnValue::Text(_) => "text",
            ColumnValue::TextArray(_) => "text[]",
            ColumnValue::Json(_) => "json",
        }
    }
}

/// A result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, ColumnValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column.
    pub fn push(&mut self, name: impl Into<String>, value: ColumnValue) {
        self.columns.push((name.into(), value));
    }

    /// Appends a column, builder style.
    pub fn with(mut self, name: impl Into<String>, value: ColumnValue) -> Self {
        self.push(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the value of `column`.
    pub fn get(&self, column: &str) -> Result<&ColumnValue, DecodeError> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
            .ok_or_else(|| DecodeError::MissingColumn {
                column: column.to_string(),
            })
    }

    pub fn get_i64(&self, column: &str) -> Result<i64, DecodeError> {
        match self.get(column)? {
            ColumnValue::Integer(i) => Ok(*i),
            other => Err(unexpected(column, "integer", other)),
        }
    }

    pub fn get_f64(&self, column: &str) -> Result<f64, DecodeError> {
        match self.get(column)? {
            ColumnValue::Float(f) => Ok(*f),
            other => Err(unexpected(column, "float", other)),
        }
    }

    pub fn get_str(&self, column: &str) -> Result<&str, DecodeError> {
        match self.get(column)? {
            ColumnValue::Text(s) => Ok(s),
            other => Err(unexpected(column, "text", other)),
        }
    }

    /// Like [`Row::get_str`], but NULL decodes to `None`.
    pub fn get_opt_str(&self, column: &str) -> Result<Option<&str>, DecodeError> {
        match self.get(column)? {
            ColumnValue::Null => Ok(None),
            ColumnValue::Text(s) => Ok(Some(s)),
            other => Err(unexpected(column, "text or null", other)),
        }
    }

    pub fn get_text_array(&self, column: &str) -> Result<Vec<String>, DecodeError> {
        match self.get(column)? {
            ColumnValue::TextArray(items) => Ok(items.clone()),
            other => Err(unexpected(column, "text[]", other)),
        }
    }

    pub fn get_json_object(&self, column: &str) -> Result<Map<String, Value>, DecodeError> {
        match self.get(column)? {
            ColumnValue::Json(Value::Object(map)) => Ok(map.clone()),
            ColumnValue::Json(_) => Err(DecodeError::UnexpectedType {
                column: column.to_string(),
                expected: "json object",
                found: "json",
            }),
            other => Err(unexpected(column, "json object", other)),
        }
    }
}

fn unexpected(column: &str, expected: &'static str, found: &ColumnValue) -> DecodeError {
    DecodeError::UnexpectedType {
        column: column.to_string(),
        expected,
        found: found.kind(),
    }
}

/// A type that can be decoded from a result row.
pub trait Record: Sized {
    /// Columns to project for this record, in select-list order.
    const COLUMNS: &'static [&'static str];

    fn decode(row: &Row) -> Result<Self, DecodeError>;
}

/// A record together with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scored<R> {
    #[serde(flatten)]
    pub record: R,
    pub score: f64,
}

impl<R: Record> Scored<R> {
    /// Decodes the record columns plus the score column.
    pub fn decode(row: &Row) -> Result<Self, DecodeError> {
        Ok(Self {
            record: R::decode(row)?,
            score: row.get_f64(SCORE_ALIAS)?,
        })
    }
}

/// A business listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub street_address: Vec<String>,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub latitude: f64,
    pub longitude: f64,
    pub facets: Map<String, Value>,
}

impl Record for Business {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "street_address",
        "city",
        "state",
        "postcode",
        "latitude",
        "longitude",
        "facets",
    ];

    fn decode(row: &Row) -> Result<Self, DecodeError> {
        Ok(Self {
            id: row.get_i64("id")?,
            name: row.get_str("name")?.to_string(),
            description: row.get_opt_str("description")?.map(str::to_string),
            street_address: row.get_text_array("street_address")?,
            city: row.get_str("city")?.to_string(),
            state: row.get_str("state")?.to_string(),
            postcode: row.get_str("postcode")?.to_string(),
            latitude: row.get_f64("latitude")?,
            longitude: row.get_f64("longitude")?,
            facets: row.get_json_object("facets")?,
        })
    }
}
