//! Facet values and their document encoding.
//!
//! Facets live in a semi-structured JSON bag column. A [`FacetValue`] is the
//! closed set of scalar kinds a facet can hold, and encodes to and decodes
//! from the bag's JSON representation without changing kind: integers stay
//! integers, floats stay floats.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DecodeError, SearchError, SearchResult};

/// A scalar facet value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacetValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FacetValue {
    /// Parses a command-line style value.
    ///
    /// `true`/`false` become booleans, then integers and floats are tried,
    /// and anything else is text.
    pub fn parse(s: &str) -> Self {
        match s {
            "true" => return FacetValue::Bool(true),
            "false" => return FacetValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = s.parse::<i64>() {
            return FacetValue::Integer(i);
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_finite() => FacetValue::Float(f),
            _ => FacetValue::Text(s.to_string()),
        }
    }

    /// Returns the JSON kind name, matching `jsonb_typeof`.
    pub fn kind(&self) -> &'static str {
        match self {
            FacetValue::Bool(_) => "boolean",
            FacetValue::Integer(_) | FacetValue::Float(_) => "number",
            FacetValue::Text(_) => "string",
        }
    }

    /// Converts to a JSON value, failing for floats JSON cannot represent.
    pub fn to_json(&self, key: &str) -> SearchResult<Value> {
        match self {
            FacetValue::Bool(b) => Ok(Value::Bool(*b)),
            FacetValue::Integer(i) => Ok(Value::from(*i)),
            FacetValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .ok_or_else(|| SearchError::Serialization {
                    key: key.to_string(),
                    message: format!("{} has no JSON representation", f),
                }),
            FacetValue::Text(s) => Ok(Value::String(s.clone())),
        }
    }

    /// Converts from a JSON scalar.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(FacetValue::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(FacetValue::Integer)
                .or_else(|| n.as_f64().map(FacetValue::Float)),
            Value::String(s) => Some(FacetValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for FacetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacetValue::Bool(b) => write!(f, "{}", b),
            FacetValue::Integer(i) => write!(f, "{}", i),
            FacetValue::Float(x) => write!(f, "{}", x),
            FacetValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for FacetValue {
    fn from(value: bool) -> Self {
        FacetValue::Bool(value)
    }
}

impl From<i64> for FacetValue {
    fn from(value: i64) -> Self {
        FacetValue::Integer(value)
    }
}

impl From<i32> for FacetValue {
    fn from(value: i32) -> Self {
        FacetValue::Integer(i64::from(value))
    }
}

impl From<f64> for FacetValue {
    fn from(value: f64) -> Self {
        FacetValue::Float(value)
    }
}

impl From<&str> for FacetValue {
    fn from(value: &str) -> Self {
        FacetValue::Text(value.to_string())
    }
}

impl From<String> for FacetValue {
    fn from(value: String) -> Self {
        FacetValue::Text(value)
    }
}

/// Encodes `{key: value}` as a compact JSON document.
pub fn encode_facet(key: &str, value: &FacetValue) -> SearchResult<String> {
    let mut doc = Map::new();
    doc.insert(key.to_string(), value.to_json(key)?);
    serde_json::to_string(&Value::Object(doc)).map_err(|e| SearchError::Serialization {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// Decodes a single-entry document produced by [`encode_facet`].
pub fn decode_facet(document: &str) -> SearchResult<(String, FacetValue)> {
    let malformed = |message: String| SearchError::from(DecodeError::MalformedFacet { message });

    let value: Value = serde_json::from_str(document).map_err(|e| malformed(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(malformed(format!("expected a JSON object, got {}", document)));
    };
    if map.len() != 1 {
        return Err(malformed(format!("expected exactly one facet, got {}", map.len())));
    }
    let Some((key, value)) = map.into_iter().next() else {
        return Err(malformed("empty facet document".to_string()));
    };
    let facet = FacetValue::from_json(&value)
        .ok_or_else(|| malformed(format!("facet '{}': {} is not a scalar value", key, value)))?;
    Ok((key, facet))
}
