//! SQL dialects.
//!
//! A [`Dialect`] decides how identifiers are quoted, how parameters are
//! written, and how operators and cast targets are spelled. Anything a dialect
//! cannot express is reported as a [`RenderError`] when the expression is
//! rendered, never when it is built.

use std::fmt::{self, Write};

use super::render::SqlParam;
use super::{BinaryOp, SqlType};
use crate::error::RenderError;

/// Target SQL dialect for rendering.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Dialect name used in error messages.
    fn name(&self) -> &'static str;

    /// Writes a parameter placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize, param: &SqlParam, out: &mut String);

    /// Returns the spelling of a binary operator.
    fn binary_operator(&self, op: BinaryOp) -> Result<&'static str, RenderError>;

    /// Returns the spelling of a cast target type.
    fn cast_type(&self, target: SqlType) -> Result<&'static str, RenderError>;

    /// Writes a quoted identifier. Dotted names are quoted per segment.
    fn quote_identifier(&self, ident: &str, out: &mut String) {
        for (i, part) in ident.split('.').enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push('"');
            out.push_str(&part.replace('"', "\"\""));
            out.push('"');
        }
    }
}

/// PostgreSQL dialect.
///
/// Placeholders carry an explicit type (`$1::float8`) so that values bound
/// from Rust never depend on server-side parameter type inference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize, param: &SqlParam, out: &mut String) {
        let ty = match param {
            SqlParam::Text(_) => "text",
            SqlParam::Float(_) => "float8",
            SqlParam::Integer(_) => "int8",
            SqlParam::Bool(_) => "bool",
        };
        let _ = write!(out, "${}::{}", index, ty);
    }

    fn binary_operator(&self, op: BinaryOp) -> Result<&'static str, RenderError> {
        Ok(op.symbol())
    }

    fn cast_type(&self, target: SqlType) -> Result<&'static str, RenderError> {
        Ok(match target {
            SqlType::Text => "TEXT",
            SqlType::Numeric => "NUMERIC",
            SqlType::Float8 => "DOUBLE PRECISION",
            SqlType::Int8 => "BIGINT",
            SqlType::Bool => "BOOLEAN",
            SqlType::Jsonb => "JSONB",
            SqlType::Char => "\"char\"",
            SqlType::RegConfig => "REGCONFIG",
        })
    }
}

/// SQLite dialect.
///
/// Supports comparisons, boolean connectives, concatenation and scalar casts.
/// Document operators, earth distance and PostgreSQL-only types are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, index: usize, _param: &SqlParam, out: &mut String) {
        let _ = write!(out, "?{}", index);
    }

    fn binary_operator(&self, op: BinaryOp) -> Result<&'static str, RenderError> {
        match op {
            BinaryOp::Contains | BinaryOp::JsonGet | BinaryOp::EarthDistance => {
                Err(RenderError::UnsupportedOperator {
                    dialect: self.name(),
                    operator: op.symbol(),
                })
            }
            _ => Ok(op.symbol()),
        }
    }

    fn cast_type(&self, target: SqlType) -> Result<&'static str, RenderError> {
        match target {
            SqlType::Text => Ok("TEXT"),
            SqlType::Numeric => Ok("NUMERIC"),
            SqlType::Float8 => Ok("REAL"),
            SqlType::Int8 | SqlType::Bool => Ok("INTEGER"),
            SqlType::Jsonb | SqlType::Char | SqlType::RegConfig => {
                Err(RenderError::UnsupportedCast {
                    dialect: self.name(),
                    target: target.name(),
                })
            }
        }
    }
}
