//! Parameterized SQL rendering.
//!
//! Rendering walks an expression tree left to right. Each literal is replaced
//! by a placeholder and appended to the parameter list, so parameters appear
//! in the same order as their placeholders in the text.

use serde::Serialize;

use super::{Dialect, Expr};
use crate::error::RenderError;

/// Rendered SQL with its bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSql {
    /// The SQL string with dialect placeholders.
    pub sql: String,
    /// The parameter values, in placeholder order.
    pub params: Vec<SqlParam>,
}

/// A SQL parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    /// Text parameter.
    Text(String),
    /// Floating point parameter.
    Float(f64),
    /// Integer parameter.
    Integer(i64),
    /// Boolean parameter.
    Bool(bool),
}

impl SqlParam {
    /// Creates a text parameter.
    pub fn text(s: &str) -> Self {
        SqlParam::Text(s.to_string())
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        SqlParam::Float(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Integer(value)
    }
}

impl From<i32> for SqlParam {
    fn from(value: i32) -> Self {
        SqlParam::Integer(i64::from(value))
    }
}

impl From<bool> for SqlParam {
    fn from(value: bool) -> Self {
        SqlParam::Bool(value)
    }
}

/// Accumulates SQL text and parameters while walking expressions.
pub(crate) struct Renderer<'d> {
    dialect: &'d dyn Dialect,
    sql: String,
    params: Vec<SqlParam>,
}

impl<'d> Renderer<'d> {
    pub(crate) fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    pub(crate) fn push_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    pub(crate) fn identifier(&mut self, name: &str) {
        self.dialect.quote_identifier(name, &mut self.sql);
    }

    pub(crate) fn param(&mut self, param: &SqlParam) {
        self.params.push(param.clone());
        self.dialect.placeholder(self.params.len(), param, &mut self.sql);
    }

    pub(crate) fn expr(&mut self, expr: &Expr) -> Result<(), RenderError> {
        match expr {
            Expr::Identifier(name) => self.identifier(name),
            Expr::Literal(param) => self.param(param),
            Expr::FunctionCall { name, args } => {
                self.push_str(name);
                self.push_str("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.push_str(", ");
                    }
                    self.expr(arg)?;
                }
                self.push_str(")");
            }
            Expr::Cast { expr, target } => {
                let target = self.dialect.cast_type(*target)?;
                self.push_str("CAST(");
                self.expr(expr)?;
                self.push_str(" AS ");
                self.push_str(target);
                self.push_str(")");
            }
            Expr::RawFragment { text, params } => self.raw(text, params)?,
            Expr::Binary { left, op, right } => {
                let op = self.dialect.binary_operator(*op)?;
                self.operand(left)?;
                self.push_str(" ");
                self.push_str(op);
                self.push_str(" ");
                self.operand(right)?;
            }
        }
        Ok(())
    }

    /// Renders an operand of a binary expression, parenthesizing nested
    /// operators and raw fragments.
    fn operand(&mut self, expr: &Expr) -> Result<(), RenderError> {
        let grouped = matches!(expr, Expr::Binary { .. } | Expr::RawFragment { .. });
        self.grouped(expr, grouped)
    }

    /// Renders one conjunct of a WHERE clause.
    ///
    /// Anything that could contain a looser operator than AND is parenthesized,
    /// so a predicate can never absorb its neighbours.
    pub(crate) fn conjunct(&mut self, expr: &Expr) -> Result<(), RenderError> {
        let grouped = match expr {
            Expr::Identifier(_)
            | Expr::Literal(_)
            | Expr::FunctionCall { .. }
            | Expr::Cast { .. } => false,
            Expr::Binary { op, .. } => op.is_logical(),
            Expr::RawFragment { .. } => true,
        };
        self.grouped(expr, grouped)
    }

    fn grouped(&mut self, expr: &Expr, grouped: bool) -> Result<(), RenderError> {
        if !grouped {
            return self.expr(expr);
        }
        self.push_str("(");
        self.expr(expr)?;
        self.push_str(")");
        Ok(())
    }

    fn raw(&mut self, text: &str, params: &[Expr]) -> Result<(), RenderError> {
        let placeholders = text.matches('?').count();
        if placeholders != params.len() {
            return Err(RenderError::PlaceholderMismatch {
                text: text.to_string(),
                placeholders,
                bound: params.len(),
            });
        }

        let mut params = params.iter();
        for (i, segment) in text.split('?').enumerate() {
            if i > 0 {
                if let Some(param) = params.next() {
                    self.operand(param)?;
                }
            }
            self.push_str(segment);
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> RenderedSql {
        RenderedSql {
            sql: self.sql,
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Postgres, SqlType, Sqlite};

    #[test]
    fn test_params_follow_text_order() {
        let expr = Expr::func("point", vec![Expr::lit(-111.854952), Expr::lit(40.606536)])
            .eq(Expr::lit("x"));
        let rendered = expr.render(&Postgres).unwrap();

        assert_eq!(rendered.sql, "point($1::float8, $2::float8) = $3::text");
        assert_eq!(
            rendered.params,
            vec![
                SqlParam::Float(-111.854952),
                SqlParam::Float(40.606536),
                SqlParam::text("x"),
            ]
        );
    }

    #[test]
    fn test_raw_fragment_substitutes_expressions() {
        let expr = Expr::raw("? <@> ?", vec![Expr::ident("here"), Expr::lit(1.0)]);
        let rendered = expr.render(&Postgres).unwrap();
        assert_eq!(rendered.sql, r#""here" <@> $1::float8"#);
        assert_eq!(rendered.params, vec![SqlParam::Float(1.0)]);
    }

    #[test]
    fn test_raw_fragment_operand_is_grouped() {
        let either = Expr::raw(
            "? OR ?",
            vec![Expr::ident("is_open"), Expr::ident("is_new")],
        );
        let expr = either.and(Expr::ident("price").lt(2));
        assert_eq!(
            expr.render(&Postgres).unwrap().sql,
            r#"("is_open" OR "is_new") AND ("price" < $1::int8)"#
        );
    }

    #[test]
    fn test_raw_fragment_placeholder_mismatch() {
        let expr = Expr::raw("? = ?", vec![Expr::lit(1)]);
        let err = expr.render(&Postgres).unwrap_err();
        assert_eq!(
            err,
            RenderError::PlaceholderMismatch {
                text: "? = ?".to_string(),
                placeholders: 2,
                bound: 1,
            }
        );
    }

    #[test]
    fn test_literal_text_is_never_inlined() {
        let expr = Expr::ident("name").eq("x'; DROP TABLE businesses; --");
        let rendered = expr.render(&Postgres).unwrap();
        assert_eq!(rendered.sql, r#""name" = $1::text"#);
        assert!(!rendered.sql.contains("DROP"));
    }

    #[test]
    fn test_cast_rendering_per_dialect() {
        let expr = Expr::ident("price").cast(SqlType::Float8);
        assert_eq!(
            expr.render(&Postgres).unwrap().sql,
            r#"CAST("price" AS DOUBLE PRECISION)"#
        );
        assert_eq!(
            expr.render(&Sqlite).unwrap().sql,
            r#"CAST("price" AS REAL)"#
        );
    }

    #[test]
    fn test_sqlite_reports_unsupported_cast_at_render_time() {
        let expr = Expr::lit("{}").cast(SqlType::Jsonb);
        assert!(matches!(
            expr.render(&Sqlite),
            Err(RenderError::UnsupportedCast { target: "jsonb", .. })
        ));
    }
}
