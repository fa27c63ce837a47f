//! Select query values.
//!
//! A [`SelectQuery`] accumulates a source relation, a select list, conjunctive
//! predicates, ordering and paging. Every builder method consumes the query
//! and returns the next one; to branch from a partially built query, clone it.

use crate::error::RenderError;
use crate::expr::render::Renderer;
use crate::expr::{Dialect, Expr, NamedExpr, OrderBy, RenderedSql, SqlParam};

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// An unnamed expression, usually a column.
    Expr(Expr),
    /// An expression with an output alias.
    Named(NamedExpr),
}

impl From<Expr> for Projection {
    fn from(expr: Expr) -> Self {
        Projection::Expr(expr)
    }
}

impl From<NamedExpr> for Projection {
    fn from(named: NamedExpr) -> Self {
        Projection::Named(named)
    }
}

/// A SELECT statement under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    source: String,
    projection: Vec<Projection>,
    predicates: Vec<Expr>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    row_type: Option<String>,
}

impl SelectQuery {
    /// Starts a query over `source`.
    pub fn from(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            projection: Vec::new(),
            predicates: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            row_type: None,
        }
    }

    /// Appends entries to the select list.
    pub fn select<P: Into<Projection>>(mut self, items: impl IntoIterator<Item = P>) -> Self {
        self.projection.extend(items.into_iter().map(Into::into));
        self
    }

    /// Appends plain columns to the select list.
    pub fn columns<S: AsRef<str>>(self, columns: impl IntoIterator<Item = S>) -> Self {
        self.select(columns.into_iter().map(|c| Expr::ident(c.as_ref())))
    }

    /// Adds a predicate. Predicates are joined with AND in insertion order.
    pub fn and_where(mut self, predicate: Expr) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Adds an ORDER BY term after any existing ones.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Sets the maximum number of rows.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of rows to skip.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Records the name of the row type results decode into.
    pub fn with_row_type(mut self, row_type: impl Into<String>) -> Self {
        self.row_type = Some(row_type.into());
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn projection(&self) -> &[Projection] {
        &self.projection
    }

    pub fn predicates(&self) -> &[Expr] {
        &self.predicates
    }

    pub fn ordering(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn row_type(&self) -> Option<&str> {
        self.row_type.as_deref()
    }

    /// Looks up a named select-list entry by alias.
    pub fn named(&self, alias: &str) -> Option<&NamedExpr> {
        self.projection.iter().find_map(|p| match p {
            Projection::Named(named) if named.alias() == alias => Some(named),
            _ => None,
        })
    }

    /// Renders the full statement.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> Result<RenderedSql, RenderError> {
        let mut r = Renderer::new(dialect);

        r.push_str("SELECT ");
        if self.projection.is_empty() {
            r.push_str("*");
        }
        for (i, item) in self.projection.iter().enumerate() {
            if i > 0 {
                r.push_str(", ");
            }
            match item {
                Projection::Expr(expr) => r.expr(expr)?,
                Projection::Named(named) => {
                    r.expr(named.expr())?;
                    r.push_str(" AS ");
                    r.identifier(named.alias());
                }
            }
        }

        r.push_str(" FROM ");
        r.identifier(&self.source);

        for (i, predicate) in self.predicates.iter().enumerate() {
            r.push_str(if i == 0 { " WHERE " } else { " AND " });
            r.conjunct(predicate)?;
        }

        for (i, order) in self.order_by.iter().enumerate() {
            r.push_str(if i == 0 { " ORDER BY " } else { ", " });
            r.expr(&order.expr)?;
            r.push_str(" ");
            r.push_str(&order.direction.to_string());
        }

        if let Some(limit) = self.limit {
            r.push_str(" LIMIT ");
            r.param(&SqlParam::Integer(clamp_i64(limit)));
        }
        if let Some(offset) = self.offset {
            r.push_str(" OFFSET ");
            r.param(&SqlParam::Integer(clamp_i64(offset)));
        }

        Ok(r.finish())
    }
}

fn clamp_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
