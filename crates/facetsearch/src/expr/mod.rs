//! Expression model.
//!
//! A small algebra of SQL expressions: identifiers, bound literals, function
//! calls, casts, raw fragments, and binary operators. Expressions are built by
//! value and never modified once constructed; every combinator consumes its
//! inputs and returns a new tree, so sharing a sub-expression means cloning it.
//!
//! Rendering is deferred to [`Expr::render`], which takes a [`Dialect`] and
//! produces parameterized SQL. Literal values never appear in the SQL text.
//!
//! ```
//! use facetsearch::expr::{Expr, Postgres};
//!
//! let rank = Expr::func("ts_rank_cd", vec![
//!     Expr::func("to_tsvector", vec![Expr::ident("name")]),
//!     Expr::func("plainto_tsquery", vec![Expr::lit("asian")]),
//! ]);
//! let rendered = rank.gt(0.0).render(&Postgres).unwrap();
//! assert_eq!(
//!     rendered.sql,
//!     r#"ts_rank_cd(to_tsvector("name"), plainto_tsquery($1::text)) > $2::float8"#
//! );
//! assert_eq!(rendered.params.len(), 2);
//! ```

pub mod dialect;
pub mod render;

use std::fmt;

pub use dialect::{Dialect, Postgres, Sqlite};
pub use render::{RenderedSql, SqlParam};

/// A SQL type that an expression can be cast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// Variable-length text.
    Text,
    /// Arbitrary precision number.
    Numeric,
    /// 64-bit float.
    Float8,
    /// 64-bit integer.
    Int8,
    /// Boolean.
    Bool,
    /// Binary JSON document.
    Jsonb,
    /// PostgreSQL single-byte `"char"`, used for tsvector weights.
    Char,
    /// PostgreSQL text search configuration name.
    RegConfig,
}

impl SqlType {
    /// Returns a dialect-independent name for error messages.
    pub fn name(self) -> &'static str {
        match self {
            SqlType::Text => "text",
            SqlType::Numeric => "numeric",
            SqlType::Float8 => "float8",
            SqlType::Int8 => "int8",
            SqlType::Bool => "bool",
            SqlType::Jsonb => "jsonb",
            SqlType::Char => "char",
            SqlType::RegConfig => "regconfig",
        }
    }
}

/// Binary operators, including comparisons and boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    And,
    Or,
    /// String or tsvector concatenation (`||`).
    Concat,
    /// Document containment (`@>`).
    Contains,
    /// Document field access (`->`).
    JsonGet,
    /// Great-circle distance in statute miles between two points (`<@>`).
    EarthDistance,
}

impl BinaryOp {
    /// Returns the operator's conventional symbol, for diagnostics.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Concat => "||",
            BinaryOp::Contains => "@>",
            BinaryOp::JsonGet => "->",
            BinaryOp::EarthDistance => "<@>",
        }
    }

    /// True for AND and OR, which bind looser than every other operator.
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// A SQL expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column or relation name, optionally dotted (`table.column`).
    Identifier(String),
    /// A value bound as a statement parameter.
    Literal(SqlParam),
    /// A function call. Argument order is rendered verbatim.
    FunctionCall { name: String, args: Vec<Expr> },
    /// A type cast.
    Cast { expr: Box<Expr>, target: SqlType },
    /// Literal SQL text where each `?` is replaced by the matching bound expression.
    RawFragment { text: String, params: Vec<Expr> },
    /// `left op right`.
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Creates an identifier expression.
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Identifier(name.into())
    }

    /// Creates a bound literal.
    pub fn lit(value: impl Into<SqlParam>) -> Self {
        Expr::Literal(value.into())
    }

    /// Creates a function call.
    pub fn func(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::FunctionCall {
            name: name.into(),
            args,
        }
    }

    /// Creates a raw fragment. Each `?` in `text` is replaced, in order, by one
    /// of `params` at render time.
    pub fn raw(text: impl Into<String>, params: Vec<Expr>) -> Self {
        Expr::RawFragment {
            text: text.into(),
            params,
        }
    }

    /// Casts this expression to `target`.
    pub fn cast(self, target: SqlType) -> Self {
        Expr::Cast {
            expr: Box::new(self),
            target,
        }
    }

    /// Combines this expression with `right` using `op`.
    pub fn binary(self, op: BinaryOp, right: impl Into<Expr>) -> Self {
        Expr::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right.into()),
        }
    }

    pub fn eq(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    pub fn not_eq(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::NotEq, right)
    }

    pub fn gt(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Gt, right)
    }

    pub fn gte(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ge, right)
    }

    pub fn lt(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Lt, right)
    }

    pub fn lte(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Le, right)
    }

    pub fn and(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::And, right)
    }

    pub fn or(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Or, right)
    }

    pub fn concat(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Concat, right)
    }

    /// `self @> right`: the document on the left contains every key/value pair of the right.
    pub fn contains(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Contains, right)
    }

    /// `self -> key`: the value stored under `key` in a document.
    pub fn json_get(self, key: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::JsonGet, key)
    }

    /// Distance in statute miles between two points.
    pub fn earth_distance(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::EarthDistance, right)
    }

    /// Gives this expression an output alias.
    pub fn named(self, alias: impl Into<String>) -> NamedExpr {
        NamedExpr::new(self, alias)
    }

    /// Ascending order on this expression.
    pub fn asc(self) -> OrderBy {
        OrderBy {
            expr: self,
            direction: SortDirection::Ascending,
        }
    }

    /// Descending order on this expression.
    pub fn desc(self) -> OrderBy {
        OrderBy {
            expr: self,
            direction: SortDirection::Descending,
        }
    }

    /// Renders this expression as parameterized SQL.
    pub fn render(&self, dialect: &dyn Dialect) -> Result<RenderedSql, crate::RenderError> {
        let mut renderer = render::Renderer::new(dialect);
        renderer.expr(self)?;
        Ok(renderer.finish())
    }

    /// Folds a list of predicates into one with `AND`, preserving order.
    pub fn all(predicates: impl IntoIterator<Item = Expr>) -> Option<Expr> {
        predicates.into_iter().reduce(Expr::and)
    }
}

macro_rules! literal_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Expr::Literal(value.into())
                }
            }
        )*
    };
}

literal_from!(SqlParam, bool, i32, i64, f64, &str, String);

/// An expression with an output alias.
///
/// The alias gives the expression a stable name in the select list. Queries
/// order by the alias and filter on a clone of the same tree, so the text used
/// for display, sorting, and filtering is identical.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedExpr {
    expr: Expr,
    alias: String,
}

impl NamedExpr {
    /// Creates a named expression.
    pub fn new(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: alias.into(),
        }
    }

    /// The underlying expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// The output alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// An identifier referring to the alias.
    pub fn reference(&self) -> Expr {
        Expr::ident(self.alias.clone())
    }
}

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "ASC"),
            SortDirection::Descending => write!(f, "DESC"),
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub direction: SortDirection,
}
