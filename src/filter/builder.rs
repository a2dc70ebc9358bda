//! Fluent filter builder.
//!
//! Each call adds a clause that is and-joined with what came before. The
//! first invalid clause is kept and returned from [`FilterBuilder::build`];
//! later calls are ignored.
//!
//! ```
//! use sift::filter::FilterBuilder;
//!
//! let filter = FilterBuilder::new()
//!     .eq("kind", "post")
//!     .or(|b| b.gt("likes", 100).eq("pinned", true))
//!     .build()
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(
//!     filter.to_string(),
//!     "kind == 'post' or likes > 100 and pinned == true"
//! );
//! ```

use super::analyzer::analyze;
use super::ast::{ComputedExpr, Expr};
use super::constructors::{self, IntoLeft, IntoLiteral};
use super::parser::parse;
use super::token::{Token, TokenKind};
use crate::error::FilterError;

#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    expr: Option<ComputedExpr>,
    error: Option<FilterError>,
}

fn join(op: TokenKind, left: ComputedExpr, right: ComputedExpr) -> ComputedExpr {
    match op {
        TokenKind::Or => constructors::or(left, right).into(),
        _ => constructors::and(left, right).into(),
    }
}

fn checked(expr: Expr) -> Result<ComputedExpr, FilterError> {
    analyze(Some(&expr))?;
    ComputedExpr::try_from(expr).map_err(|_| FilterError::NilRoot)
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, op: TokenKind, clause: Result<ComputedExpr, FilterError>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match clause {
            Err(err) => Self {
                expr: self.expr,
                error: Some(err),
            },
            Ok(clause) => Self {
                expr: Some(match self.expr {
                    Some(current) => join(op, current, clause),
                    None => clause,
                }),
                error: None,
            },
        }
    }

    fn and_clause(self, clause: Expr) -> Self {
        self.push(TokenKind::And, checked(clause))
    }

    pub fn eq(self, field: impl IntoLeft, value: impl IntoLiteral) -> Self {
        self.and_clause(constructors::eq(field, value).into())
    }

    pub fn ne(self, field: impl IntoLeft, value: impl IntoLiteral) -> Self {
        self.and_clause(constructors::ne(field, value).into())
    }

    /// Comparison with any literal; a non-number is recorded as the
    /// builder's error.
    pub fn compare(self, field: impl IntoLeft, op: TokenKind, value: impl IntoLiteral) -> Self {
        if !op.is_ordering() && !matches!(op, TokenKind::Eq | TokenKind::NotEq) {
            let err = FilterError::InvalidOperand {
                op: op.as_str().to_string(),
                message: "not a comparison operator".to_string(),
                pos: None,
            };
            return self.push(TokenKind::And, Err(err));
        }
        let clause = Expr::from(super::ast::BinaryExpr {
            left: Box::new(field.into_left()),
            op: Token::operator(op),
            right: Box::new(value.into_literal().into()),
        });
        self.and_clause(clause)
    }

    pub fn lt(self, field: impl IntoLeft, value: impl IntoLiteral) -> Self {
        self.compare(field, TokenKind::Lt, value)
    }

    pub fn lte(self, field: impl IntoLeft, value: impl IntoLiteral) -> Self {
        self.compare(field, TokenKind::LtEq, value)
    }

    pub fn gt(self, field: impl IntoLeft, value: impl IntoLiteral) -> Self {
        self.compare(field, TokenKind::Gt, value)
    }

    pub fn gte(self, field: impl IntoLeft, value: impl IntoLiteral) -> Self {
        self.compare(field, TokenKind::GtEq, value)
    }

    pub fn like(self, field: impl IntoLeft, pattern: &str) -> Self {
        self.and_clause(constructors::like(field, pattern).into())
    }

    pub fn in_list<T: IntoLiteral>(self, field: impl IntoLeft, items: impl IntoIterator<Item = T>) -> Self {
        self.and_clause(constructors::in_list(field, items).into())
    }

    /// And-join an already built expression.
    pub fn expr(self, expr: impl Into<Expr>) -> Self {
        self.and_clause(expr.into())
    }

    /// And-join a clause written in filter syntax.
    pub fn text(self, source: &str) -> Self {
        let clause = parse(source).and_then(checked);
        self.push(TokenKind::And, clause)
    }

    fn scope(self, op: TokenKind, negate: bool, f: impl FnOnce(FilterBuilder) -> FilterBuilder) -> Self {
        if self.error.is_some() {
            return self;
        }
        let inner = f(FilterBuilder::new());
        match inner.finish() {
            Err(err) => self.push(op, Err(err)),
            Ok(None) => self,
            Ok(Some(group)) if negate => self.push(op, Ok(constructors::not(group).into())),
            Ok(Some(group)) => self.push(op, Ok(group)),
        }
    }

    /// And-join a group built by `f`.
    pub fn and(self, f: impl FnOnce(FilterBuilder) -> FilterBuilder) -> Self {
        self.scope(TokenKind::And, false, f)
    }

    /// Or-join a group built by `f`. Clauses inside the group are still
    /// and-joined with each other: `.or(|b| b.eq("a", 1).eq("b", 2))`
    /// yields `current or (a == 1 and b == 2)`.
    pub fn or(self, f: impl FnOnce(FilterBuilder) -> FilterBuilder) -> Self {
        self.scope(TokenKind::Or, false, f)
    }

    /// And-join the negation of a group built by `f`.
    pub fn not(self, f: impl FnOnce(FilterBuilder) -> FilterBuilder) -> Self {
        self.scope(TokenKind::And, true, f)
    }

    fn finish(self) -> Result<Option<ComputedExpr>, FilterError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.expr),
        }
    }

    /// The first recorded error, or the assembled filter (`None` if no
    /// clauses were added).
    pub fn build(self) -> Result<Option<Expr>, FilterError> {
        self.finish().map(|expr| expr.map(Expr::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::constructors::index;

    #[test]
    fn test_empty_builder() {
        assert_eq!(FilterBuilder::new().build(), Ok(None));
        assert_eq!(FilterBuilder::new().and(|b| b).build(), Ok(None));
    }

    #[test]
    fn test_clauses_are_and_joined() {
        let expr = FilterBuilder::new()
            .eq("name", "John")
            .gt("age", 18)
            .build()
            .unwrap()
            .unwrap();
        assert_eq!(expr, parse("name == 'John' and age > 18").unwrap());
    }

    #[test]
    fn test_or_scope_and_joins_inside() {
        let expr = FilterBuilder::new()
            .eq("a", 1)
            .or(|b| b.eq("b", 2).eq("c", 3))
            .build()
            .unwrap()
            .unwrap();
        assert_eq!(expr, parse("a == 1 or (b == 2 and c == 3)").unwrap());
    }

    #[test]
    fn test_or_on_empty_parent() {
        let expr = FilterBuilder::new()
            .or(|b| b.eq("a", 1))
            .build()
            .unwrap()
            .unwrap();
        assert_eq!(expr.to_string(), "a == 1");
    }

    #[test]
    fn test_not_scope() {
        let expr = FilterBuilder::new()
            .like("title", "a%")
            .not(|b| b.in_list("tag", ["x", "y"]))
            .build()
            .unwrap()
            .unwrap();
        assert_eq!(expr.to_string(), "title like 'a%' and not (tag in ('x', 'y'))");
    }

    #[test]
    fn test_first_error_wins() {
        let err = FilterBuilder::new()
            .eq("a", 1)
            .gt("age", "x")
            .lt("b", true)
            .eq("c", 2)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::TypeMismatch {
                op: ">".to_string(),
                expected: "number".to_string(),
                actual: "string".to_string(),
                pos: None,
            }
        );
    }

    #[test]
    fn test_error_inside_scope_propagates() {
        let err = FilterBuilder::new()
            .eq("a", 1)
            .or(|b| b.text("b ="))
            .build()
            .unwrap_err();
        assert!(err.is_lexical());
    }

    #[test]
    fn test_text_and_expr_clauses() {
        let expr = FilterBuilder::new()
            .text("a == 1 or b == 2")
            .expr(constructors::eq(index("m", "k"), 'z'.to_string()))
            .build()
            .unwrap()
            .unwrap();
        assert_eq!(expr.to_string(), "(a == 1 or b == 2) and m['k'] == 'z'");
    }

    #[test]
    fn test_non_boolean_expr_rejected() {
        let err = FilterBuilder::new().expr(constructors::ident("a")).build().unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperand { .. }));
    }

    #[test]
    fn test_compare_rejects_non_comparison() {
        let err = FilterBuilder::new()
            .compare("a", TokenKind::And, 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperand { ref op, .. } if op == "and"));
    }
}
