//! Typed constructors for building filters in code.
//!
//! ```
//! use sift::filter::constructors::{and, eq, gt, in_list, index};
//!
//! let filter = and(eq("name", "John"), gt("age", 18));
//! assert_eq!(filter.to_string(), "name == 'John' and age > 18");
//!
//! let tags = in_list(index("tags", 0), ["a", "b"]);
//! assert_eq!(tags.to_string(), "tags[0] in ('a', 'b')");
//! ```
//!
//! Ordering operators take [`IntoNumber`] operands, so `gt("age", "x")`
//! does not compile.

use super::ast::{
    BinaryExpr, ComputedExpr, Expr, Ident, IndexExpr, ListLiteral, Literal, LiteralKind, UnaryExpr,
};
use super::token::{Token, TokenKind};

/// Values usable as the left side of a comparison: field names and
/// subscripted fields.
pub trait IntoLeft {
    fn into_left(self) -> Expr;
}

impl IntoLeft for &str {
    fn into_left(self) -> Expr {
        ident(self).into()
    }
}

impl IntoLeft for String {
    fn into_left(self) -> Expr {
        ident(&self).into()
    }
}

impl IntoLeft for Ident {
    fn into_left(self) -> Expr {
        self.into()
    }
}

impl IntoLeft for IndexExpr {
    fn into_left(self) -> Expr {
        self.into()
    }
}

/// Values that become a literal of any kind.
pub trait IntoLiteral {
    fn into_literal(self) -> Literal;
}

/// Values that become a number literal.
pub trait IntoNumber {
    fn into_number(self) -> Literal;
}

/// Values usable as a subscript: numbers and strings.
pub trait IntoSubscript {
    fn into_subscript(self) -> Literal;
}

fn literal(kind: TokenKind, text: String) -> Literal {
    Literal {
        token: Token::synthetic(kind, text.clone()),
        kind: LiteralKind::of(kind).unwrap_or(LiteralKind::Number),
        text,
    }
}

macro_rules! number_literals {
    ($($ty:ty),*) => {
        $(
            impl IntoNumber for $ty {
                fn into_number(self) -> Literal {
                    literal(TokenKind::Number, self.to_string())
                }
            }

            impl IntoLiteral for $ty {
                fn into_literal(self) -> Literal {
                    self.into_number()
                }
            }

            impl IntoSubscript for $ty {
                fn into_subscript(self) -> Literal {
                    self.into_number()
                }
            }
        )*
    };
}

number_literals!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

impl IntoLiteral for bool {
    fn into_literal(self) -> Literal {
        boolean(self)
    }
}

impl IntoLiteral for &str {
    fn into_literal(self) -> Literal {
        string(self)
    }
}

impl IntoLiteral for String {
    fn into_literal(self) -> Literal {
        string(&self)
    }
}

impl IntoLiteral for Literal {
    fn into_literal(self) -> Literal {
        self
    }
}

impl IntoSubscript for &str {
    fn into_subscript(self) -> Literal {
        string(self)
    }
}

impl IntoSubscript for String {
    fn into_subscript(self) -> Literal {
        string(&self)
    }
}

pub fn ident(name: &str) -> Ident {
    Ident::new(Token::synthetic(TokenKind::Ident, name))
}

pub fn number(value: impl IntoNumber) -> Literal {
    value.into_number()
}

pub fn string(value: &str) -> Literal {
    literal(TokenKind::String, value.to_string())
}

pub fn boolean(value: bool) -> Literal {
    if value {
        literal(TokenKind::True, "true".to_string())
    } else {
        literal(TokenKind::False, "false".to_string())
    }
}

/// Build a list literal. The item type fixes the element kind.
pub fn list<T: IntoLiteral>(items: impl IntoIterator<Item = T>) -> ListLiteral {
    ListLiteral {
        lparen: Token::operator(TokenKind::LParen),
        rparen: Token::operator(TokenKind::RParen),
        elements: items.into_iter().map(IntoLiteral::into_literal).collect(),
    }
}

pub fn index(left: impl IntoLeft, key: impl IntoSubscript) -> IndexExpr {
    IndexExpr {
        left: Box::new(left.into_left()),
        lbracket: Token::operator(TokenKind::LBracket),
        index: key.into_subscript(),
        rbracket: Token::operator(TokenKind::RBracket),
    }
}

fn binary(left: Expr, op: TokenKind, right: Expr) -> BinaryExpr {
    BinaryExpr {
        left: Box::new(left),
        op: Token::operator(op),
        right: Box::new(right),
    }
}

pub fn eq(left: impl IntoLeft, right: impl IntoLiteral) -> BinaryExpr {
    binary(left.into_left(), TokenKind::Eq, right.into_literal().into())
}

pub fn ne(left: impl IntoLeft, right: impl IntoLiteral) -> BinaryExpr {
    binary(left.into_left(), TokenKind::NotEq, right.into_literal().into())
}

pub fn lt(left: impl IntoLeft, right: impl IntoNumber) -> BinaryExpr {
    binary(left.into_left(), TokenKind::Lt, right.into_number().into())
}

pub fn lte(left: impl IntoLeft, right: impl IntoNumber) -> BinaryExpr {
    binary(left.into_left(), TokenKind::LtEq, right.into_number().into())
}

pub fn gt(left: impl IntoLeft, right: impl IntoNumber) -> BinaryExpr {
    binary(left.into_left(), TokenKind::Gt, right.into_number().into())
}

pub fn gte(left: impl IntoLeft, right: impl IntoNumber) -> BinaryExpr {
    binary(left.into_left(), TokenKind::GtEq, right.into_number().into())
}

pub fn like(left: impl IntoLeft, pattern: &str) -> BinaryExpr {
    binary(left.into_left(), TokenKind::Like, string(pattern).into())
}

pub fn in_list<T: IntoLiteral>(left: impl IntoLeft, items: impl IntoIterator<Item = T>) -> BinaryExpr {
    binary(left.into_left(), TokenKind::In, list(items).into())
}

pub fn and(left: impl Into<ComputedExpr>, right: impl Into<ComputedExpr>) -> BinaryExpr {
    binary(
        Expr::from(left.into()),
        TokenKind::And,
        Expr::from(right.into()),
    )
}

pub fn or(left: impl Into<ComputedExpr>, right: impl Into<ComputedExpr>) -> BinaryExpr {
    binary(
        Expr::from(left.into()),
        TokenKind::Or,
        Expr::from(right.into()),
    )
}

pub fn not(operand: impl Into<ComputedExpr>) -> UnaryExpr {
    UnaryExpr {
        op: Token::operator(TokenKind::Not),
        right: Box::new(Expr::from(operand.into())),
    }
}
