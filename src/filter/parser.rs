//! Pratt parser for filter expressions.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr    := expr "or" expr | expr "and" expr | "not" expr | compare
//! compare := operand ( ("==" | "!=" | "<" | "<=" | ">" | ">=" | "like" | "in") operand )?
//! operand := ident | literal | operand "[" (number | string) "]"
//!          | "(" expr ")" | list
//! list    := "(" literal "," literal ("," literal)* ")"
//! ```
//!
//! A parenthesis holding a single expression is a group, so a list needs at
//! least two elements in source text. The parser checks shape only; operand
//! kinds are left to the analyzer.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::ast::{BinaryExpr, Expr, Ident, IndexExpr, ListLiteral, Literal, LiteralKind, UnaryExpr};
use super::lexer::{lex_error, Lexer};
use super::token::{Precedence, Token, TokenKind};
use crate::error::FilterError;

type PrefixFn = fn(&mut Parser) -> Result<Expr, FilterError>;
type InfixFn = fn(&mut Parser, Expr) -> Result<Expr, FilterError>;

static PREFIX: Lazy<HashMap<TokenKind, PrefixFn>> = Lazy::new(|| {
    let mut table: HashMap<TokenKind, PrefixFn> = HashMap::new();
    table.insert(TokenKind::Ident, Parser::parse_ident);
    for kind in [TokenKind::Number, TokenKind::String, TokenKind::True, TokenKind::False] {
        table.insert(kind, Parser::parse_literal);
    }
    table.insert(TokenKind::Not, Parser::parse_not);
    table.insert(TokenKind::LParen, Parser::parse_paren);
    table
});

static INFIX: Lazy<HashMap<TokenKind, InfixFn>> = Lazy::new(|| {
    let mut table: HashMap<TokenKind, InfixFn> = HashMap::new();
    for kind in [
        TokenKind::Or,
        TokenKind::And,
        TokenKind::Eq,
        TokenKind::NotEq,
        TokenKind::Lt,
        TokenKind::LtEq,
        TokenKind::Gt,
        TokenKind::GtEq,
        TokenKind::Like,
        TokenKind::In,
    ] {
        table.insert(kind, Parser::parse_binary);
    }
    table.insert(TokenKind::LBracket, Parser::parse_index);
    table
});

#[derive(Debug)]
pub struct Parser {
    lexer: Lexer,
    current: Token,
}

impl Parser {
    /// Fails if the very first token is a lexical error.
    pub fn new(source: &str) -> Result<Self, FilterError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.scan();
        if let Some(err) = lex_error(&current) {
            return Err(err);
        }
        Ok(Self { lexer, current })
    }

    /// Parse one complete expression; the input must end after it.
    pub fn parse(&mut self) -> Result<Expr, FilterError> {
        let expr = self.parse_expr(Precedence::Lowest)?;
        if !self.current.is_eof() {
            return Err(FilterError::TrailingTokens {
                found: self.current.describe(),
                pos: self.current.start,
            });
        }
        Ok(expr)
    }

    /// Consume the current token and scan the next one.
    fn bump(&mut self) -> Result<Token, FilterError> {
        let next = self.lexer.scan();
        if let Some(err) = lex_error(&next) {
            return Err(err);
        }
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, FilterError> {
        if self.current.kind != kind {
            return Err(self.unexpected(expected));
        }
        self.bump()
    }

    fn unexpected(&self, expected: &str) -> FilterError {
        FilterError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current.describe(),
            pos: self.current.start,
        }
    }

    fn parse_expr(&mut self, min: Precedence) -> Result<Expr, FilterError> {
        let prefix = PREFIX.get(&self.current.kind).copied().ok_or_else(|| {
            FilterError::ExpectedPrimary {
                found: self.current.describe(),
                pos: self.current.start,
            }
        })?;
        let mut left = prefix(self)?;

        while self.current.kind.precedence() > min {
            let Some(infix) = INFIX.get(&self.current.kind).copied() else {
                break;
            };
            left = infix(self, left)?;
        }
        Ok(left)
    }

    fn parse_ident(&mut self) -> Result<Expr, FilterError> {
        Ok(Ident::new(self.bump()?).into())
    }

    fn parse_literal(&mut self) -> Result<Expr, FilterError> {
        let literal = self.literal_element("literal")?;
        Ok(literal.into())
    }

    fn literal_element(&mut self, expected: &str) -> Result<Literal, FilterError> {
        if !self.current.kind.is_literal() {
            return Err(self.unexpected(expected));
        }
        let token = self.bump()?;
        Literal::from_token(token).ok_or_else(|| self.unexpected(expected))
    }

    fn parse_not(&mut self) -> Result<Expr, FilterError> {
        let op = self.bump()?;
        let right = self.parse_expr(Precedence::Not)?;
        if !right.is_computed() {
            return Err(FilterError::InvalidOperand {
                op: "not".to_string(),
                message: "operand must be a comparison or logical expression".to_string(),
                pos: Some(right.position()),
            });
        }
        Ok(UnaryExpr {
            op,
            right: Box::new(right),
        }
        .into())
    }

    /// `(` starts either a group or a list literal.
    fn parse_paren(&mut self) -> Result<Expr, FilterError> {
        let lparen = self.bump()?;
        if self.current.kind == TokenKind::RParen {
            return Err(FilterError::EmptyParens { pos: lparen.start });
        }

        let inner = self.parse_expr(Precedence::Lowest)?;
        if self.current.kind == TokenKind::Comma {
            let first = match inner {
                Expr::Literal(literal) => literal,
                other => {
                    return Err(FilterError::HeterogeneousList {
                        expected: "literal".to_string(),
                        found: "expression".to_string(),
                        pos: other.position(),
                    })
                }
            };
            return self.finish_list(lparen, first).map(Expr::from);
        }

        self.expect(TokenKind::RParen, "')'")?;
        Ok(inner)
    }

    fn finish_list(&mut self, lparen: Token, first: Literal) -> Result<ListLiteral, FilterError> {
        let kind = first.kind;
        let mut elements = vec![first];

        while self.current.kind == TokenKind::Comma {
            let comma = self.bump()?;
            if self.current.kind == TokenKind::RParen {
                return Err(FilterError::TrailingComma { pos: comma.start });
            }
            let element = self.literal_element("literal")?;
            check_list_kind(kind, &element)?;
            elements.push(element);
        }

        let rparen = self.expect(TokenKind::RParen, "',' or ')'")?;
        Ok(ListLiteral {
            lparen,
            rparen,
            elements,
        })
    }

    fn parse_binary(&mut self, left: Expr) -> Result<Expr, FilterError> {
        let op = self.bump()?;
        let right = self.parse_expr(op.kind.precedence())?;
        Ok(BinaryExpr {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
        .into())
    }

    fn parse_index(&mut self, left: Expr) -> Result<Expr, FilterError> {
        let lbracket = self.bump()?;
        if matches!(self.current.kind, TokenKind::True | TokenKind::False) {
            return Err(FilterError::BooleanIndex {
                pos: self.current.start,
            });
        }
        if !matches!(self.current.kind, TokenKind::Number | TokenKind::String) {
            return Err(self.unexpected("number or string subscript"));
        }
        let index = self.literal_element("number or string subscript")?;
        let rbracket = self.expect(TokenKind::RBracket, "']'")?;
        Ok(IndexExpr {
            left: Box::new(left),
            lbracket,
            index,
            rbracket,
        }
        .into())
    }
}

fn check_list_kind(kind: LiteralKind, element: &Literal) -> Result<(), FilterError> {
    if element.kind != kind {
        return Err(FilterError::HeterogeneousList {
            expected: kind.name().to_string(),
            found: element.kind.name().to_string(),
            pos: element.token.start,
        });
    }
    Ok(())
}

/// Parse filter source into a syntax tree without semantic checks.
pub fn parse(source: &str) -> Result<Expr, FilterError> {
    Parser::new(source)?.parse()
}
