//! Tokens of the filter language.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

/// A 1-based line/column location in filter source.
///
/// The default value (0:0) marks tokens built in code rather than scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// False for synthetic positions.
    pub fn is_known(&self) -> bool {
        self.line > 0 && self.column > 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Why the lexer produced an error token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexErrorKind {
    IllegalCharacter,
    UnterminatedString,
    MalformedNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Error(LexErrorKind),

    Ident,
    Number,
    String,
    True,
    False,

    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,

    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    In,
    Like,

    And,
    Or,
    Not,
}

/// Binding power used by the Pratt loop, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Or,
    And,
    Not,
    Compare,
    Index,
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("and", TokenKind::And),
        ("or", TokenKind::Or),
        ("not", TokenKind::Not),
        ("in", TokenKind::In),
        ("like", TokenKind::Like),
        ("true", TokenKind::True),
        ("false", TokenKind::False),
    ])
});

impl TokenKind {
    /// Look up a keyword by its lowercase spelling.
    pub fn keyword(lowercase: &str) -> Option<TokenKind> {
        KEYWORDS.get(lowercase).copied()
    }

    pub fn precedence(self) -> Precedence {
        match self {
            TokenKind::Or => Precedence::Or,
            TokenKind::And => Precedence::And,
            TokenKind::Not => Precedence::Not,
            TokenKind::Eq
            | TokenKind::NotEq
            | TokenKind::Lt
            | TokenKind::LtEq
            | TokenKind::Gt
            | TokenKind::GtEq
            | TokenKind::In
            | TokenKind::Like => Precedence::Compare,
            TokenKind::LBracket => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Number | TokenKind::String | TokenKind::True | TokenKind::False
        )
    }

    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, TokenKind::And | TokenKind::Or)
    }

    /// Canonical source spelling; for value-carrying kinds, a description.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Eof => "end of input",
            TokenKind::Error(_) => "error",
            TokenKind::Ident => "identifier",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::In => "in",
            TokenKind::Like => "like",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scanned token.
///
/// `literal` is the token text: the unescaped contents for strings, the
/// lowercase spelling for keywords, the raw characters for errors.
/// `end` is the position just past the last character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub start: Position,
    pub end: Position,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            kind,
            literal: literal.into(),
            start,
            end,
        }
    }

    /// A token with no source position, for trees built in code.
    pub fn synthetic(kind: TokenKind, literal: impl Into<String>) -> Self {
        Self::new(kind, literal, Position::default(), Position::default())
    }

    /// Operator token whose literal is its canonical spelling.
    pub fn operator(kind: TokenKind) -> Self {
        Self::synthetic(kind, kind.as_str())
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// How the token reads in an error message.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::String => format!("'{}'", self.literal),
            _ => self.literal.clone(),
        }
    }
}
