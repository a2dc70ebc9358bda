//! Filter syntax tree.
//!
//! Node equality ignores source positions, so a parsed tree compares equal
//! to the same tree built in code. `Display` renders canonical source that
//! parses back to an equal tree.

use std::fmt;

use super::token::{Position, Precedence, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Number,
    String,
    Bool,
}

impl LiteralKind {
    pub fn name(self) -> &'static str {
        match self {
            LiteralKind::Number => "number",
            LiteralKind::String => "string",
            LiteralKind::Bool => "bool",
        }
    }

    pub fn of(kind: TokenKind) -> Option<LiteralKind> {
        match kind {
            TokenKind::Number => Some(LiteralKind::Number),
            TokenKind::String => Some(LiteralKind::String),
            TokenKind::True | TokenKind::False => Some(LiteralKind::Bool),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ident {
    pub token: Token,
    pub name: String,
}

/// A scalar value. `text` holds the number digits, the unescaped string
/// or `true` / `false`.
#[derive(Debug, Clone)]
pub struct Literal {
    pub token: Token,
    pub kind: LiteralKind,
    pub text: String,
}

/// A parenthesised, comma separated list of literals: `(1, 2, 3)`.
#[derive(Debug, Clone)]
pub struct ListLiteral {
    pub lparen: Token,
    pub rparen: Token,
    pub elements: Vec<Literal>,
}

/// `left[index]`
#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub left: Box<Expr>,
    pub lbracket: Token,
    pub index: Literal,
    pub rbracket: Token,
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub op: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(Ident),
    Literal(Literal),
    List(ListLiteral),
    Index(IndexExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
}

/// An expression that yields a boolean: the only valid filter root and
/// the only valid operand of `and`, `or` and `not`.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputedExpr {
    Binary(BinaryExpr),
    Unary(UnaryExpr),
}

impl Ident {
    pub fn new(token: Token) -> Self {
        let name = token.literal.clone();
        Self { token, name }
    }
}

impl Literal {
    /// Build from a literal token. Returns `None` for any other kind.
    pub fn from_token(token: Token) -> Option<Self> {
        let kind = LiteralKind::of(token.kind)?;
        let text = token.literal.clone();
        Some(Self { token, kind, text })
    }
}

impl Expr {
    /// True for the boolean-valued forms.
    pub fn is_computed(&self) -> bool {
        matches!(self, Expr::Binary(_) | Expr::Unary(_))
    }

    /// Start of the leftmost token.
    pub fn position(&self) -> Position {
        match self {
            Expr::Ident(ident) => ident.token.start,
            Expr::Literal(lit) => lit.token.start,
            Expr::List(list) => list.lparen.start,
            Expr::Index(index) => index.left.position(),
            Expr::Binary(binary) => binary.left.position(),
            Expr::Unary(unary) => unary.op.start,
        }
    }

    fn precedence(&self) -> Precedence {
        match self {
            Expr::Binary(binary) => binary.op.kind.precedence(),
            Expr::Unary(_) => Precedence::Not,
            _ => Precedence::Index,
        }
    }

    pub fn as_computed(&self) -> Option<ComputedExpr> {
        ComputedExpr::try_from(self.clone()).ok()
    }
}

impl TryFrom<Expr> for ComputedExpr {
    type Error = Expr;

    fn try_from(expr: Expr) -> Result<Self, Expr> {
        match expr {
            Expr::Binary(binary) => Ok(ComputedExpr::Binary(binary)),
            Expr::Unary(unary) => Ok(ComputedExpr::Unary(unary)),
            other => Err(other),
        }
    }
}

impl From<ComputedExpr> for Expr {
    fn from(expr: ComputedExpr) -> Self {
        match expr {
            ComputedExpr::Binary(binary) => Expr::Binary(binary),
            ComputedExpr::Unary(unary) => Expr::Unary(unary),
        }
    }
}

impl From<BinaryExpr> for ComputedExpr {
    fn from(expr: BinaryExpr) -> Self {
        ComputedExpr::Binary(expr)
    }
}

impl From<UnaryExpr> for ComputedExpr {
    fn from(expr: UnaryExpr) -> Self {
        ComputedExpr::Unary(expr)
    }
}

macro_rules! into_expr {
    ($($node:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$node> for Expr {
                fn from(node: $node) -> Self {
                    Expr::$variant(node)
                }
            }
        )*
    };
}

into_expr!(
    Ident => Ident,
    Literal => Literal,
    ListLiteral => List,
    IndexExpr => Index,
    BinaryExpr => Binary,
    UnaryExpr => Unary,
);

// Equality

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.text == other.text
    }
}

impl PartialEq for ListLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl PartialEq for IndexExpr {
    fn eq(&self, other: &Self) -> bool {
        self.left == other.left && self.index == other.index
    }
}

impl PartialEq for BinaryExpr {
    fn eq(&self, other: &Self) -> bool {
        self.op.kind == other.op.kind && self.left == other.left && self.right == other.right
    }
}

impl PartialEq for UnaryExpr {
    fn eq(&self, other: &Self) -> bool {
        self.op.kind == other.op.kind && self.right == other.right
    }
}

// Canonical text

fn write_string(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in value.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("'")
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LiteralKind::String => write_string(f, &self.text),
            LiteralKind::Number | LiteralKind::Bool => f.write_str(&self.text),
        }
    }
}

impl fmt::Display for ListLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", element)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for IndexExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parens = self.left.precedence() < Precedence::Index;
        write_operand(f, &self.left, parens)?;
        write!(f, "[{}]", self.index)
    }
}

impl fmt::Display for BinaryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = self.op.kind.precedence();
        let left = self.left.precedence();
        // Comparisons do not chain, so an equal-precedence left side needs
        // parentheses too.
        let left_parens = left < prec || (left == prec && prec == Precedence::Compare);
        write_operand(f, &self.left, left_parens)?;
        write!(f, " {} ", self.op.kind.as_str())?;
        write_operand(f, &self.right, self.right.precedence() <= prec)
    }
}

impl fmt::Display for UnaryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.op.kind.as_str())?;
        write_operand(f, &self.right, matches!(*self.right, Expr::Binary(_)))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(node) => node.fmt(f),
            Expr::Literal(node) => node.fmt(f),
            Expr::List(node) => node.fmt(f),
            Expr::Index(node) => node.fmt(f),
            Expr::Binary(node) => node.fmt(f),
            Expr::Unary(node) => node.fmt(f),
        }
    }
}

impl fmt::Display for ComputedExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputedExpr::Binary(node) => node.fmt(f),
            ComputedExpr::Unary(node) => node.fmt(f),
        }
    }
}
