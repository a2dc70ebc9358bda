//! Filter expression compiler.
//!
//! Source text goes through the [`lexer`], the Pratt [`parser`] and the
//! [`analyzer`]. Trees can also be built with the [`constructors`] or the
//! fluent [`FilterBuilder`]; both produce the same [`Expr`] type.
//!
//! ```
//! let expr = sift::filter::compile("name == 'John' and age > 18").unwrap();
//! assert_eq!(sift::filter::collect_fields(&expr), vec!["name", "age"]);
//! ```

pub mod analyzer;
pub mod ast;
pub mod builder;
pub mod constructors;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod visit;

pub use analyzer::{analyze, Analyzer};
pub use ast::{
    BinaryExpr, ComputedExpr, Expr, Ident, IndexExpr, ListLiteral, Literal, LiteralKind, UnaryExpr,
};
pub use builder::FilterBuilder;
pub use lexer::{Lexer, Tokens};
pub use parser::{parse, Parser};
pub use token::{Position, Precedence, Token, TokenKind};
pub use visit::{collect_fields, Visitor};

use crate::error::FilterError;

/// Parse and analyze filter source.
pub fn compile(source: &str) -> Result<Expr, FilterError> {
    let expr = parse(source)?;
    analyze(Some(&expr))?;
    tracing::trace!(filter = %expr, "compiled filter");
    Ok(expr)
}
