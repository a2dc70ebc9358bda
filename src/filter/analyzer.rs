//! Semantic checks over a parsed or built filter.

use super::ast::{BinaryExpr, Expr, Ident, IndexExpr, ListLiteral, Literal, LiteralKind, UnaryExpr};
use super::token::{Position, TokenKind};
use super::visit::{walk_binary, walk_index, walk_list, walk_unary, Visitor};
use crate::error::FilterError;

fn known(pos: Position) -> Option<Position> {
    pos.is_known().then_some(pos)
}

fn invalid(op: &str, message: &str, pos: Position) -> FilterError {
    FilterError::InvalidOperand {
        op: op.to_string(),
        message: message.to_string(),
        pos: known(pos),
    }
}

fn mismatch(op: &str, expected: &str, actual: LiteralKind, pos: Position) -> FilterError {
    FilterError::TypeMismatch {
        op: op.to_string(),
        expected: expected.to_string(),
        actual: actual.name().to_string(),
        pos: known(pos),
    }
}

/// A letter, then letters, digits or `_`, and not a keyword.
fn is_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(char::is_alphabetic)
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && TokenKind::keyword(&name.to_lowercase()).is_none()
}

/// `-`? digits, then optionally `.` and digits.
fn is_number_text(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && fraction.map_or(true, digits)
}

/// Checks operand shapes and literal kinds. Stops at the first problem.
///
/// Names and numbers in trees built in code are held to the same rules as
/// source text, so every accepted tree prints as filter text that parses
/// back.
#[derive(Debug, Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }

    /// Validate a filter root, which must be present and boolean-valued.
    pub fn check(&mut self, root: Option<&Expr>) -> Result<(), FilterError> {
        let root = root.ok_or(FilterError::NilRoot)?;
        if !root.is_computed() {
            return Err(invalid(
                "filter",
                "must be a comparison or logical expression",
                root.position(),
            ));
        }
        self.visit_expr(root)
    }

    fn field<'e>(&self, op: &str, expr: &'e Expr) -> Result<&'e Expr, FilterError> {
        match expr {
            Expr::Ident(_) | Expr::Index(_) => Ok(expr),
            other => Err(invalid(op, "left side must be a field", other.position())),
        }
    }

    fn literal<'e>(&self, op: &str, expr: &'e Expr) -> Result<&'e Literal, FilterError> {
        match expr {
            Expr::Literal(literal) => Ok(literal),
            other => Err(invalid(op, "right side must be a literal value", other.position())),
        }
    }

    fn computed(&self, op: &str, expr: &Expr) -> Result<(), FilterError> {
        if expr.is_computed() {
            Ok(())
        } else {
            Err(invalid(
                op,
                "operand must be a comparison or logical expression",
                expr.position(),
            ))
        }
    }
}

impl Visitor for Analyzer {
    type Error = FilterError;

    fn visit_binary(&mut self, binary: &BinaryExpr) -> Result<(), FilterError> {
        let kind = binary.op.kind;
        let op = kind.as_str();

        match kind {
            TokenKind::And | TokenKind::Or => {
                self.computed(op, &binary.left)?;
                self.computed(op, &binary.right)?;
            }
            TokenKind::Eq | TokenKind::NotEq => {
                self.field(op, &binary.left)?;
                self.literal(op, &binary.right)?;
            }
            k if k.is_ordering() => {
                self.field(op, &binary.left)?;
                let literal = self.literal(op, &binary.right)?;
                if literal.kind != LiteralKind::Number {
                    return Err(mismatch(op, "number", literal.kind, literal.token.start));
                }
            }
            TokenKind::Like => {
                self.field(op, &binary.left)?;
                let literal = self.literal(op, &binary.right)?;
                if literal.kind != LiteralKind::String {
                    return Err(mismatch(op, "string", literal.kind, literal.token.start));
                }
            }
            TokenKind::In => {
                self.field(op, &binary.left)?;
                if !matches!(*binary.right, Expr::List(_)) {
                    return Err(invalid(op, "right side must be a list", binary.right.position()));
                }
            }
            _ => return Err(invalid(op, "not a binary operator", binary.op.start)),
        }

        walk_binary(self, binary)
    }

    fn visit_unary(&mut self, unary: &UnaryExpr) -> Result<(), FilterError> {
        if unary.op.kind != TokenKind::Not {
            return Err(invalid(unary.op.kind.as_str(), "not a unary operator", unary.op.start));
        }
        self.computed("not", &unary.right)?;
        walk_unary(self, unary)
    }

    fn visit_index(&mut self, index: &IndexExpr) -> Result<(), FilterError> {
        if index.index.kind == LiteralKind::Bool {
            return Err(mismatch(
                "[]",
                "number or string",
                index.index.kind,
                index.index.token.start,
            ));
        }
        if !matches!(*index.left, Expr::Ident(_) | Expr::Index(_)) {
            return Err(invalid("[]", "only fields can be subscripted", index.left.position()));
        }
        walk_index(self, index)
    }

    fn visit_ident(&mut self, ident: &Ident) -> Result<(), FilterError> {
        if !is_field_name(&ident.name) {
            return Err(invalid(
                "field",
                &format!("'{}' is not a valid field name", ident.name),
                ident.token.start,
            ));
        }
        Ok(())
    }

    fn visit_literal(&mut self, literal: &Literal) -> Result<(), FilterError> {
        let valid = match literal.kind {
            LiteralKind::Number => is_number_text(&literal.text),
            LiteralKind::Bool => matches!(literal.text.as_str(), "true" | "false"),
            LiteralKind::String => true,
        };
        if !valid {
            return Err(invalid(
                "literal",
                &format!("'{}' is not a valid {}", literal.text, literal.kind.name()),
                literal.token.start,
            ));
        }
        Ok(())
    }

    fn visit_list(&mut self, list: &ListLiteral) -> Result<(), FilterError> {
        let Some(first) = list.elements.first() else {
            return Err(invalid("in", "list must not be empty", list.lparen.start));
        };
        for element in &list.elements[1..] {
            if element.kind != first.kind {
                return Err(mismatch("in", first.kind.name(), element.kind, element.token.start));
            }
        }
        walk_list(self, list)
    }
}

/// Validate a filter root.
pub fn analyze(root: Option<&Expr>) -> Result<(), FilterError> {
    Analyzer::new().check(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parse;
    use crate::filter::token::Token;

    fn check(source: &str) -> Result<(), FilterError> {
        analyze(Some(&parse(source).unwrap()))
    }

    #[test]
    fn test_valid_filters() {
        for source in [
            "name == 'John' and age > 18",
            "a != true",
            "price <= 9.5 or price >= 100",
            "name like 'J%'",
            "tags[0] in ('a', 'b')",
            "m['k'][1] == 2",
            "not (a == 1 or b == 2)",
        ] {
            assert_eq!(check(source), Ok(()), "{}", source);
        }
    }

    #[test]
    fn test_ordering_needs_number() {
        assert_eq!(
            check("age > 'x'"),
            Err(FilterError::TypeMismatch {
                op: ">".to_string(),
                expected: "number".to_string(),
                actual: "string".to_string(),
                pos: Some(Position::new(1, 7)),
            })
        );
    }

    #[test]
    fn test_like_needs_string() {
        assert!(matches!(
            check("name like 5"),
            Err(FilterError::TypeMismatch { ref expected, .. }) if expected == "string"
        ));
    }

    #[test]
    fn test_comparison_shapes() {
        assert!(matches!(check("1 == 1"), Err(FilterError::InvalidOperand { .. })));
        assert!(matches!(check("a == b"), Err(FilterError::InvalidOperand { .. })));
        assert!(matches!(check("(a == 1) == 2"), Err(FilterError::InvalidOperand { .. })));
    }

    #[test]
    fn test_in_needs_list() {
        assert!(matches!(
            check("a in 5"),
            Err(FilterError::InvalidOperand { ref op, .. }) if op == "in"
        ));
        assert!(matches!(
            check("a in (a == 1)"),
            Err(FilterError::InvalidOperand { ref op, .. }) if op == "in"
        ));
    }

    #[test]
    fn test_parenthesised_single_value_is_not_a_list() {
        assert_eq!(
            check("x in (1)"),
            Err(FilterError::InvalidOperand {
                op: "in".to_string(),
                message: "right side must be a list".to_string(),
                pos: Some(Position::new(1, 7)),
            })
        );
    }

    #[test]
    fn test_built_names_and_numbers_follow_source_rules() {
        use crate::filter::constructors::{eq, gt, in_list};

        for expr in [
            Expr::from(eq("first name", 1)),
            Expr::from(eq("and", 1)),
            Expr::from(eq("1st", 1)),
            Expr::from(eq("", 1)),
            Expr::from(gt("score", f64::NAN)),
            Expr::from(gt("score", f64::INFINITY)),
            Expr::from(in_list("score", [1.5, f64::NEG_INFINITY])),
        ] {
            assert!(
                matches!(analyze(Some(&expr)), Err(FilterError::InvalidOperand { pos: None, .. })),
                "{}",
                expr
            );
        }

        assert_eq!(analyze(Some(&Expr::from(eq("größe_2", -0.25)))), Ok(()));
        assert_eq!(analyze(Some(&Expr::from(gt("Andy", 1e21)))), Ok(()));
    }

    #[test]
    fn test_logical_operands_must_be_computed() {
        assert_eq!(
            check("a == 1 and b"),
            Err(FilterError::InvalidOperand {
                op: "and".to_string(),
                message: "operand must be a comparison or logical expression".to_string(),
                pos: Some(Position::new(1, 12)),
            })
        );
    }

    #[test]
    fn test_root_must_be_computed() {
        assert!(matches!(check("a"), Err(FilterError::InvalidOperand { .. })));
        assert!(matches!(check("(1, 2)"), Err(FilterError::InvalidOperand { .. })));
    }

    #[test]
    fn test_nil_root() {
        assert_eq!(analyze(None), Err(FilterError::NilRoot));
    }

    #[test]
    fn test_list_rechecked_for_built_trees() {
        let list = ListLiteral {
            lparen: Token::operator(TokenKind::LParen),
            rparen: Token::operator(TokenKind::RParen),
            elements: vec![
                Literal::from_token(Token::synthetic(TokenKind::Number, "1")).unwrap(),
                Literal::from_token(Token::synthetic(TokenKind::String, "a")).unwrap(),
            ],
        };
        let expr = Expr::Binary(BinaryExpr {
            left: Box::new(crate::filter::ast::Ident::new(Token::synthetic(TokenKind::Ident, "x")).into()),
            op: Token::operator(TokenKind::In),
            right: Box::new(list.into()),
        });
        assert_eq!(
            analyze(Some(&expr)),
            Err(FilterError::TypeMismatch {
                op: "in".to_string(),
                expected: "number".to_string(),
                actual: "string".to_string(),
                pos: None,
            })
        );
    }

    #[test]
    fn test_empty_built_list() {
        let expr = Expr::Binary(BinaryExpr {
            left: Box::new(crate::filter::ast::Ident::new(Token::synthetic(TokenKind::Ident, "x")).into()),
            op: Token::operator(TokenKind::In),
            right: Box::new(
                ListLiteral {
                    lparen: Token::operator(TokenKind::LParen),
                    rparen: Token::operator(TokenKind::RParen),
                    elements: Vec::new(),
                }
                .into(),
            ),
        });
        assert!(matches!(
            analyze(Some(&expr)),
            Err(FilterError::InvalidOperand { pos: None, .. })
        ));
    }

    #[test]
    fn test_operator_token_misuse_in_built_tree() {
        let expr = Expr::Unary(UnaryExpr {
            op: Token::operator(TokenKind::Comma),
            right: Box::new(parse("a == 1").unwrap()),
        });
        assert!(matches!(analyze(Some(&expr)), Err(FilterError::InvalidOperand { .. })));
    }
}
