//! Tree walking.
//!
//! Implement the `visit_*` hooks you care about; the defaults recurse with
//! the `walk_*` functions.

use super::ast::{BinaryExpr, Expr, Ident, IndexExpr, ListLiteral, Literal, UnaryExpr};

pub trait Visitor {
    type Error;

    fn visit_expr(&mut self, expr: &Expr) -> Result<(), Self::Error> {
        walk_expr(self, expr)
    }

    fn visit_ident(&mut self, _ident: &Ident) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_literal(&mut self, _literal: &Literal) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_list(&mut self, list: &ListLiteral) -> Result<(), Self::Error> {
        walk_list(self, list)
    }

    fn visit_index(&mut self, index: &IndexExpr) -> Result<(), Self::Error> {
        walk_index(self, index)
    }

    fn visit_binary(&mut self, binary: &BinaryExpr) -> Result<(), Self::Error> {
        walk_binary(self, binary)
    }

    fn visit_unary(&mut self, unary: &UnaryExpr) -> Result<(), Self::Error> {
        walk_unary(self, unary)
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) -> Result<(), V::Error> {
    match expr {
        Expr::Ident(ident) => visitor.visit_ident(ident),
        Expr::Literal(literal) => visitor.visit_literal(literal),
        Expr::List(list) => visitor.visit_list(list),
        Expr::Index(index) => visitor.visit_index(index),
        Expr::Binary(binary) => visitor.visit_binary(binary),
        Expr::Unary(unary) => visitor.visit_unary(unary),
    }
}

pub fn walk_list<V: Visitor + ?Sized>(visitor: &mut V, list: &ListLiteral) -> Result<(), V::Error> {
    for element in &list.elements {
        visitor.visit_literal(element)?;
    }
    Ok(())
}

pub fn walk_index<V: Visitor + ?Sized>(visitor: &mut V, index: &IndexExpr) -> Result<(), V::Error> {
    visitor.visit_expr(&index.left)?;
    visitor.visit_literal(&index.index)
}

pub fn walk_binary<V: Visitor + ?Sized>(visitor: &mut V, binary: &BinaryExpr) -> Result<(), V::Error> {
    visitor.visit_expr(&binary.left)?;
    visitor.visit_expr(&binary.right)
}

pub fn walk_unary<V: Visitor + ?Sized>(visitor: &mut V, unary: &UnaryExpr) -> Result<(), V::Error> {
    visitor.visit_expr(&unary.right)
}

#[derive(Default)]
struct FieldCollector {
    fields: Vec<String>,
}

impl Visitor for FieldCollector {
    type Error = std::convert::Infallible;

    fn visit_ident(&mut self, ident: &Ident) -> Result<(), Self::Error> {
        if !self.fields.contains(&ident.name) {
            self.fields.push(ident.name.clone());
        }
        Ok(())
    }
}

/// Field names referenced by `expr`, in first-use order without repeats.
/// Subscripted fields report their base name.
pub fn collect_fields(expr: &Expr) -> Vec<String> {
    let mut collector = FieldCollector::default();
    match collector.visit_expr(expr) {
        Ok(()) => collector.fields,
        Err(never) => match never {},
    }
}
