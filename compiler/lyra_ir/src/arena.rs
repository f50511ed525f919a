//! Flat expression arena.

use crate::{Expr, ExprId, ExprKind, Span};

/// Append-only arena holding every expression of a session.
///
/// Expressions are never removed; the redshift pass allocates rewritten nodes
/// alongside the originals and function bodies simply point at new roots.
#[derive(Default)]
pub struct ExprArena {
    exprs: Vec<Expr>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new expression, returning its id.
    ///
    /// # Panics
    /// Panics if the arena holds more than `u32::MAX` expressions.
    pub fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let Ok(index) = u32::try_from(self.exprs.len()) else {
            panic!("expression arena exceeded capacity");
        };
        self.exprs.push(Expr::new(kind, span));
        ExprId::new(index)
    }

    /// Fetch an expression by id.
    ///
    /// # Panics
    /// Panics if `id` was not allocated by this arena.
    pub fn get(&self, id: ExprId) -> &Expr {
        match self.exprs.get(id.index()) {
            Some(expr) => expr,
            None => panic!("{id:?} not found in arena"),
        }
    }

    /// Shorthand for `get(id).kind`.
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.get(id).kind
    }

    /// Shorthand for `get(id).span`.
    pub fn span(&self, id: ExprId) -> Span {
        self.get(id).span
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Literal;
    use pretty_assertions::assert_eq;

    #[test]
    fn alloc_and_get() {
        let mut arena = ExprArena::new();
        let span = Span::new(1, 3);
        let id = arena.alloc(ExprKind::Literal(Literal::I32(7)), span);
        assert_eq!(arena.kind(id), &ExprKind::Literal(Literal::I32(7)));
        assert_eq!(arena.span(id), span);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn ids_are_sequential() {
        let mut arena = ExprArena::new();
        let a = arena.alloc(ExprKind::Literal(Literal::Void), Span::DUMMY);
        let b = arena.alloc(ExprKind::Literal(Literal::Bool(true)), Span::DUMMY);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
    }
}
