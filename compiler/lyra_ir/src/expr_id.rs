//! Expression IDs for the flat AST.

use std::fmt;

/// Index into an expression arena.
///
/// 4 bytes instead of a `Box<Expr>`; equality is an O(1) integer compare and
/// the arena keeps expressions contiguous.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    /// Create a new `ExprId`.
    #[inline]
    pub const fn new(index: u32) -> Self {
        ExprId(index)
    }

    /// Index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

/// Index into the session's type registry.
///
/// Lives here rather than in the type crate so the IR can reference types
/// without a dependency cycle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        TypeId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expr_id_roundtrip() {
        let id = ExprId::new(42);
        assert_eq!(id.index(), 42);
        assert_eq!(id.raw(), 42);
    }

    #[test]
    fn memory_size() {
        assert_eq!(std::mem::size_of::<ExprId>(), 4);
        assert_eq!(std::mem::size_of::<TypeId>(), 4);
    }
}
