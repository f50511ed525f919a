//! Function signatures.

use lyra_ir::{Name, TypeId};
use std::fmt;

/// Evaluation color of a function.
///
/// Blue functions are pure compile-time functions: their calls are memoized
/// and can be folded away by the redshift pass. Red functions execute at
/// runtime.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Color {
    Blue,
    Red,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Blue => write!(f, "blue"),
            Color::Red => write!(f, "red"),
        }
    }
}

/// Calling discipline of a function.
///
/// Plain functions are called directly. Generic functions must be
/// instantiated before they can be called.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FuncKind {
    Plain,
    Generic,
}

/// A named, typed parameter.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Param {
    pub name: Name,
    pub ty: TypeId,
}

impl Param {
    #[inline]
    pub const fn new(name: Name, ty: TypeId) -> Self {
        Param { name, ty }
    }
}

/// A function signature.
///
/// `variadic` carries the element type of an open-ended argument tail; the
/// builtin call fallbacks use it since their operand count is unbounded.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct FuncSig {
    pub params: Vec<Param>,
    pub ret: TypeId,
    pub color: Color,
    pub kind: FuncKind,
    pub variadic: Option<TypeId>,
}

impl FuncSig {
    /// A red (runtime) plain function signature.
    pub fn red(params: Vec<Param>, ret: TypeId) -> Self {
        FuncSig {
            params,
            ret,
            color: Color::Red,
            kind: FuncKind::Plain,
            variadic: None,
        }
    }

    /// A blue (compile-time) plain function signature.
    pub fn blue(params: Vec<Param>, ret: TypeId) -> Self {
        FuncSig {
            params,
            ret,
            color: Color::Blue,
            kind: FuncKind::Plain,
            variadic: None,
        }
    }

    /// Mark the signature as accepting a variadic tail of `elem` values.
    #[must_use]
    pub fn with_variadic(mut self, elem: TypeId) -> Self {
        self.variadic = Some(elem);
        self
    }

    /// Mark the signature as generic.
    #[must_use]
    pub fn generic(mut self) -> Self {
        self.kind = FuncKind::Generic;
        self
    }

    /// Number of fixed parameters.
    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_blue(&self) -> bool {
        self.color == Color::Blue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders() {
        let sig = FuncSig::red(vec![Param::new(Name::EMPTY, TypeId::new(1))], TypeId::new(2));
        assert_eq!(sig.color, Color::Red);
        assert_eq!(sig.kind, FuncKind::Plain);
        assert_eq!(sig.arity(), 1);
        assert!(sig.variadic.is_none());

        let sig = FuncSig::blue(vec![], TypeId::new(0))
            .with_variadic(TypeId::new(3))
            .generic();
        assert!(sig.is_blue());
        assert_eq!(sig.kind, FuncKind::Generic);
        assert_eq!(sig.variadic, Some(TypeId::new(3)));
    }
}
