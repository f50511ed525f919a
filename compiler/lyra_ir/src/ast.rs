//! The expression IR evaluated and rewritten by the runtime.
//!
//! Function bodies are single expressions stored in a flat arena. Every
//! operator position (binary ops, calls, item and attribute access) is
//! dispatched through the session's operator protocol at evaluation time, and
//! is the unit of rewriting for the redshift pass.

use crate::{ExprId, Fqn, Name, Span};

/// A literal constant.
///
/// Floats are stored as raw bits so `Literal` can implement `Eq` and `Hash`
/// and key the memoization tables.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Literal {
    Void,
    Bool(bool),
    I32(i32),
    F64Bits(u64),
    /// Interned string contents.
    Str(Name),
}

impl Literal {
    /// Build a float literal from its numeric value.
    #[inline]
    pub fn f64(value: f64) -> Self {
        Literal::F64Bits(value.to_bits())
    }

    /// Numeric value of a float literal.
    #[inline]
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Literal::F64Bits(bits) => Some(f64::from_bits(bits)),
            _ => None,
        }
    }
}

/// Binary operator tokens as they appear in expressions.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    /// Source-level symbol, used in error messages.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

/// Expression node kinds.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum ExprKind {
    Literal(Literal),
    /// Reference to a global by fully-qualified name.
    Global(Fqn),
    /// Reference to a function parameter.
    Local(Name),
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    CallMethod {
        target: ExprId,
        method: Name,
        args: Vec<ExprId>,
    },
    GetItem {
        target: ExprId,
        index: ExprId,
    },
    SetItem {
        target: ExprId,
        index: ExprId,
        value: ExprId,
    },
    GetAttr {
        target: ExprId,
        attr: Name,
    },
    SetAttr {
        target: ExprId,
        attr: Name,
        value: ExprId,
    },
}

/// An expression with its source location.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    #[inline]
    pub const fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_literal_bits_roundtrip() {
        let lit = Literal::f64(2.5);
        assert_eq!(lit.as_f64(), Some(2.5));
        assert_eq!(Literal::I32(3).as_f64(), None);
    }

    #[test]
    fn float_literals_hashable() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Literal::f64(1.0));
        set.insert(Literal::f64(1.0));
        set.insert(Literal::f64(2.0));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn symbols() {
        assert_eq!(BinaryOp::Add.as_symbol(), "+");
        assert_eq!(BinaryOp::Le.as_symbol(), "<=");
    }
}
