//! The operator dispatch protocol's two value types.
//!
//! Dispatch is a conversation about *descriptions* of operands: the engine
//! hands the resolver a tuple of [`OpArg`]s, and the resolver answers with an
//! [`OpImpl`] saying how (or that nothing can) implement the operator.

use crate::value::{FuncValue, Value};
use lyra_ir::{Span, TypeId};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Compile-time description of one operand.
///
/// `blue` carries the operand's value when it is known before runtime.
/// `operand` is the operand's position at the dispatch site; resolvers may
/// reorder or synthesize arguments, and the redshift pass uses this index to
/// map resolved arguments back onto operand expressions. A `None` index marks
/// a resolver-synthesized argument, which must be blue.
///
/// The span annotates error labels only; it is excluded from equality and
/// hashing so memoized dispatch does not depend on source locations.
#[derive(Clone, Debug)]
pub struct OpArg {
    pub ty: TypeId,
    pub blue: Option<Value>,
    pub span: Span,
    pub operand: Option<u32>,
}

impl OpArg {
    /// An operand whose value is known before runtime.
    pub fn blue(ty: TypeId, value: Value, span: Span) -> Self {
        OpArg {
            ty,
            blue: Some(value),
            span,
            operand: None,
        }
    }

    /// An operand known only by type.
    pub fn red(ty: TypeId, span: Span) -> Self {
        OpArg {
            ty,
            blue: None,
            span,
            operand: None,
        }
    }

    /// Record the operand's position at the dispatch site.
    #[must_use]
    pub fn with_operand(mut self, index: u32) -> Self {
        self.operand = Some(index);
        self
    }

    #[inline]
    pub fn is_blue(&self) -> bool {
        self.blue.is_some()
    }

    pub fn blue_value(&self) -> Option<&Value> {
        self.blue.as_ref()
    }
}

impl PartialEq for OpArg {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.blue == other.blue && self.operand == other.operand
    }
}

impl Eq for OpArg {}

impl Hash for OpArg {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ty.hash(state);
        self.blue.hash(state);
        self.operand.hash(state);
    }
}

/// Outcome of operator dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpImpl {
    /// No implementation exists. Type checking turns this into an
    /// `UnsupportedOperator` error.
    Null,
    /// The operation folds to a constant.
    Const(Value),
    /// The operation is implemented by calling `func` with `args`, which may
    /// reorder or extend the original operands.
    Call {
        func: Arc<FuncValue>,
        args: Vec<OpArg>,
    },
}

impl OpImpl {
    pub fn call(func: Arc<FuncValue>, args: Vec<OpArg>) -> Self {
        OpImpl::Call { func, args }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, OpImpl::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn span_excluded_from_equality() {
        let a = OpArg::blue(TypeId::new(4), Value::I32(1), Span::new(0, 1));
        let b = OpArg::blue(TypeId::new(4), Value::I32(1), Span::new(90, 95));
        assert_eq!(a, b);

        use std::collections::hash_map::DefaultHasher;
        use std::hash::BuildHasher;
        let s = std::hash::BuildHasherDefault::<DefaultHasher>::default();
        assert_eq!(s.hash_one(&a), s.hash_one(&b));
    }

    #[test]
    fn operand_index_distinguishes() {
        let a = OpArg::red(TypeId::new(4), Span::DUMMY).with_operand(0);
        let b = OpArg::red(TypeId::new(4), Span::DUMMY).with_operand(1);
        assert_ne!(a, b);
    }

    #[test]
    fn blue_classification() {
        assert!(OpArg::blue(TypeId::new(0), Value::Void, Span::DUMMY).is_blue());
        assert!(!OpArg::red(TypeId::new(0), Span::DUMMY).is_blue());
    }

    #[test]
    fn null_is_null() {
        assert!(OpImpl::Null.is_null());
        assert!(!OpImpl::Const(Value::Void).is_null());
    }
}
