//! Runtime values.
//!
//! Every value implements `Eq` + `Hash` so argument tuples can key the blue
//! cache: floats hash by bit pattern, instances by heap identity, functions
//! by fully-qualified name.

use crate::errors::VmResult;
use crate::opimpl::{OpArg, OpImpl};
use crate::vm::Vm;
use lyra_ir::{ExprId, Fqn, Literal, Name, StringInterner, TypeId};
use lyra_types::{Color, FuncSig};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A native function: arbitrary Rust code with full session access.
pub type NativeFn = fn(&mut Vm, &[Value]) -> VmResult<Value>;

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Void,
    Bool(bool),
    I32(i32),
    F64(f64),
    Str(Arc<str>),
    /// A type is itself a value.
    Type(TypeId),
    Func(Arc<FuncValue>),
    Instance(Arc<Instance>),
    /// Operand descriptor, passed to operator resolvers.
    OpArg(Arc<OpArg>),
    /// Dispatch outcome, returned by operator resolvers.
    OpImpl(Arc<OpImpl>),
}

impl Value {
    /// Build a string value.
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn as_func(&self) -> Option<&Arc<FuncValue>> {
        match self {
            Value::Func(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_opimpl(&self) -> Option<&Arc<OpImpl>> {
        match self {
            Value::OpImpl(oi) => Some(oi),
            _ => None,
        }
    }

    /// Materialize a literal as a value.
    pub fn from_literal(lit: Literal, interner: &StringInterner) -> Self {
        match lit {
            Literal::Void => Value::Void,
            Literal::Bool(b) => Value::Bool(b),
            Literal::I32(n) => Value::I32(n),
            Literal::F64Bits(bits) => Value::F64(f64::from_bits(bits)),
            Literal::Str(name) => Value::str(interner.lookup(name)),
        }
    }

    /// The literal form of a scalar value, if it has one.
    ///
    /// Composite values (functions, instances, ...) have no literal form and
    /// must be referenced through a global instead.
    pub fn as_literal(&self, interner: &StringInterner) -> Option<Literal> {
        match self {
            Value::Void => Some(Literal::Void),
            Value::Bool(b) => Some(Literal::Bool(*b)),
            Value::I32(n) => Some(Literal::I32(*n)),
            Value::F64(x) => Some(Literal::F64Bits(x.to_bits())),
            Value::Str(s) => Some(Literal::Str(interner.intern(s))),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            // Bit equality: NaN == NaN, -0.0 != 0.0. Required for stable
            // memoization keys.
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => a.fqn == b.fqn,
            (Value::Instance(a), Value::Instance(b)) => Arc::ptr_eq(a, b),
            (Value::OpArg(a), Value::OpArg(b)) => a == b,
            (Value::OpImpl(a), Value::OpImpl(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Void => {}
            Value::Bool(b) => b.hash(state),
            Value::I32(n) => n.hash(state),
            Value::F64(x) => x.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Type(t) => t.hash(state),
            Value::Func(f) => f.fqn.hash(state),
            Value::Instance(i) => std::ptr::hash(Arc::as_ptr(i), state),
            Value::OpArg(a) => a.hash(state),
            Value::OpImpl(oi) => oi.hash(state),
        }
    }
}

/// The body of a function value.
#[derive(Clone, Debug)]
pub enum FuncBody {
    Native(NativeFn),
    /// Root expression in the session arena.
    Ast(ExprId),
    /// Synthesized field accessor: read `field` off the receiver.
    GetField(Name),
    /// Synthesized field accessor: write `field` on the receiver.
    SetField(Name),
}

/// A function value.
///
/// Identity is the fully-qualified name: two `FuncValue`s with the same `fqn`
/// compare equal even when their bodies differ, which is what lets the
/// redshift pass swap bodies under a stable name.
#[derive(Clone, Debug)]
pub struct FuncValue {
    pub fqn: Fqn,
    /// Interned function type in the registry.
    pub ty: TypeId,
    pub sig: FuncSig,
    pub body: FuncBody,
    /// Set once the redshift pass has produced this body.
    pub redshifted: bool,
}

impl FuncValue {
    pub fn new(fqn: Fqn, ty: TypeId, sig: FuncSig, body: FuncBody) -> Self {
        FuncValue {
            fqn,
            ty,
            sig,
            body,
            redshifted: false,
        }
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.sig.color
    }

    #[inline]
    pub fn is_blue(&self) -> bool {
        self.sig.is_blue()
    }

    /// True for functions with a rewritable AST body.
    pub fn has_ast_body(&self) -> bool {
        matches!(self.body, FuncBody::Ast(_))
    }
}

impl PartialEq for FuncValue {
    fn eq(&self, other: &Self) -> bool {
        self.fqn == other.fqn
    }
}

impl Eq for FuncValue {}

impl Hash for FuncValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fqn.hash(state);
    }
}

/// An instance of a plain type: a typed bag of fields.
///
/// Fields are interior-mutable; instances are shared by `Arc` and identity
/// (not content) is what equality observes.
#[derive(Debug)]
pub struct Instance {
    pub ty: TypeId,
    fields: RwLock<FxHashMap<Name, Value>>,
}

impl Instance {
    pub fn new(ty: TypeId, fields: FxHashMap<Name, Value>) -> Self {
        Instance {
            ty,
            fields: RwLock::new(fields),
        }
    }

    pub fn field(&self, name: Name) -> Option<Value> {
        self.fields.read().get(&name).cloned()
    }

    pub fn set_field(&self, name: Name, value: Value) {
        self.fields.write().insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_ir::SharedInterner;
    use pretty_assertions::assert_eq;

    #[test]
    fn float_equality_by_bits() {
        assert_eq!(Value::F64(f64::NAN), Value::F64(f64::NAN));
        assert_ne!(Value::F64(0.0), Value::F64(-0.0));
        assert_eq!(Value::F64(1.5), Value::F64(1.5));
    }

    #[test]
    fn instance_equality_by_identity() {
        let a = Arc::new(Instance::new(TypeId::new(3), FxHashMap::default()));
        let b = Arc::new(Instance::new(TypeId::new(3), FxHashMap::default()));
        assert_eq!(Value::Instance(a.clone()), Value::Instance(a.clone()));
        assert_ne!(Value::Instance(a), Value::Instance(b));
    }

    #[test]
    fn instance_fields_mutable() {
        let interner = SharedInterner::new();
        let x = interner.intern("x");
        let inst = Instance::new(TypeId::new(0), FxHashMap::default());
        assert_eq!(inst.field(x), None);
        inst.set_field(x, Value::I32(10));
        assert_eq!(inst.field(x), Some(Value::I32(10)));
    }

    #[test]
    fn literal_roundtrip() {
        let interner = SharedInterner::new();
        let v = Value::str("hello");
        let lit = match v.as_literal(&interner) {
            Some(lit) => lit,
            None => panic!("scalar must have a literal form"),
        };
        assert_eq!(Value::from_literal(lit, &interner), v);
        assert_eq!(
            Value::from_literal(Literal::f64(2.5), &interner),
            Value::F64(2.5)
        );
    }

    #[test]
    fn cross_variant_inequality() {
        assert_ne!(Value::I32(0), Value::Bool(false));
        assert_ne!(Value::Void, Value::I32(0));
    }
}
