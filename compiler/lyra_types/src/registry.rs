//! The session type registry.
//!
//! All types of a session live in one append-only table indexed by `TypeId`.
//! Construction is two-phase: a type is declared first (empty tables), then
//! its members, operator resolvers and conventional methods are populated.
//! This lets mutually-referential types point at each other by id.

use crate::{FuncSig, OperatorKind};
use lyra_ir::{Fqn, Name, SharedInterner, TypeId};
use rustc_hash::FxHashMap;

/// A declared field of a plain type.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Member {
    /// Storage key of the field on instances.
    pub field: Name,
    /// Declared type of the field.
    pub ty: TypeId,
}

/// Structural classification of a type.
#[derive(Clone, Debug)]
pub enum TypeKind {
    /// Ordinary nominal type.
    Plain,
    /// The `dynamic` escape hatch; assignable to and from everything.
    Dynamic,
    /// A distinct nominal type wrapping an existing origin type.
    Wrapper { origin: TypeId },
    /// An interned function type.
    Func(FuncSig),
}

/// Everything the registry knows about one type.
#[derive(Debug)]
pub struct TypeData {
    pub name: Name,
    pub fqn: Fqn,
    pub base: Option<TypeId>,
    pub kind: TypeKind,
    members: FxHashMap<Name, Member>,
    resolvers: FxHashMap<OperatorKind, Fqn>,
    methods: FxHashMap<Name, Fqn>,
}

impl TypeData {
    fn new(name: Name, fqn: Fqn, base: Option<TypeId>, kind: TypeKind) -> Self {
        TypeData {
            name,
            fqn,
            base,
            kind,
            members: FxHashMap::default(),
            resolvers: FxHashMap::default(),
            methods: FxHashMap::default(),
        }
    }

    /// Member declared directly on this type.
    pub fn member(&self, attr: Name) -> Option<Member> {
        self.members.get(&attr).copied()
    }

    /// Resolver bound directly on this type.
    pub fn resolver(&self, kind: OperatorKind) -> Option<Fqn> {
        self.resolvers.get(&kind).copied()
    }

    /// Conventional method bound directly on this type.
    pub fn method(&self, name: Name) -> Option<Fqn> {
        self.methods.get(&name).copied()
    }
}

/// Ids of the types every session starts with.
#[derive(Copy, Clone, Debug)]
pub struct Builtins {
    pub object: TypeId,
    pub dynamic: TypeId,
    pub void: TypeId,
    pub bool_: TypeId,
    pub i32: TypeId,
    pub f64: TypeId,
    pub str_: TypeId,
    pub type_: TypeId,
    pub oparg: TypeId,
    pub opimpl: TypeId,
}

/// Append-only table of every type in a session.
pub struct TypeRegistry {
    interner: SharedInterner,
    types: Vec<TypeData>,
    func_types: FxHashMap<FuncSig, TypeId>,
    builtins: Builtins,
    builtins_module: Name,
}

impl TypeRegistry {
    /// Create a registry pre-populated with the builtin types.
    pub fn new(interner: SharedInterner) -> Self {
        let module = interner.intern("builtins");
        let mut types = Vec::with_capacity(32);

        let mut declare = |types: &mut Vec<TypeData>, name: &str, base, kind| {
            let name = interner.intern(name);
            let id = TypeId::new(u32::try_from(types.len()).unwrap_or(u32::MAX));
            types.push(TypeData::new(name, Fqn::global(module, name), base, kind));
            id
        };

        let object = declare(&mut types, "object", None, TypeKind::Plain);
        let dynamic = declare(&mut types, "dynamic", Some(object), TypeKind::Dynamic);
        let void = declare(&mut types, "void", Some(object), TypeKind::Plain);
        let bool_ = declare(&mut types, "bool", Some(object), TypeKind::Plain);
        let i32 = declare(&mut types, "i32", Some(object), TypeKind::Plain);
        let f64 = declare(&mut types, "f64", Some(object), TypeKind::Plain);
        let str_ = declare(&mut types, "str", Some(object), TypeKind::Plain);
        let type_ = declare(&mut types, "type", Some(object), TypeKind::Plain);
        let oparg = declare(&mut types, "OpArg", Some(object), TypeKind::Plain);
        let opimpl = declare(&mut types, "OpImpl", Some(object), TypeKind::Plain);

        TypeRegistry {
            interner,
            types,
            func_types: FxHashMap::default(),
            builtins: Builtins {
                object,
                dynamic,
                void,
                bool_,
                i32,
                f64,
                str_,
                type_,
                oparg,
                opimpl,
            },
            builtins_module: module,
        }
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn push(&mut self, data: TypeData) -> TypeId {
        let Ok(index) = u32::try_from(self.types.len()) else {
            panic!("type registry exceeded capacity");
        };
        self.types.push(data);
        TypeId::new(index)
    }

    /// Declare a new plain type deriving from `base`.
    pub fn declare(&mut self, name: Name, fqn: Fqn, base: TypeId) -> TypeId {
        self.push(TypeData::new(name, fqn, Some(base), TypeKind::Plain))
    }

    /// Declare a wrapper type: a distinct nominal identity over `origin`.
    pub fn declare_wrapper(&mut self, name: Name, fqn: Fqn, origin: TypeId) -> TypeId {
        self.push(TypeData::new(
            name,
            fqn,
            Some(self.builtins.object),
            TypeKind::Wrapper { origin },
        ))
    }

    /// Intern a function type for `sig`.
    ///
    /// Structurally identical signatures share one `TypeId`.
    pub fn func_type(&mut self, sig: FuncSig) -> TypeId {
        if let Some(&id) = self.func_types.get(&sig) {
            return id;
        }
        let name = self.interner.intern(&self.render_sig(&sig));
        let data = TypeData::new(
            name,
            Fqn::global(self.builtins_module, name),
            Some(self.builtins.object),
            TypeKind::Func(sig.clone()),
        );
        let id = self.push(data);
        self.func_types.insert(sig, id);
        id
    }

    fn render_sig(&self, sig: &FuncSig) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        if matches!(sig.kind, crate::FuncKind::Generic) {
            out.push_str("generic ");
        }
        if sig.is_blue() {
            out.push_str("blue ");
        }
        out.push_str("def(");
        for (i, param) in sig.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(self.type_name(param.ty));
        }
        if let Some(elem) = sig.variadic {
            if !sig.params.is_empty() {
                out.push_str(", ");
            }
            let _ = write!(out, "{}...", self.type_name(elem));
        }
        let _ = write!(out, ") -> {}", self.type_name(sig.ret));
        out
    }

    /// Fetch a type by id.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this registry.
    pub fn get(&self, id: TypeId) -> &TypeData {
        match self.types.get(id.index()) {
            Some(data) => data,
            None => panic!("{id:?} not found in type registry"),
        }
    }

    fn get_mut(&mut self, id: TypeId) -> &mut TypeData {
        match self.types.get_mut(id.index()) {
            Some(data) => data,
            None => panic!("{id:?} not found in type registry"),
        }
    }

    /// Declare a field on a type.
    pub fn add_member(&mut self, ty: TypeId, attr: Name, member: Member) {
        self.get_mut(ty).members.insert(attr, member);
    }

    /// Bind an operator resolver on a type.
    pub fn set_resolver(&mut self, ty: TypeId, kind: OperatorKind, resolver: Fqn) {
        self.get_mut(ty).resolvers.insert(kind, resolver);
    }

    /// Bind a conventional method on a type.
    pub fn set_method(&mut self, ty: TypeId, name: Name, func: Fqn) {
        self.get_mut(ty).methods.insert(name, func);
    }

    /// Look up a member on `ty` or any of its bases.
    pub fn find_member(&self, ty: TypeId, attr: Name) -> Option<Member> {
        let mut cur = Some(ty);
        while let Some(id) = cur {
            let data = self.get(id);
            if let Some(member) = data.member(attr) {
                return Some(member);
            }
            cur = data.base;
        }
        None
    }

    /// Look up a conventional method on `ty` or any of its bases.
    pub fn find_method(&self, ty: TypeId, name: Name) -> Option<Fqn> {
        let mut cur = Some(ty);
        while let Some(id) = cur {
            let data = self.get(id);
            if let Some(fqn) = data.method(name) {
                return Some(fqn);
            }
            cur = data.base;
        }
        None
    }

    /// Look up an operator resolver for `ty`.
    ///
    /// Wrappers without their own binding fall back to their origin's
    /// resolvers for attribute access, so wrapping a type does not hide its
    /// attribute protocol.
    pub fn find_resolver(&self, ty: TypeId, kind: OperatorKind) -> Option<Fqn> {
        let data = self.get(ty);
        if let Some(fqn) = data.resolver(kind) {
            return Some(fqn);
        }
        if kind.is_attr_access() {
            if let TypeKind::Wrapper { origin } = data.kind {
                return self.find_resolver(origin, kind);
            }
        }
        None
    }

    /// Strip wrapper identity, yielding the underlying origin type.
    pub fn unwrap_origin(&self, ty: TypeId) -> TypeId {
        let mut cur = ty;
        while let TypeKind::Wrapper { origin } = self.get(cur).kind {
            cur = origin;
        }
        cur
    }

    pub fn is_dynamic(&self, ty: TypeId) -> bool {
        ty == self.builtins.dynamic
    }

    /// Subtype check used by every conversion in the runtime.
    ///
    /// `dynamic` is assignable both ways (actual values are re-checked when
    /// they cross a call boundary). Wrapper identity is stripped from both
    /// sides before walking the base chain; treating a wrapper and its origin
    /// as mutually assignable is a conversion policy, not a stable contract.
    pub fn is_subtype(&self, a: TypeId, b: TypeId) -> bool {
        if self.is_dynamic(a) || self.is_dynamic(b) {
            return true;
        }
        let a = self.unwrap_origin(a);
        let b = self.unwrap_origin(b);
        let mut cur = Some(a);
        while let Some(id) = cur {
            if id == b {
                return true;
            }
            cur = self.get(id).base;
        }
        false
    }

    /// Rendered name of a type.
    pub fn type_name(&self, ty: TypeId) -> &'static str {
        self.interner.lookup(self.get(ty).name)
    }

    /// Signature of an interned function type, if `ty` is one.
    pub fn sig_of(&self, ty: TypeId) -> Option<&FuncSig> {
        match &self.get(ty).kind {
            TypeKind::Func(sig) => Some(sig),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Param;
    use pretty_assertions::assert_eq;

    fn registry() -> (TypeRegistry, SharedInterner) {
        let interner = SharedInterner::new();
        (TypeRegistry::new(interner.clone()), interner)
    }

    #[test]
    fn builtins_rooted_at_object() {
        let (reg, _) = registry();
        let b = *reg.builtins();
        assert!(reg.get(b.object).base.is_none());
        assert_eq!(reg.get(b.i32).base, Some(b.object));
        assert_eq!(reg.type_name(b.i32), "i32");
        assert_eq!(reg.type_name(b.oparg), "OpArg");
    }

    #[test]
    fn subtype_walks_base_chain() {
        let (mut reg, interner) = registry();
        let b = *reg.builtins();
        let module = interner.intern("m");
        let animal = reg.declare(
            interner.intern("Animal"),
            Fqn::global(module, interner.intern("Animal")),
            b.object,
        );
        let dog = reg.declare(
            interner.intern("Dog"),
            Fqn::global(module, interner.intern("Dog")),
            animal,
        );
        assert!(reg.is_subtype(dog, animal));
        assert!(reg.is_subtype(dog, b.object));
        assert!(!reg.is_subtype(animal, dog));
        assert!(!reg.is_subtype(b.i32, b.str_));
    }

    #[test]
    fn dynamic_assignable_both_ways() {
        let (reg, _) = registry();
        let b = *reg.builtins();
        assert!(reg.is_subtype(b.i32, b.dynamic));
        assert!(reg.is_subtype(b.dynamic, b.i32));
    }

    #[test]
    fn wrapper_unwraps_for_subtyping() {
        let (mut reg, interner) = registry();
        let b = *reg.builtins();
        let name = interner.intern("Meters");
        let meters = reg.declare_wrapper(name, Fqn::global(interner.intern("m"), name), b.i32);
        assert_ne!(meters, b.i32);
        assert!(reg.is_subtype(meters, b.i32));
        assert!(reg.is_subtype(b.i32, meters));
        assert_eq!(reg.unwrap_origin(meters), b.i32);
    }

    #[test]
    fn func_types_are_interned() {
        let (mut reg, _) = registry();
        let b = *reg.builtins();
        let sig = FuncSig::red(vec![Param::new(Name::EMPTY, b.i32)], b.i32);
        let t1 = reg.func_type(sig.clone());
        let t2 = reg.func_type(sig);
        assert_eq!(t1, t2);
        assert_eq!(reg.type_name(t1), "def(i32) -> i32");

        let blue = FuncSig::blue(vec![], b.void);
        let t3 = reg.func_type(blue);
        assert_eq!(reg.type_name(t3), "blue def() -> void");
    }

    #[test]
    fn member_and_method_lookup_inherits() {
        let (mut reg, interner) = registry();
        let b = *reg.builtins();
        let module = interner.intern("m");
        let base_name = interner.intern("Base");
        let base = reg.declare(base_name, Fqn::global(module, base_name), b.object);
        let derived_name = interner.intern("Derived");
        let derived = reg.declare(derived_name, Fqn::global(module, derived_name), base);

        let x = interner.intern("x");
        reg.add_member(base, x, Member { field: x, ty: b.i32 });
        let m = interner.intern("__add__");
        reg.set_method(base, m, Fqn::global(module, m));

        assert_eq!(reg.find_member(derived, x), Some(Member { field: x, ty: b.i32 }));
        assert_eq!(reg.find_method(derived, m), Some(Fqn::global(module, m)));
        assert_eq!(reg.find_member(base, interner.intern("y")), None);
    }

    #[test]
    fn wrapper_falls_back_to_origin_attr_resolver() {
        let (mut reg, interner) = registry();
        let b = *reg.builtins();
        let module = interner.intern("m");
        let point_name = interner.intern("Point");
        let point = reg.declare(point_name, Fqn::global(module, point_name), b.object);
        let resolver = Fqn::global(module, interner.intern("point_getattr"));
        reg.set_resolver(point, OperatorKind::GetAttr, resolver);

        let wrapped_name = interner.intern("WrappedPoint");
        let wrapped = reg.declare_wrapper(wrapped_name, Fqn::global(module, wrapped_name), point);
        assert_eq!(reg.find_resolver(wrapped, OperatorKind::GetAttr), Some(resolver));
        // Non-attribute operators do not fall through the wrapper.
        reg.set_resolver(point, OperatorKind::GetItem, resolver);
        assert_eq!(reg.find_resolver(wrapped, OperatorKind::GetItem), None);
    }
}
