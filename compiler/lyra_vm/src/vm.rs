//! The runtime session.
//!
//! A [`Vm`] owns everything: the interner, the type registry, the expression
//! arena, the global tables and the blue cache. There is no ambient state;
//! two sessions never share anything.

use crate::blue_cache::{BlueCache, BlueKey};
use crate::errors::{arg_count_mismatch, internal, type_mismatch, VmResult};
use crate::opimpl::OpArg;
use crate::value::{FuncBody, FuncValue, Instance, Value};
use crate::{eval, operators};
use lyra_ir::{ExprArena, Fqn, Name, SharedInterner, Span, TypeId};
use lyra_types::{OperatorKind, TypeRegistry};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// One global: its declared type and current value.
struct GlobalEntry {
    ty: TypeId,
    value: Value,
}

/// The session's global tables.
///
/// `unique` mirrors every fully-qualified name ever allocated, including
/// names whose entries were never stored; the key space is append-only.
#[derive(Default)]
struct Globals {
    entries: FxHashMap<Fqn, GlobalEntry>,
    unique: FxHashSet<Fqn>,
    next_suffix: u32,
}

/// A single-threaded runtime session.
pub struct Vm {
    interner: SharedInterner,
    types: TypeRegistry,
    arena: ExprArena,
    globals: Globals,
    blue_cache: BlueCache,
    fallbacks: FxHashMap<OperatorKind, Fqn>,
}

impl Vm {
    /// Create a session with the `builtins` and `operator` modules
    /// installed.
    ///
    /// # Panics
    /// Panics if builtin installation fails, which indicates a bug in the
    /// runtime itself.
    pub fn new() -> Self {
        let interner = SharedInterner::new();
        let types = TypeRegistry::new(interner.clone());
        let mut vm = Vm {
            interner,
            types,
            arena: ExprArena::new(),
            globals: Globals::default(),
            blue_cache: BlueCache::default(),
            fallbacks: FxHashMap::default(),
        };
        if let Err(e) = crate::builtins::install(&mut vm) {
            panic!("builtin installation failed: {e}");
        }
        vm
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Intern an identifier.
    pub fn intern(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    pub fn arena(&self) -> &ExprArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut ExprArena {
        &mut self.arena
    }

    /// Number of memoized blue call results.
    pub fn blue_cache_len(&self) -> usize {
        self.blue_cache.len()
    }

    // ---- object model ----

    /// The concrete runtime type of a value.
    pub fn dynamic_type(&self, value: &Value) -> TypeId {
        let b = self.types.builtins();
        match value {
            Value::Void => b.void,
            Value::Bool(_) => b.bool_,
            Value::I32(_) => b.i32,
            Value::F64(_) => b.f64,
            Value::Str(_) => b.str_,
            Value::Type(_) => b.type_,
            Value::Func(f) => f.ty,
            Value::Instance(i) => i.ty,
            Value::OpArg(_) => b.oparg,
            Value::OpImpl(_) => b.opimpl,
        }
    }

    /// Rendered name of a value's concrete type.
    pub fn type_name_of(&self, value: &Value) -> &'static str {
        self.types.type_name(self.dynamic_type(value))
    }

    /// Does `value` inhabit `ty`?
    pub fn is_instance(&self, value: &Value, ty: TypeId) -> bool {
        self.types.is_subtype(self.dynamic_type(value), ty)
    }

    /// Require `value` to inhabit `ty`.
    pub fn typecheck(&self, value: &Value, ty: TypeId) -> VmResult<()> {
        if self.is_instance(value, ty) {
            Ok(())
        } else {
            Err(type_mismatch(
                self.types.type_name(ty),
                self.type_name_of(value),
            ))
        }
    }

    /// Construct an instance of a plain type, checking each field against
    /// the type's declared members.
    pub fn new_instance(&self, ty: TypeId, fields: Vec<(Name, Value)>) -> VmResult<Value> {
        let mut map = FxHashMap::default();
        for (attr, value) in fields {
            let Some(member) = self.types.find_member(ty, attr) else {
                return Err(internal(format!(
                    "type `{}` has no member `{}`",
                    self.types.type_name(ty),
                    self.interner.lookup(attr)
                )));
            };
            self.typecheck(&value, member.ty)?;
            map.insert(member.field, value);
        }
        Ok(Value::Instance(Arc::new(Instance::new(ty, map))))
    }

    // ---- fully-qualified names ----

    /// Allocate the global name `module::attr`.
    ///
    /// Registering the same global twice is an internal error; the check
    /// fires before any state is mutated.
    pub fn global_fqn(&mut self, module: Name, attr: Name) -> VmResult<Fqn> {
        let fqn = Fqn::global(module, attr);
        if self.globals.unique.contains(&fqn) {
            return Err(internal(format!(
                "global `{}` registered twice",
                fqn.display(&self.interner)
            )));
        }
        self.globals.unique.insert(fqn);
        Ok(fqn)
    }

    /// Allocate a fresh suffixed name for a synthesized entity.
    ///
    /// Suffixes come from one monotone session counter and are never reused,
    /// even across unrelated `module::attr` stems.
    pub fn fresh_fqn(&mut self, module: Name, attr: Name) -> Fqn {
        let suffix = self.globals.next_suffix;
        self.globals.next_suffix += 1;
        let fqn = Fqn::suffixed(module, attr, suffix);
        self.globals.unique.insert(fqn);
        fqn
    }

    /// Register a global value.
    ///
    /// `declared` defaults to the value's concrete type. The entry must not
    /// already exist, and the value must inhabit the declared type; both
    /// violations are internal errors since registration is a runtime-side
    /// API, not a user operation.
    pub fn add_global(&mut self, fqn: Fqn, declared: Option<TypeId>, value: Value) -> VmResult<()> {
        if self.globals.entries.contains_key(&fqn) {
            return Err(internal(format!(
                "global `{}` already has a value",
                fqn.display(&self.interner)
            )));
        }
        let ty = declared.unwrap_or_else(|| self.dynamic_type(&value));
        if !self.is_instance(&value, ty) {
            return Err(internal(format!(
                "global `{}` value of type `{}` does not satisfy declared type `{}`",
                fqn.display(&self.interner),
                self.type_name_of(&value),
                self.types.type_name(ty)
            )));
        }
        self.globals.unique.insert(fqn);
        self.globals.entries.insert(fqn, GlobalEntry { ty, value });
        Ok(())
    }

    /// Replace the value of an existing global.
    ///
    /// The new value must satisfy the declared type recorded at
    /// registration.
    pub fn store_global(&mut self, fqn: Fqn, value: Value) -> VmResult<()> {
        let Some(entry) = self.globals.entries.get(&fqn) else {
            return Err(internal(format!(
                "store to unregistered global `{}`",
                fqn.display(&self.interner)
            )));
        };
        if !self.is_instance(&value, entry.ty) {
            return Err(internal(format!(
                "global `{}` value of type `{}` does not satisfy declared type `{}`",
                fqn.display(&self.interner),
                self.type_name_of(&value),
                self.types.type_name(entry.ty)
            )));
        }
        if let Some(entry) = self.globals.entries.get_mut(&fqn) {
            entry.value = value;
        }
        Ok(())
    }

    pub fn lookup_global(&self, fqn: Fqn) -> Option<Value> {
        self.globals.entries.get(&fqn).map(|e| e.value.clone())
    }

    pub fn lookup_global_type(&self, fqn: Fqn) -> Option<TypeId> {
        self.globals.entries.get(&fqn).map(|e| e.ty)
    }

    pub fn has_global(&self, fqn: Fqn) -> bool {
        self.globals.entries.contains_key(&fqn)
    }

    /// Find a global holding `value`, if any.
    ///
    /// Linear scan; the table is small and this only runs during rewriting.
    pub fn reverse_lookup_global(&self, value: &Value) -> Option<Fqn> {
        self.globals
            .entries
            .iter()
            .find(|(_, entry)| entry.value == *value)
            .map(|(fqn, _)| *fqn)
    }

    pub(crate) fn global_entries(&self) -> Vec<(Fqn, Value)> {
        self.globals
            .entries
            .iter()
            .map(|(fqn, entry)| (*fqn, entry.value.clone()))
            .collect()
    }

    // ---- operator fallbacks ----

    pub(crate) fn set_fallback(&mut self, kind: OperatorKind, fqn: Fqn) {
        self.fallbacks.insert(kind, fqn);
    }

    pub(crate) fn fallback(&self, kind: OperatorKind) -> Option<Fqn> {
        self.fallbacks.get(&kind).copied()
    }

    // ---- call engine ----

    /// Call a function value with already-evaluated arguments.
    ///
    /// Arguments are checked against the signature before anything else;
    /// blue calls then go through the memo, red calls execute directly.
    pub fn call_function(&mut self, callee: &Value, args: &[Value]) -> VmResult<Value> {
        let Some(func) = callee.as_func() else {
            return Err(internal(format!(
                "call target is not a function: `{}`",
                self.type_name_of(callee)
            )));
        };
        let func = Arc::clone(func);
        self.check_call_args(&func, args)?;

        if func.is_blue() {
            let key = BlueKey {
                fqn: func.fqn,
                args: args.to_vec(),
            };
            if let Some(hit) = self.blue_cache.lookup(&key) {
                tracing::trace!(
                    func = %func.fqn.display(&self.interner),
                    "blue cache hit"
                );
                return Ok(hit);
            }
            let result = self.execute(&func, args)?;
            self.blue_cache.record(key, result.clone());
            Ok(result)
        } else {
            self.execute(&func, args)
        }
    }

    fn check_call_args(&self, func: &FuncValue, args: &[Value]) -> VmResult<()> {
        let expected = func.sig.arity();
        let arity_ok = match func.sig.variadic {
            Some(_) => args.len() >= expected,
            None => args.len() == expected,
        };
        if !arity_ok {
            return Err(arg_count_mismatch(expected, args.len()));
        }
        for (param, arg) in func.sig.params.iter().zip(args) {
            self.typecheck(arg, param.ty)?;
        }
        if let Some(elem) = func.sig.variadic {
            for arg in &args[expected..] {
                self.typecheck(arg, elem)?;
            }
        }
        Ok(())
    }

    fn execute(&mut self, func: &Arc<FuncValue>, args: &[Value]) -> VmResult<Value> {
        match func.body {
            FuncBody::Native(f) => f(self, args),
            FuncBody::Ast(root) => eval::call_ast(self, func, root, args),
            FuncBody::GetField(field) => {
                let Some(Value::Instance(instance)) = args.first() else {
                    return Err(internal("field accessor receiver is not an instance"));
                };
                instance.field(field).ok_or_else(|| {
                    internal(format!(
                        "instance of `{}` has no field `{}`",
                        self.types.type_name(instance.ty),
                        self.interner.lookup(field)
                    ))
                })
            }
            FuncBody::SetField(field) => {
                let Some(Value::Instance(instance)) = args.first() else {
                    return Err(internal("field accessor receiver is not an instance"));
                };
                let Some(value) = args.get(2) else {
                    return Err(internal("field setter called without a value"));
                };
                instance.set_field(field, value.clone());
                Ok(Value::Void)
            }
        }
    }

    // ---- equality ----

    /// Dispatch `==` on two values, requiring an implementation to exist.
    pub fn eq(&mut self, a: &Value, b: &Value) -> VmResult<bool> {
        let operands = self.value_operands(&[a, b]);
        let opimpl = operators::resolve(self, OperatorKind::Eq, &operands, Span::DUMMY)?;
        let result = eval::invoke_opimpl(self, &opimpl)?;
        self.expect_bool(result)
    }

    /// Like [`Vm::eq`], but unrelated operand types compare unequal instead
    /// of erroring.
    pub fn universal_eq(&mut self, a: &Value, b: &Value) -> VmResult<bool> {
        use crate::errors::VmErrorKind;

        let operands = self.value_operands(&[a, b]);
        match operators::resolve(self, OperatorKind::Eq, &operands, Span::DUMMY) {
            Ok(opimpl) => {
                let result = eval::invoke_opimpl(self, &opimpl)?;
                self.expect_bool(result)
            }
            Err(err) => match err.kind {
                VmErrorKind::UnsupportedOperator { .. } | VmErrorKind::TypeMismatch { .. } => {
                    Ok(false)
                }
                _ => Err(err),
            },
        }
    }

    /// Negation of [`Vm::universal_eq`].
    pub fn universal_ne(&mut self, a: &Value, b: &Value) -> VmResult<bool> {
        Ok(!self.universal_eq(a, b)?)
    }

    fn value_operands(&self, values: &[&Value]) -> Vec<OpArg> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let index = u32::try_from(i).unwrap_or(u32::MAX);
                OpArg::blue(self.dynamic_type(v), (*v).clone(), Span::DUMMY).with_operand(index)
            })
            .collect()
    }

    fn expect_bool(&self, value: Value) -> VmResult<bool> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(internal(format!(
                "`==` implementation returned `{}`, not `bool`",
                self.type_name_of(&other)
            ))),
        }
    }
}

/// Public dispatch surface, for embedders and tests that drive the operator
/// protocol directly.
impl Vm {
    /// Resolve an operator over operand descriptions to a checked
    /// [`crate::OpImpl`].
    pub fn resolve_operator(
        &mut self,
        kind: OperatorKind,
        operands: &[OpArg],
        span: Span,
    ) -> VmResult<crate::OpImpl> {
        operators::resolve(self, kind, operands, span)
    }

    /// Execute a checked dispatch outcome whose arguments are all blue.
    pub fn invoke_opimpl(&mut self, opimpl: &crate::OpImpl) -> VmResult<Value> {
        eval::invoke_opimpl(self, opimpl)
    }

    /// Dispatch an operator over runtime values in one step.
    pub fn dispatch(&mut self, kind: OperatorKind, values: &[Value]) -> VmResult<Value> {
        eval::dispatch_values(self, kind, values)
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
