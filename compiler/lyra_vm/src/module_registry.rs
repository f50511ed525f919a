//! Module registration.
//!
//! A [`ModuleRegistry`] collects the functions and constants of one module;
//! installing it allocates their global names and registers their values in
//! one pass. Duplicate names fail loudly before any state changes.

use crate::errors::VmResult;
use crate::value::{FuncBody, FuncValue, NativeFn, Value};
use crate::vm::Vm;
use lyra_ir::{ExprId, Name, TypeId};
use lyra_types::FuncSig;
use std::sync::Arc;

enum ModuleItem {
    Func {
        name: Name,
        sig: FuncSig,
        body: FuncBody,
    },
    Const {
        name: Name,
        ty: Option<TypeId>,
        value: Value,
    },
}

/// Builder for the contents of one module.
pub struct ModuleRegistry {
    name: Name,
    items: Vec<ModuleItem>,
}

impl ModuleRegistry {
    pub fn new(name: Name) -> Self {
        ModuleRegistry {
            name,
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> Name {
        self.name
    }

    /// Add a native function.
    #[must_use]
    pub fn native_func(mut self, name: Name, sig: FuncSig, f: NativeFn) -> Self {
        self.items.push(ModuleItem::Func {
            name,
            sig,
            body: FuncBody::Native(f),
        });
        self
    }

    /// Add a function with an AST body rooted at `root`.
    #[must_use]
    pub fn ast_func(mut self, name: Name, sig: FuncSig, root: ExprId) -> Self {
        self.items.push(ModuleItem::Func {
            name,
            sig,
            body: FuncBody::Ast(root),
        });
        self
    }

    /// Add a constant. `ty` defaults to the value's concrete type.
    #[must_use]
    pub fn constant(mut self, name: Name, ty: Option<TypeId>, value: Value) -> Self {
        self.items.push(ModuleItem::Const { name, ty, value });
        self
    }
}

impl Vm {
    /// Install a module's contents into the session.
    pub fn install_module(&mut self, module: ModuleRegistry) -> VmResult<()> {
        let ModuleRegistry { name: module_name, items } = module;
        for item in items {
            match item {
                ModuleItem::Func { name, sig, body } => {
                    let fqn = self.global_fqn(module_name, name)?;
                    let ty = self.types_mut().func_type(sig.clone());
                    let func = FuncValue::new(fqn, ty, sig, body);
                    self.add_global(fqn, Some(ty), Value::Func(Arc::new(func)))?;
                }
                ModuleItem::Const { name, ty, value } => {
                    let fqn = self.global_fqn(module_name, name)?;
                    self.add_global(fqn, ty, value)?;
                }
            }
        }
        Ok(())
    }

    /// Declare a new plain type in `module` and register the type object as
    /// a global.
    pub fn declare_type(&mut self, module: Name, name: Name, base: TypeId) -> VmResult<TypeId> {
        let fqn = self.global_fqn(module, name)?;
        let id = self.types_mut().declare(name, fqn, base);
        let type_ty = self.types().builtins().type_;
        self.add_global(fqn, Some(type_ty), Value::Type(id))?;
        Ok(id)
    }

    /// Declare a wrapper type over `origin` and register its type object.
    pub fn declare_wrapper_type(
        &mut self,
        module: Name,
        name: Name,
        origin: TypeId,
    ) -> VmResult<TypeId> {
        let fqn = self.global_fqn(module, name)?;
        let id = self.types_mut().declare_wrapper(name, fqn, origin);
        let type_ty = self.types().builtins().type_;
        self.add_global(fqn, Some(type_ty), Value::Type(id))?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{VmErrorKind, VmResult};
    use lyra_ir::Fqn;
    use lyra_types::Param;
    use pretty_assertions::assert_eq;

    fn the_answer(_vm: &mut Vm, _args: &[Value]) -> VmResult<Value> {
        Ok(Value::I32(42))
    }

    #[test]
    fn install_registers_globals() {
        let mut vm = Vm::new();
        let b = *vm.types().builtins();
        let module = vm.intern("mymod");
        let answer = vm.intern("answer");
        let pi = vm.intern("pi");

        let registry = ModuleRegistry::new(module)
            .native_func(answer, FuncSig::blue(vec![], b.i32), the_answer)
            .constant(pi, Some(b.f64), Value::F64(3.14));
        match vm.install_module(registry) {
            Ok(()) => {}
            Err(e) => panic!("install failed: {e}"),
        }

        let func = vm.lookup_global(Fqn::global(module, answer));
        assert!(matches!(func, Some(Value::Func(_))));
        assert_eq!(
            vm.lookup_global(Fqn::global(module, pi)),
            Some(Value::F64(3.14))
        );
        assert_eq!(
            vm.lookup_global_type(Fqn::global(module, pi)),
            Some(b.f64)
        );
    }

    #[test]
    fn duplicate_global_is_internal_error() {
        let mut vm = Vm::new();
        let module = vm.intern("mymod");
        let name = vm.intern("thing");
        let b = *vm.types().builtins();

        let first = ModuleRegistry::new(module).constant(name, Some(b.i32), Value::I32(1));
        match vm.install_module(first) {
            Ok(()) => {}
            Err(e) => panic!("install failed: {e}"),
        }
        let second = ModuleRegistry::new(module).constant(name, Some(b.i32), Value::I32(2));
        let err = match vm.install_module(second) {
            Ok(()) => panic!("duplicate registration must fail"),
            Err(e) => e,
        };
        assert!(err.is_fatal());
        assert!(matches!(err.kind, VmErrorKind::InternalConsistency { .. }));
        // The first registration is untouched.
        assert_eq!(
            vm.lookup_global(Fqn::global(module, name)),
            Some(Value::I32(1))
        );
    }

    #[test]
    fn declare_type_registers_type_object() {
        let mut vm = Vm::new();
        let b = *vm.types().builtins();
        let module = vm.intern("mymod");
        let name = vm.intern("Point");
        let point = match vm.declare_type(module, name, b.object) {
            Ok(id) => id,
            Err(e) => panic!("declare failed: {e}"),
        };
        assert_eq!(
            vm.lookup_global(Fqn::global(module, name)),
            Some(Value::Type(point))
        );
        assert!(vm.types().is_subtype(point, b.object));
    }
}
