//! The `builtins` and `operator` modules every session starts with.
//!
//! `builtins` holds the type objects for the builtin types plus the scalar
//! operator methods (all blue: scalar arithmetic is pure, so the redshift
//! pass can fold it). `operator` holds the red dynamic-dispatch fallbacks
//! used when a receiver's static type is `dynamic`.

use crate::errors::{internal, VmResult};
use crate::eval;
use crate::value::{FuncBody, FuncValue, NativeFn, Value};
use crate::vm::Vm;
use lyra_ir::{Name, TypeId};
use lyra_types::{FuncSig, OperatorKind, Param};
use std::sync::Arc;

macro_rules! binop {
    ($name:ident, $in:ident, $out:ident, $f:expr) => {
        fn $name(_vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
            match (args.first(), args.get(1)) {
                (Some(&Value::$in(a)), Some(&Value::$in(b))) => Ok(Value::$out($f(a, b))),
                _ => Err(internal(concat!(
                    stringify!($name),
                    " called with mistyped arguments"
                ))),
            }
        }
    };
}

binop!(i32_add, I32, I32, |a: i32, b: i32| a.wrapping_add(b));
binop!(i32_sub, I32, I32, |a: i32, b: i32| a.wrapping_sub(b));
binop!(i32_mul, I32, I32, |a: i32, b: i32| a.wrapping_mul(b));
binop!(i32_eq, I32, Bool, |a, b| a == b);
binop!(i32_ne, I32, Bool, |a, b| a != b);
binop!(i32_lt, I32, Bool, |a, b| a < b);
binop!(i32_le, I32, Bool, |a, b| a <= b);
binop!(i32_gt, I32, Bool, |a, b| a > b);
binop!(i32_ge, I32, Bool, |a, b| a >= b);

binop!(f64_add, F64, F64, |a: f64, b: f64| a + b);
binop!(f64_sub, F64, F64, |a: f64, b: f64| a - b);
binop!(f64_mul, F64, F64, |a: f64, b: f64| a * b);
binop!(f64_div, F64, F64, |a: f64, b: f64| a / b);
binop!(f64_eq, F64, Bool, |a: f64, b: f64| a == b);
binop!(f64_ne, F64, Bool, |a: f64, b: f64| a != b);
binop!(f64_lt, F64, Bool, |a, b| a < b);
binop!(f64_le, F64, Bool, |a, b| a <= b);
binop!(f64_gt, F64, Bool, |a, b| a > b);
binop!(f64_ge, F64, Bool, |a, b| a >= b);

binop!(bool_eq, Bool, Bool, |a, b| a == b);
binop!(bool_ne, Bool, Bool, |a, b| a != b);

fn str_add(_vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    match (args.first(), args.get(1)) {
        (Some(Value::Str(a)), Some(Value::Str(b))) => Ok(Value::str(format!("{a}{b}"))),
        _ => Err(internal("str_add called with mistyped arguments")),
    }
}

fn str_eq(_vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    match (args.first(), args.get(1)) {
        (Some(Value::Str(a)), Some(Value::Str(b))) => Ok(Value::Bool(a == b)),
        _ => Err(internal("str_eq called with mistyped arguments")),
    }
}

fn str_ne(_vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    match (args.first(), args.get(1)) {
        (Some(Value::Str(a)), Some(Value::Str(b))) => Ok(Value::Bool(a != b)),
        _ => Err(internal("str_ne called with mistyped arguments")),
    }
}

// Dynamic fallbacks: re-dispatch at runtime, when the operand types are
// finally concrete.

fn dynamic_call(vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    eval::dispatch_values(vm, OperatorKind::Call, args)
}

fn dynamic_getattr(vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    eval::dispatch_values(vm, OperatorKind::GetAttr, args)
}

fn dynamic_setattr(vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    eval::dispatch_values(vm, OperatorKind::SetAttr, args)
}

fn dynamic_getitem(vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    eval::dispatch_values(vm, OperatorKind::GetItem, args)
}

fn dynamic_setitem(vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    eval::dispatch_values(vm, OperatorKind::SetItem, args)
}

fn dynamic_eq(vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    let (Some(a), Some(b)) = (args.first(), args.get(1)) else {
        return Err(internal("dynamic_eq called without two arguments"));
    };
    Ok(Value::Bool(vm.universal_eq(a, b)?))
}

fn dynamic_ne(vm: &mut Vm, args: &[Value]) -> VmResult<Value> {
    let (Some(a), Some(b)) = (args.first(), args.get(1)) else {
        return Err(internal("dynamic_ne called without two arguments"));
    };
    Ok(Value::Bool(vm.universal_ne(a, b)?))
}

/// Register a blue native under `builtins` and bind it as `ty`'s method for
/// `kind`.
fn scalar_method(
    vm: &mut Vm,
    module: Name,
    ty: TypeId,
    kind: OperatorKind,
    func_name: &str,
    ret: TypeId,
    native: NativeFn,
) -> VmResult<()> {
    let a = vm.intern("a");
    let b = vm.intern("b");
    let name = vm.intern(func_name);
    let fqn = vm.global_fqn(module, name)?;
    let sig = FuncSig::blue(vec![Param::new(a, ty), Param::new(b, ty)], ret);
    let fty = vm.types_mut().func_type(sig.clone());
    let func = FuncValue::new(fqn, fty, sig, FuncBody::Native(native));
    vm.add_global(fqn, Some(fty), Value::Func(Arc::new(func)))?;
    let method_name = vm.intern(kind.method_name());
    vm.types_mut().set_method(ty, method_name, fqn);
    Ok(())
}

/// Register a red native under `operator` and install it as the dynamic
/// fallback for `kind`.
fn fallback(
    vm: &mut Vm,
    module: Name,
    kind: OperatorKind,
    func_name: &str,
    sig: FuncSig,
    native: NativeFn,
) -> VmResult<()> {
    let name = vm.intern(func_name);
    let fqn = vm.global_fqn(module, name)?;
    let fty = vm.types_mut().func_type(sig.clone());
    let func = FuncValue::new(fqn, fty, sig, FuncBody::Native(native));
    vm.add_global(fqn, Some(fty), Value::Func(Arc::new(func)))?;
    vm.set_fallback(kind, fqn);
    Ok(())
}

pub(crate) fn install(vm: &mut Vm) -> VmResult<()> {
    let b = *vm.types().builtins();
    let module = vm.intern("builtins");

    // Type objects.
    for (name, id) in [
        ("object", b.object),
        ("dynamic", b.dynamic),
        ("void", b.void),
        ("bool", b.bool_),
        ("i32", b.i32),
        ("f64", b.f64),
        ("str", b.str_),
        ("type", b.type_),
        ("OpArg", b.oparg),
        ("OpImpl", b.opimpl),
    ] {
        let name = vm.intern(name);
        let fqn = vm.global_fqn(module, name)?;
        vm.add_global(fqn, Some(b.type_), Value::Type(id))?;
    }

    // Scalar operator methods. Integer division is deliberately absent
    // until a semantics for division by zero is settled.
    use OperatorKind as Op;
    scalar_method(vm, module, b.i32, Op::Add, "i32_add", b.i32, i32_add)?;
    scalar_method(vm, module, b.i32, Op::Sub, "i32_sub", b.i32, i32_sub)?;
    scalar_method(vm, module, b.i32, Op::Mul, "i32_mul", b.i32, i32_mul)?;
    scalar_method(vm, module, b.i32, Op::Eq, "i32_eq", b.bool_, i32_eq)?;
    scalar_method(vm, module, b.i32, Op::Ne, "i32_ne", b.bool_, i32_ne)?;
    scalar_method(vm, module, b.i32, Op::Lt, "i32_lt", b.bool_, i32_lt)?;
    scalar_method(vm, module, b.i32, Op::Le, "i32_le", b.bool_, i32_le)?;
    scalar_method(vm, module, b.i32, Op::Gt, "i32_gt", b.bool_, i32_gt)?;
    scalar_method(vm, module, b.i32, Op::Ge, "i32_ge", b.bool_, i32_ge)?;

    scalar_method(vm, module, b.f64, Op::Add, "f64_add", b.f64, f64_add)?;
    scalar_method(vm, module, b.f64, Op::Sub, "f64_sub", b.f64, f64_sub)?;
    scalar_method(vm, module, b.f64, Op::Mul, "f64_mul", b.f64, f64_mul)?;
    scalar_method(vm, module, b.f64, Op::Div, "f64_div", b.f64, f64_div)?;
    scalar_method(vm, module, b.f64, Op::Eq, "f64_eq", b.bool_, f64_eq)?;
    scalar_method(vm, module, b.f64, Op::Ne, "f64_ne", b.bool_, f64_ne)?;
    scalar_method(vm, module, b.f64, Op::Lt, "f64_lt", b.bool_, f64_lt)?;
    scalar_method(vm, module, b.f64, Op::Le, "f64_le", b.bool_, f64_le)?;
    scalar_method(vm, module, b.f64, Op::Gt, "f64_gt", b.bool_, f64_gt)?;
    scalar_method(vm, module, b.f64, Op::Ge, "f64_ge", b.bool_, f64_ge)?;

    scalar_method(vm, module, b.str_, Op::Add, "str_add", b.str_, str_add)?;
    scalar_method(vm, module, b.str_, Op::Eq, "str_eq", b.bool_, str_eq)?;
    scalar_method(vm, module, b.str_, Op::Ne, "str_ne", b.bool_, str_ne)?;

    scalar_method(vm, module, b.bool_, Op::Eq, "bool_eq", b.bool_, bool_eq)?;
    scalar_method(vm, module, b.bool_, Op::Ne, "bool_ne", b.bool_, bool_ne)?;

    // The `operator` module: dynamic-dispatch fallbacks.
    let op_module = vm.intern("operator");
    let obj = vm.intern("obj");
    let attr = vm.intern("attr");
    let value = vm.intern("value");
    let index = vm.intern("index");
    let other = vm.intern("other");

    fallback(
        vm,
        op_module,
        Op::Call,
        "dynamic_call",
        FuncSig::red(vec![Param::new(obj, b.dynamic)], b.dynamic).with_variadic(b.dynamic),
        dynamic_call,
    )?;
    fallback(
        vm,
        op_module,
        Op::GetAttr,
        "dynamic_getattr",
        FuncSig::red(
            vec![Param::new(obj, b.dynamic), Param::new(attr, b.str_)],
            b.dynamic,
        ),
        dynamic_getattr,
    )?;
    fallback(
        vm,
        op_module,
        Op::SetAttr,
        "dynamic_setattr",
        FuncSig::red(
            vec![
                Param::new(obj, b.dynamic),
                Param::new(attr, b.str_),
                Param::new(value, b.dynamic),
            ],
            b.void,
        ),
        dynamic_setattr,
    )?;
    fallback(
        vm,
        op_module,
        Op::GetItem,
        "dynamic_getitem",
        FuncSig::red(
            vec![Param::new(obj, b.dynamic), Param::new(index, b.dynamic)],
            b.dynamic,
        ),
        dynamic_getitem,
    )?;
    fallback(
        vm,
        op_module,
        Op::SetItem,
        "dynamic_setitem",
        FuncSig::red(
            vec![
                Param::new(obj, b.dynamic),
                Param::new(index, b.dynamic),
                Param::new(value, b.dynamic),
            ],
            b.dynamic,
        ),
        dynamic_setitem,
    )?;
    fallback(
        vm,
        op_module,
        Op::Eq,
        "dynamic_eq",
        FuncSig::red(
            vec![Param::new(obj, b.dynamic), Param::new(other, b.dynamic)],
            b.bool_,
        ),
        dynamic_eq,
    )?;
    fallback(
        vm,
        op_module,
        Op::Ne,
        "dynamic_ne",
        FuncSig::red(
            vec![Param::new(obj, b.dynamic), Param::new(other, b.dynamic)],
            b.bool_,
        ),
        dynamic_ne,
    )?;

    Ok(())
}
