//! Operator dispatch.
//!
//! Dispatch maps `(operator, operand descriptions)` to an [`OpImpl`] by
//! consulting, in order: call special-casing for function-typed receivers,
//! the dynamic fallbacks, declared members (attribute access only), the
//! receiver type's bound resolver, and finally its conventional method
//! table. The outcome is type checked exactly once before it is returned.

use crate::errors::{internal, unsupported_operator, VmResult};
use crate::opimpl::{OpArg, OpImpl};
use crate::typecheck;
use crate::value::{FuncBody, FuncValue, Value};
use crate::vm::Vm;
use lyra_diagnostic::Severity;
use lyra_ir::{Name, Span, TypeId};
use lyra_types::{FuncKind, FuncSig, Member, OperatorKind, Param};
use std::sync::Arc;

/// Resolve an operator over its operands to a checked [`OpImpl`].
pub(crate) fn resolve(
    vm: &mut Vm,
    kind: OperatorKind,
    operands: &[OpArg],
    span: Span,
) -> VmResult<OpImpl> {
    if operands.is_empty() {
        return Err(internal("operator dispatched with no operands"));
    }
    let opimpl = resolve_raw(vm, kind, operands)?;
    let errmsg = error_template(vm, kind, operands)?;
    typecheck::typecheck_opimpl(vm, opimpl, operands, &errmsg, kind.is_binary(), span)
}

fn resolve_raw(vm: &mut Vm, kind: OperatorKind, operands: &[OpArg]) -> VmResult<OpImpl> {
    let recv = &operands[0];

    // Function-typed receivers bind calls directly, without a resolver.
    if kind == OperatorKind::Call {
        if let Some(sig) = vm.types().sig_of(recv.ty).cloned() {
            match sig.kind {
                FuncKind::Plain => {
                    if let Some(Value::Func(func)) = recv.blue_value() {
                        return Ok(OpImpl::call(Arc::clone(func), operands[1..].to_vec()));
                    }
                    // The callee value is only known at runtime, but its
                    // static signature is not: check the arguments here and
                    // defer only the binding to the dynamic-call fallback.
                    typecheck::check_sig_args(vm, &sig, &operands[1..])?;
                    return fallback_impl(vm, kind, operands);
                }
                FuncKind::Generic => {
                    return Err(unsupported_operator(
                        "generic functions must be instantiated via `[...]` before calling",
                    )
                    .with_note(
                        Severity::Error,
                        "this function is generic",
                        Some(recv.span),
                    ));
                }
            }
        }
    }

    // 1. Dynamic receivers defer the whole dispatch to runtime.
    if vm.types().is_dynamic(recv.ty) {
        return fallback_impl(vm, kind, operands);
    }

    // 2. Declared members resolve attribute access directly.
    if kind.is_attr_access() {
        let attr = blue_attr(vm, operands)?;
        if let Some(member) = vm.types().find_member(recv.ty, attr) {
            return member_accessor(vm, kind, recv.ty, member, attr, operands);
        }
    }

    // 3. The receiver type's bound resolver.
    if let Some(resolver_fqn) = vm.types().find_resolver(recv.ty, kind) {
        return call_resolver(vm, resolver_fqn, operands);
    }

    // 4. Conventional methods.
    if kind == OperatorKind::CallMethod {
        return method_call_impl(vm, operands);
    }
    let method = vm.intern(kind.method_name());
    if let Some(method_fqn) = vm.types().find_method(recv.ty, method) {
        let func = lookup_func(vm, method_fqn)?;
        return Ok(OpImpl::call(func, operands.to_vec()));
    }

    // 5. Nothing applies.
    Ok(OpImpl::Null)
}

/// Message template for the "no implementation" error, with `{i}`
/// placeholders for operand type names.
fn error_template(vm: &Vm, kind: OperatorKind, operands: &[OpArg]) -> VmResult<String> {
    Ok(match kind {
        OperatorKind::Call => "cannot call objects of type `{0}`".to_owned(),
        OperatorKind::GetItem => "cannot do `{0}`[...]".to_owned(),
        OperatorKind::SetItem => "cannot do `{0}`[...] = ...".to_owned(),
        OperatorKind::GetAttr => {
            let attr = blue_attr(vm, operands)?;
            format!(
                "type `{{0}}` has no attribute '{}'",
                vm.interner().lookup(attr)
            )
        }
        OperatorKind::SetAttr => {
            let attr = blue_attr(vm, operands)?;
            format!(
                "type `{{0}}` does not support assignment to attribute '{}'",
                vm.interner().lookup(attr)
            )
        }
        OperatorKind::CallMethod => {
            let method = blue_attr(vm, operands)?;
            format!(
                "method `{{0}}::{}` does not exist",
                vm.interner().lookup(method)
            )
        }
        _ => format!("cannot do `{{0}}` {} `{{1}}`", kind.token()),
    })
}

/// The attribute/method-name operand, which must be a blue `str`.
fn blue_attr(vm: &Vm, operands: &[OpArg]) -> VmResult<Name> {
    match operands.get(1).and_then(OpArg::blue_value) {
        Some(Value::Str(s)) => Ok(vm.intern(s)),
        _ => Err(internal("attribute name operand must be a blue `str`")),
    }
}

/// Synthesize a field accessor for a declared member.
///
/// The accessor gets a fresh suffixed name under the receiver type's name;
/// it is not registered as a global unless the redshift pass later needs to
/// reference it from a rewritten body.
fn member_accessor(
    vm: &mut Vm,
    kind: OperatorKind,
    recv_ty: TypeId,
    member: Member,
    attr: Name,
    operands: &[OpArg],
) -> VmResult<OpImpl> {
    let b = *vm.types().builtins();
    let obj = vm.intern("obj");
    let attr_param = vm.intern("attr");

    let (accessor, params, ret, body) = match kind {
        OperatorKind::GetAttr => (
            format!("__get_{}__", vm.interner().lookup(attr)),
            vec![Param::new(obj, recv_ty), Param::new(attr_param, b.str_)],
            member.ty,
            FuncBody::GetField(member.field),
        ),
        OperatorKind::SetAttr => (
            format!("__set_{}__", vm.interner().lookup(attr)),
            vec![
                Param::new(obj, recv_ty),
                Param::new(attr_param, b.str_),
                Param::new(vm.intern("value"), member.ty),
            ],
            b.void,
            FuncBody::SetField(member.field),
        ),
        _ => return Err(internal("member accessor requested for a non-attribute operator")),
    };

    let type_name = vm.types().get(recv_ty).name;
    let accessor_name = vm.intern(&accessor);
    let fqn = vm.fresh_fqn(type_name, accessor_name);
    let sig = FuncSig::red(params, ret);
    let ty = vm.types_mut().func_type(sig.clone());
    let func = Arc::new(FuncValue::new(fqn, ty, sig, body));
    Ok(OpImpl::call(func, operands.to_vec()))
}

/// Invoke a bound resolver through the call engine.
///
/// Resolvers are blue functions over `OpArg` values returning an `OpImpl`
/// value; anything else is a broken registration.
fn call_resolver(vm: &mut Vm, resolver_fqn: lyra_ir::Fqn, operands: &[OpArg]) -> VmResult<OpImpl> {
    let Some(value) = vm.lookup_global(resolver_fqn) else {
        return Err(internal(format!(
            "resolver `{}` is not registered",
            resolver_fqn.display(vm.interner())
        )));
    };
    let Some(func) = value.as_func() else {
        return Err(internal(format!(
            "resolver `{}` is not a function (got `{}`)",
            resolver_fqn.display(vm.interner()),
            vm.type_name_of(&value)
        )));
    };
    if !func.is_blue() {
        return Err(internal(format!(
            "resolver `{}` must be blue",
            resolver_fqn.display(vm.interner())
        )));
    }

    let args: Vec<Value> = operands
        .iter()
        .map(|op| Value::OpArg(Arc::new(op.clone())))
        .collect();
    let result = vm.call_function(&value, &args)?;
    match result {
        Value::OpImpl(opimpl) => Ok((*opimpl).clone()),
        other => Err(internal(format!(
            "resolver `{}` returned `{}` instead of `OpImpl`",
            resolver_fqn.display(vm.interner()),
            vm.type_name_of(&other)
        ))),
    }
}

/// Method-call dispatch: bind the named method with the receiver prepended
/// to the remaining arguments.
fn method_call_impl(vm: &mut Vm, operands: &[OpArg]) -> VmResult<OpImpl> {
    let method = blue_attr(vm, operands)?;
    let recv = &operands[0];
    let Some(method_fqn) = vm.types().find_method(recv.ty, method) else {
        return Ok(OpImpl::Null);
    };
    let func = lookup_func(vm, method_fqn)?;
    let mut args = Vec::with_capacity(operands.len() - 1);
    args.push(recv.clone());
    args.extend_from_slice(&operands[2..]);
    Ok(OpImpl::call(func, args))
}

/// Runtime fallback from the `operator` module, if one is installed for
/// this operator.
fn fallback_impl(vm: &Vm, kind: OperatorKind, operands: &[OpArg]) -> VmResult<OpImpl> {
    let Some(fqn) = vm.fallback(kind) else {
        return Ok(OpImpl::Null);
    };
    let func = lookup_func(vm, fqn)?;
    Ok(OpImpl::call(func, operands.to_vec()))
}

/// Resolve a method-table or fallback FQN to its function value.
fn lookup_func(vm: &Vm, fqn: lyra_ir::Fqn) -> VmResult<Arc<FuncValue>> {
    match vm.lookup_global(fqn) {
        Some(Value::Func(func)) => Ok(func),
        Some(other) => Err(internal(format!(
            "`{}` bound in a dispatch table is not a function (got `{}`)",
            fqn.display(vm.interner()),
            vm.type_name_of(&other)
        ))),
        None => Err(internal(format!(
            "`{}` bound in a dispatch table is not registered",
            fqn.display(vm.interner())
        ))),
    }
}
