//! AST evaluation.
//!
//! Function bodies are single expressions; evaluation walks the tree,
//! routing every operator node through dispatch and the call engine. At
//! evaluation time every operand is blue (its value is in hand), so dispatch
//! sees fully-known operand descriptions.

use crate::errors::{internal, undefined_name, VmResult};
use crate::operators;
use crate::opimpl::{OpArg, OpImpl};
use crate::value::{FuncValue, Value};
use crate::vm::Vm;
use lyra_ir::{ExprId, ExprKind, Name, Span};
use lyra_types::OperatorKind;
use rustc_hash::FxHashMap;
use std::sync::Arc;

type Locals = FxHashMap<Name, Value>;

/// Execute an AST-bodied function with already-checked arguments.
pub(crate) fn call_ast(
    vm: &mut Vm,
    func: &Arc<FuncValue>,
    root: ExprId,
    args: &[Value],
) -> VmResult<Value> {
    let mut locals = Locals::default();
    for (param, arg) in func.sig.params.iter().zip(args) {
        locals.insert(param.name, arg.clone());
    }
    eval_expr(vm, &locals, root)
}

fn eval_expr(vm: &mut Vm, locals: &Locals, id: ExprId) -> VmResult<Value> {
    let expr = vm.arena().get(id).clone();
    let span = expr.span;
    match expr.kind {
        ExprKind::Literal(lit) => Ok(Value::from_literal(lit, vm.interner())),
        ExprKind::Global(fqn) => vm.lookup_global(fqn).ok_or_else(|| {
            undefined_name(fqn.display(vm.interner()).to_string()).at(span)
        }),
        ExprKind::Local(name) => locals.get(&name).cloned().ok_or_else(|| {
            undefined_name(vm.interner().lookup(name)).at(span)
        }),
        ExprKind::Binary { op, lhs, rhs } => {
            let operands = eval_operands(vm, locals, &[lhs, rhs])?;
            dispatch_and_invoke(vm, OperatorKind::from_binary(op), operands, span)
        }
        ExprKind::GetItem { target, index } => {
            let operands = eval_operands(vm, locals, &[target, index])?;
            dispatch_and_invoke(vm, OperatorKind::GetItem, operands, span)
        }
        ExprKind::SetItem {
            target,
            index,
            value,
        } => {
            let operands = eval_operands(vm, locals, &[target, index, value])?;
            dispatch_and_invoke(vm, OperatorKind::SetItem, operands, span)
        }
        ExprKind::GetAttr { target, attr } => {
            let mut operands = eval_operands(vm, locals, &[target])?;
            operands.push((Value::str(vm.interner().lookup(attr)), span));
            dispatch_and_invoke(vm, OperatorKind::GetAttr, operands, span)
        }
        ExprKind::SetAttr {
            target,
            attr,
            value,
        } => {
            let mut operands = eval_operands(vm, locals, &[target])?;
            operands.push((Value::str(vm.interner().lookup(attr)), span));
            let (value, value_span) = eval_operand(vm, locals, value)?;
            operands.push((value, value_span));
            dispatch_and_invoke(vm, OperatorKind::SetAttr, operands, span)
        }
        ExprKind::Call { callee, args } => {
            let mut ids = Vec::with_capacity(args.len() + 1);
            ids.push(callee);
            ids.extend_from_slice(&args);
            let operands = eval_operands(vm, locals, &ids)?;
            dispatch_and_invoke(vm, OperatorKind::Call, operands, span)
                .map_err(|e| e.called_from(span))
        }
        ExprKind::CallMethod {
            target,
            method,
            args,
        } => {
            let mut operands = eval_operands(vm, locals, &[target])?;
            operands.push((Value::str(vm.interner().lookup(method)), span));
            for arg in args {
                operands.push(eval_operand(vm, locals, arg)?);
            }
            dispatch_and_invoke(vm, OperatorKind::CallMethod, operands, span)
                .map_err(|e| e.called_from(span))
        }
    }
}

fn eval_operand(vm: &mut Vm, locals: &Locals, id: ExprId) -> VmResult<(Value, Span)> {
    let span = vm.arena().span(id);
    Ok((eval_expr(vm, locals, id)?, span))
}

fn eval_operands(vm: &mut Vm, locals: &Locals, ids: &[ExprId]) -> VmResult<Vec<(Value, Span)>> {
    ids.iter().map(|&id| eval_operand(vm, locals, id)).collect()
}

fn dispatch_and_invoke(
    vm: &mut Vm,
    kind: OperatorKind,
    operands: Vec<(Value, Span)>,
    span: Span,
) -> VmResult<Value> {
    let opargs: Vec<OpArg> = operands
        .iter()
        .enumerate()
        .map(|(i, (value, op_span))| {
            let index = u32::try_from(i).unwrap_or(u32::MAX);
            OpArg::blue(vm.dynamic_type(value), value.clone(), *op_span).with_operand(index)
        })
        .collect();
    let opimpl = operators::resolve(vm, kind, &opargs, span)?;
    invoke_opimpl(vm, &opimpl)
}

/// Dispatch an operator over runtime values. Used by the `operator` module's
/// dynamic fallbacks, where operand types are only known now.
pub(crate) fn dispatch_values(vm: &mut Vm, kind: OperatorKind, values: &[Value]) -> VmResult<Value> {
    let operands: Vec<(Value, Span)> = values
        .iter()
        .map(|v| (v.clone(), Span::DUMMY))
        .collect();
    dispatch_and_invoke(vm, kind, operands, Span::DUMMY)
}

/// Execute a checked dispatch outcome whose arguments are all blue.
///
/// Immediate invocation requires every argument value in hand; a red
/// argument here means dispatch produced something only the redshift pass
/// could consume, which is an engine bug.
pub(crate) fn invoke_opimpl(vm: &mut Vm, opimpl: &OpImpl) -> VmResult<Value> {
    match opimpl {
        OpImpl::Null => Err(internal("null opimpl survived type checking")),
        OpImpl::Const(value) => Ok(value.clone()),
        OpImpl::Call { func, args } => {
            let mut argv = Vec::with_capacity(args.len());
            for arg in args {
                let Some(value) = arg.blue_value() else {
                    return Err(internal("non-blue argument in immediate opimpl invocation"));
                };
                argv.push(value.clone());
            }
            vm.call_function(&Value::Func(Arc::clone(func)), &argv)
        }
    }
}
