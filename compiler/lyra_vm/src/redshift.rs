//! The redshift pass: iterative blue-elimination over global functions.
//!
//! Each sweep rewrites every red AST-bodied global that has not been
//! rewritten yet: blue sub-expressions are evaluated now and replaced by
//! their results, red operator nodes are replaced by direct calls to their
//! resolved implementations. Rewriting can register new globals (including
//! new red functions), so sweeps repeat until none are pending.

use crate::errors::{internal, undefined_name, VmResult};
use crate::operators;
use crate::opimpl::{OpArg, OpImpl};
use crate::value::{FuncBody, FuncValue, Value};
use crate::vm::Vm;
use lyra_ir::{ExprId, ExprKind, Literal, Name, Span, TypeId};
use lyra_types::OperatorKind;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Rewrite every pending red function to fixpoint.
///
/// Returns the number of functions rewritten. A session where redshift has
/// converged returns 0 and changes nothing.
pub fn reduce_all(vm: &mut Vm) -> VmResult<usize> {
    let mut total = 0usize;
    loop {
        let pending: Vec<Arc<FuncValue>> = vm
            .global_entries()
            .into_iter()
            .filter_map(|(_, value)| match value {
                Value::Func(f) if f.has_ast_body() && !f.is_blue() && !f.redshifted => Some(f),
                _ => None,
            })
            .collect();
        if pending.is_empty() {
            break;
        }
        tracing::debug!(count = pending.len(), "redshift sweep");
        for func in pending {
            reduce_func(vm, &func)?;
            total += 1;
        }
    }
    Ok(total)
}

/// Rewrite one function body and replace its global entry.
pub(crate) fn reduce_func(vm: &mut Vm, func: &Arc<FuncValue>) -> VmResult<()> {
    if func.redshifted {
        return Err(internal(format!(
            "function `{}` reduced twice",
            func.fqn.display(vm.interner())
        )));
    }
    let FuncBody::Ast(root) = func.body else {
        return Err(internal(format!(
            "function `{}` has no rewritable body",
            func.fqn.display(vm.interner())
        )));
    };
    tracing::debug!(func = %func.fqn.display(vm.interner()), "redshift");

    let mut params = FxHashMap::default();
    for param in &func.sig.params {
        params.insert(param.name, param.ty);
    }
    let mut rewriter = Rewriter {
        vm,
        params,
        module: func.fqn.module,
        attr: func.fqn.attr,
    };
    let shifted = rewriter.shift(root)?;

    let mut reduced = FuncValue::new(func.fqn, func.ty, func.sig.clone(), FuncBody::Ast(shifted.id));
    reduced.redshifted = true;
    vm.store_global(func.fqn, Value::Func(Arc::new(reduced)))
}

/// A rewritten sub-expression: its new node, its static type, and its value
/// when that value is known now.
struct Shifted {
    id: ExprId,
    ty: TypeId,
    blue: Option<Value>,
    span: Span,
}

struct Rewriter<'a> {
    vm: &'a mut Vm,
    /// Parameter types of the function being rewritten. Parameters are the
    /// red leaves.
    params: FxHashMap<Name, TypeId>,
    module: Name,
    attr: Name,
}

impl Rewriter<'_> {
    fn shift(&mut self, id: ExprId) -> VmResult<Shifted> {
        let expr = self.vm.arena().get(id).clone();
        let span = expr.span;
        match expr.kind {
            ExprKind::Literal(lit) => {
                let value = Value::from_literal(lit, self.vm.interner());
                let ty = self.vm.dynamic_type(&value);
                let id = self.vm.arena_mut().alloc(ExprKind::Literal(lit), span);
                Ok(Shifted {
                    id,
                    ty,
                    blue: Some(value),
                    span,
                })
            }
            ExprKind::Global(fqn) => {
                let Some(value) = self.vm.lookup_global(fqn) else {
                    return Err(undefined_name(
                        fqn.display(self.vm.interner()).to_string(),
                    )
                    .at(span));
                };
                let ty = self.vm.dynamic_type(&value);
                let id = self.vm.arena_mut().alloc(ExprKind::Global(fqn), span);
                Ok(Shifted {
                    id,
                    ty,
                    blue: Some(value),
                    span,
                })
            }
            ExprKind::Local(name) => {
                let Some(&ty) = self.params.get(&name) else {
                    return Err(undefined_name(self.vm.interner().lookup(name)).at(span));
                };
                let id = self.vm.arena_mut().alloc(ExprKind::Local(name), span);
                Ok(Shifted {
                    id,
                    ty,
                    blue: None,
                    span,
                })
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let operands = self.shift_many(&[lhs, rhs])?;
                self.shift_operator(OperatorKind::from_binary(op), operands, span)
            }
            ExprKind::GetItem { target, index } => {
                let operands = self.shift_many(&[target, index])?;
                self.shift_operator(OperatorKind::GetItem, operands, span)
            }
            ExprKind::SetItem {
                target,
                index,
                value,
            } => {
                let operands = self.shift_many(&[target, index, value])?;
                self.shift_operator(OperatorKind::SetItem, operands, span)
            }
            ExprKind::GetAttr { target, attr } => {
                let operands = vec![self.shift(target)?, self.literal_str(attr, span)];
                self.shift_operator(OperatorKind::GetAttr, operands, span)
            }
            ExprKind::SetAttr {
                target,
                attr,
                value,
            } => {
                let operands = vec![
                    self.shift(target)?,
                    self.literal_str(attr, span),
                    self.shift(value)?,
                ];
                self.shift_operator(OperatorKind::SetAttr, operands, span)
            }
            ExprKind::Call { callee, args } => {
                let mut ids = Vec::with_capacity(args.len() + 1);
                ids.push(callee);
                ids.extend_from_slice(&args);
                let operands = self.shift_many(&ids)?;
                self.shift_operator(OperatorKind::Call, operands, span)
                    .map_err(|e| e.called_from(span))
            }
            ExprKind::CallMethod {
                target,
                method,
                args,
            } => {
                let mut operands = vec![self.shift(target)?, self.literal_str(method, span)];
                for arg in args {
                    operands.push(self.shift(arg)?);
                }
                self.shift_operator(OperatorKind::CallMethod, operands, span)
                    .map_err(|e| e.called_from(span))
            }
        }
    }

    fn shift_many(&mut self, ids: &[ExprId]) -> VmResult<Vec<Shifted>> {
        ids.iter().map(|&id| self.shift(id)).collect()
    }

    /// A synthesized blue `str` operand for an attribute or method name.
    fn literal_str(&mut self, name: Name, span: Span) -> Shifted {
        let value = Value::str(self.vm.interner().lookup(name));
        let ty = self.vm.types().builtins().str_;
        let id = self
            .vm
            .arena_mut()
            .alloc(ExprKind::Literal(Literal::Str(name)), span);
        Shifted {
            id,
            ty,
            blue: Some(value),
            span,
        }
    }

    /// Dispatch an operator over rewritten operands, then either fold the
    /// result or emit a residual call.
    fn shift_operator(
        &mut self,
        kind: OperatorKind,
        operands: Vec<Shifted>,
        span: Span,
    ) -> VmResult<Shifted> {
        let opargs: Vec<OpArg> = operands
            .iter()
            .enumerate()
            .map(|(i, s)| OpArg {
                ty: s.ty,
                blue: s.blue.clone(),
                span: s.span,
                operand: Some(u32::try_from(i).unwrap_or(u32::MAX)),
            })
            .collect();
        let opimpl = operators::resolve(self.vm, kind, &opargs, span).map_err(|e| e.at(span))?;

        match opimpl {
            OpImpl::Null => Err(internal("null opimpl survived type checking")),
            OpImpl::Const(value) => self.materialize(value, span),
            OpImpl::Call { func, args } => {
                if func.is_blue() && args.iter().all(OpArg::is_blue) {
                    // The whole operation is blue: evaluate it now.
                    let mut argv = Vec::with_capacity(args.len());
                    for arg in &args {
                        let Some(value) = arg.blue_value() else {
                            return Err(internal("blue argument lost its value"));
                        };
                        argv.push(value.clone());
                    }
                    let result = self
                        .vm
                        .call_function(&Value::Func(Arc::clone(&func)), &argv)
                        .map_err(|e| e.at(span))?;
                    self.materialize(result, span)
                } else {
                    self.emit_residual_call(&func, &args, &operands, span)
                }
            }
        }
    }

    /// Emit a direct call to the resolved implementation, mapping resolver
    /// arguments back onto rewritten operand expressions.
    fn emit_residual_call(
        &mut self,
        func: &Arc<FuncValue>,
        args: &[OpArg],
        operands: &[Shifted],
        span: Span,
    ) -> VmResult<Shifted> {
        let callee = self.materialize_func_ref(func, span)?;
        let mut arg_ids = Vec::with_capacity(args.len());
        for arg in args {
            match arg.operand {
                Some(i) => {
                    let Some(operand) = operands.get(i as usize) else {
                        return Err(internal(format!(
                            "resolver referenced operand {i} of {}",
                            operands.len()
                        )));
                    };
                    arg_ids.push(operand.id);
                }
                None => {
                    // Resolver-synthesized argument: must be blue, becomes a
                    // materialized constant in the rewritten body.
                    let Some(value) = arg.blue_value() else {
                        return Err(internal("resolver synthesized a red argument"));
                    };
                    arg_ids.push(self.materialize(value.clone(), arg.span)?.id);
                }
            }
        }
        let id = self.vm.arena_mut().alloc(
            ExprKind::Call {
                callee: callee.id,
                args: arg_ids,
            },
            span,
        );
        Ok(Shifted {
            id,
            ty: func.sig.ret,
            blue: None,
            span,
        })
    }

    /// Turn a known value into an expression: scalars become literals,
    /// everything else is referenced through a global (registering one if
    /// the value has none yet).
    fn materialize(&mut self, value: Value, span: Span) -> VmResult<Shifted> {
        if let Some(lit) = value.as_literal(self.vm.interner()) {
            let ty = self.vm.dynamic_type(&value);
            let id = self.vm.arena_mut().alloc(ExprKind::Literal(lit), span);
            return Ok(Shifted {
                id,
                ty,
                blue: Some(value),
                span,
            });
        }
        if let Value::Func(func) = &value {
            let func = Arc::clone(func);
            return self.materialize_func_ref(&func, span);
        }
        let ty = self.vm.dynamic_type(&value);
        let fqn = match self.vm.reverse_lookup_global(&value) {
            Some(fqn) => fqn,
            None => {
                let fqn = self.vm.fresh_fqn(self.module, self.attr);
                self.vm.add_global(fqn, None, value.clone())?;
                fqn
            }
        };
        let id = self.vm.arena_mut().alloc(ExprKind::Global(fqn), span);
        Ok(Shifted {
            id,
            ty,
            blue: Some(value),
            span,
        })
    }

    /// Reference a function value through a global, preferring its own name
    /// when that name is free.
    fn materialize_func_ref(&mut self, func: &Arc<FuncValue>, span: Span) -> VmResult<Shifted> {
        let value = Value::Func(Arc::clone(func));
        let fqn = match self.vm.reverse_lookup_global(&value) {
            Some(fqn) => fqn,
            None if !self.vm.has_global(func.fqn) => {
                self.vm.add_global(func.fqn, None, value.clone())?;
                func.fqn
            }
            None => {
                // The stem is occupied by a different value; allocate afresh.
                let fqn = self.vm.fresh_fqn(self.module, self.attr);
                self.vm.add_global(fqn, None, value.clone())?;
                fqn
            }
        };
        let id = self.vm.arena_mut().alloc(ExprKind::Global(fqn), span);
        Ok(Shifted {
            id,
            ty: func.ty,
            blue: Some(value),
            span,
        })
    }
}
