//! Type checking of dispatch outcomes.
//!
//! Every `OpImpl` passes through here exactly once, at the dispatch site.
//! After this check the engine may invoke the opimpl without re-validating:
//! a `Null` never escapes, and a `Call` is known to be arity- and
//! type-compatible with its arguments.

use crate::errors::{arg_count_mismatch, unsupported_operator, VmErrorKind, VmResult};
use crate::opimpl::{OpArg, OpImpl};
use crate::vm::Vm;
use lyra_diagnostic::Severity;
use lyra_ir::Span;
use lyra_types::FuncSig;

/// Replace `{0}`, `{1}`, ... in `template` with operand type names.
fn substitute(template: &str, names: &[&str]) -> String {
    let mut out = template.to_owned();
    for (i, name) in names.iter().enumerate() {
        out = out.replace(&format!("{{{i}}}"), name);
    }
    out
}

/// Validate a dispatch outcome against the operands it was resolved for.
///
/// `errmsg` is the operator's message template with `{i}` placeholders for
/// operand type names. `multi` selects whether all operands or just the
/// receiver get a "this is ..." label on failure.
pub(crate) fn typecheck_opimpl(
    vm: &Vm,
    opimpl: OpImpl,
    operands: &[OpArg],
    errmsg: &str,
    multi: bool,
    span: Span,
) -> VmResult<OpImpl> {
    match &opimpl {
        OpImpl::Null => {
            let names: Vec<&str> = operands
                .iter()
                .map(|op| vm.types().type_name(op.ty))
                .collect();
            let mut err = unsupported_operator(substitute(errmsg, &names));
            let labeled = if multi { operands } else { &operands[..1] };
            for op in labeled {
                err = err.with_note(
                    Severity::Error,
                    format!("this is `{}`", vm.types().type_name(op.ty)),
                    Some(op.span),
                );
            }
            Err(err)
        }
        OpImpl::Const(_) => Ok(opimpl),
        OpImpl::Call { func, args } => {
            if let Err(err) = check_sig_args(vm, &func.sig, args) {
                return Err(match err.kind {
                    VmErrorKind::ArgCountMismatch { .. } => {
                        err.with_note(Severity::Error, "in this operation", Some(span))
                    }
                    _ => err,
                });
            }
            Ok(opimpl)
        }
    }
}

/// Check an argument tuple's static types against a signature.
///
/// Also used at dispatch time for calls whose callee value is only known at
/// runtime: the static signature still pins down what the arguments must be.
pub(crate) fn check_sig_args(vm: &Vm, sig: &FuncSig, args: &[OpArg]) -> VmResult<()> {
    let expected = sig.arity();
    let arity_ok = match sig.variadic {
        Some(_) => args.len() >= expected,
        None => args.len() == expected,
    };
    if !arity_ok {
        return Err(arg_count_mismatch(expected, args.len()));
    }
    for (param, arg) in sig.params.iter().zip(args) {
        check_arg(vm, arg, param.ty)?;
    }
    if let Some(elem) = sig.variadic {
        for arg in &args[expected..] {
            check_arg(vm, arg, elem)?;
        }
    }
    Ok(())
}

fn check_arg(vm: &Vm, arg: &OpArg, expected: lyra_ir::TypeId) -> VmResult<()> {
    if vm.types().is_subtype(arg.ty, expected) {
        return Ok(());
    }
    let exp = vm.types().type_name(expected);
    let got = vm.types().type_name(arg.ty);
    Err(crate::errors::type_mismatch(exp, got).with_note(
        Severity::Error,
        format!("expected `{exp}`, got `{got}`"),
        Some(arg.span),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn substitute_positional() {
        assert_eq!(
            substitute("cannot do `{0}` + `{1}`", &["i32", "str"]),
            "cannot do `i32` + `str`"
        );
        assert_eq!(substitute("cannot call `{0}`", &["f64"]), "cannot call `f64`");
    }
}
