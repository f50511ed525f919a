//! The Lyra runtime core.
//!
//! A [`Vm`] is a self-contained session: object model, type registry,
//! operator dispatch, the two-color call engine and the redshift pass.
//!
//! The moving parts:
//! - **Values** ([`Value`]) are typed runtime objects; every value's
//!   concrete type is a [`lyra_ir::TypeId`] in the session's registry.
//! - **Operator dispatch** maps `(operator, operand descriptions)` to an
//!   [`OpImpl`] through a fixed precedence chain; outcomes are type checked
//!   once, at the dispatch site.
//! - **The call engine** routes blue (compile-time) calls through a
//!   value-keyed memo and executes red (runtime) calls directly.
//! - **Redshift** ([`reduce_all`]) rewrites red function bodies to fixpoint,
//!   folding blue sub-expressions and pinning every operator node to its
//!   resolved implementation.

mod blue_cache;
mod builtins;
mod errors;
mod eval;
mod module_registry;
mod operators;
mod opimpl;
mod redshift;
mod typecheck;
mod value;
mod vm;

pub use errors::{
    arg_count_mismatch, internal, type_mismatch, undefined_name, unsupported_operator, VmError,
    VmErrorKind, VmNote, VmResult,
};
pub use module_registry::ModuleRegistry;
pub use opimpl::{OpArg, OpImpl};
pub use redshift::reduce_all;
pub use value::{FuncBody, FuncValue, Instance, NativeFn, Value};
pub use vm::Vm;
