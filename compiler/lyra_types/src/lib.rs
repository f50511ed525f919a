//! Type registry and operator protocol tables for the Lyra runtime.
//!
//! A session owns a single [`TypeRegistry`]: an append-only, single-rooted
//! type lattice. Every type carries three dispatch tables (members, operator
//! resolvers, conventional methods) that the operator protocol consults in
//! priority order.

mod operator;
mod registry;
mod sig;

pub use operator::OperatorKind;
pub use registry::{Builtins, Member, TypeData, TypeKind, TypeRegistry};
pub use sig::{Color, FuncKind, FuncSig, Param};
