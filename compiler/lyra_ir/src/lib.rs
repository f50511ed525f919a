//! Intermediate representation types for the Lyra runtime.
//!
//! This crate defines the interned identifier machinery (`Name`,
//! `StringInterner`), source spans, fully-qualified names, and the flat
//! expression arena that function bodies live in.
//!
//! Design rules:
//! - IDs are plain `u32` newtypes; no boxing in the IR.
//! - Everything that can end up in a memoization key implements `Eq` + `Hash`
//!   (floats are stored as bits for this reason).
//! - Spans annotate but never participate in equality.

mod arena;
mod ast;
mod expr_id;
mod fqn;
mod interner;
mod name;
mod span;

pub use arena::ExprArena;
pub use ast::{BinaryOp, Expr, ExprKind, Literal};
pub use expr_id::{ExprId, TypeId};
pub use fqn::{Fqn, FqnDisplay};
pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use span::Span;
