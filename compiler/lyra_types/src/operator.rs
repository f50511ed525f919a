//! Operator tags for the dispatch protocol.

use lyra_ir::BinaryOp;
use std::fmt;

/// Explicit tag for every dispatchable operator.
///
/// Types bind resolvers per tag (and conventional methods per the tag's
/// method name), so dispatch never inspects function names.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum OperatorKind {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    GetItem,
    SetItem,
    GetAttr,
    SetAttr,
    Call,
    CallMethod,
}

impl OperatorKind {
    pub const fn from_binary(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Add => OperatorKind::Add,
            BinaryOp::Sub => OperatorKind::Sub,
            BinaryOp::Mul => OperatorKind::Mul,
            BinaryOp::Div => OperatorKind::Div,
            BinaryOp::Eq => OperatorKind::Eq,
            BinaryOp::Ne => OperatorKind::Ne,
            BinaryOp::Lt => OperatorKind::Lt,
            BinaryOp::Le => OperatorKind::Le,
            BinaryOp::Gt => OperatorKind::Gt,
            BinaryOp::Ge => OperatorKind::Ge,
        }
    }

    /// Conventional method name consulted when no resolver is bound.
    pub const fn method_name(self) -> &'static str {
        match self {
            OperatorKind::Add => "__add__",
            OperatorKind::Sub => "__sub__",
            OperatorKind::Mul => "__mul__",
            OperatorKind::Div => "__div__",
            OperatorKind::Eq => "__eq__",
            OperatorKind::Ne => "__ne__",
            OperatorKind::Lt => "__lt__",
            OperatorKind::Le => "__le__",
            OperatorKind::Gt => "__gt__",
            OperatorKind::Ge => "__ge__",
            OperatorKind::GetItem => "__getitem__",
            OperatorKind::SetItem => "__setitem__",
            OperatorKind::GetAttr => "__getattr__",
            OperatorKind::SetAttr => "__setattr__",
            OperatorKind::Call => "__call__",
            OperatorKind::CallMethod => "__call_method__",
        }
    }

    /// Source-level token, used in error messages.
    pub const fn token(self) -> &'static str {
        match self {
            OperatorKind::Add => "+",
            OperatorKind::Sub => "-",
            OperatorKind::Mul => "*",
            OperatorKind::Div => "/",
            OperatorKind::Eq => "==",
            OperatorKind::Ne => "!=",
            OperatorKind::Lt => "<",
            OperatorKind::Le => "<=",
            OperatorKind::Gt => ">",
            OperatorKind::Ge => ">=",
            OperatorKind::GetItem => "[]",
            OperatorKind::SetItem => "[]=",
            OperatorKind::GetAttr => ".",
            OperatorKind::SetAttr => ".=",
            OperatorKind::Call => "()",
            OperatorKind::CallMethod => ".()",
        }
    }

    /// True for the attribute access pair, which gets member-table and
    /// wrapper-origin handling in dispatch.
    pub const fn is_attr_access(self) -> bool {
        matches!(self, OperatorKind::GetAttr | OperatorKind::SetAttr)
    }

    /// True for operators whose error messages name both operand types.
    pub const fn is_binary(self) -> bool {
        matches!(
            self,
            OperatorKind::Add
                | OperatorKind::Sub
                | OperatorKind::Mul
                | OperatorKind::Div
                | OperatorKind::Eq
                | OperatorKind::Ne
                | OperatorKind::Lt
                | OperatorKind::Le
                | OperatorKind::Gt
                | OperatorKind::Ge
        )
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_mapping() {
        assert_eq!(OperatorKind::from_binary(BinaryOp::Add), OperatorKind::Add);
        assert_eq!(OperatorKind::from_binary(BinaryOp::Ge), OperatorKind::Ge);
    }

    #[test]
    fn method_names_follow_convention() {
        assert_eq!(OperatorKind::Add.method_name(), "__add__");
        assert_eq!(OperatorKind::GetItem.method_name(), "__getitem__");
        assert_eq!(OperatorKind::CallMethod.method_name(), "__call_method__");
    }

    #[test]
    fn attr_access_classification() {
        assert!(OperatorKind::GetAttr.is_attr_access());
        assert!(OperatorKind::SetAttr.is_attr_access());
        assert!(!OperatorKind::GetItem.is_attr_access());
        assert!(!OperatorKind::Call.is_attr_access());
    }
}
