//! Runtime error values.
//!
//! Errors carry a structured kind plus an ordered list of notes. Notes are
//! appended as the error propagates outward through call expressions, so the
//! final diagnostic shows the full chain from failure site to entry point.

use lyra_diagnostic::{Diagnostic, ErrorCode, Label, Severity};
use lyra_ir::Span;
use std::fmt;

pub type VmResult<T> = Result<T, VmError>;

/// Structured error kinds for everything the runtime can reject.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VmErrorKind {
    /// A value or expression does not satisfy an expected type.
    TypeMismatch { expected: String, found: String },
    /// A call supplied the wrong number of arguments.
    ArgCountMismatch { expected: usize, actual: usize },
    /// No implementation exists for an operator on the given operand types.
    UnsupportedOperator { message: String },
    /// A name did not resolve to anything.
    NameResolution { name: String },
    /// A broken internal invariant. Never a user error.
    InternalConsistency { message: String },
}

fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

impl fmt::Display for VmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmErrorKind::TypeMismatch { expected, found } => {
                write!(f, "mismatched types: expected `{expected}`, got `{found}`")
            }
            VmErrorKind::ArgCountMismatch { expected, actual } => {
                write!(
                    f,
                    "this function takes {} but {} supplied",
                    count(*expected, "argument"),
                    if *actual == 1 {
                        format!("{} was", count(*actual, "argument"))
                    } else {
                        format!("{} were", count(*actual, "argument"))
                    }
                )
            }
            VmErrorKind::UnsupportedOperator { message } => f.write_str(message),
            VmErrorKind::NameResolution { name } => {
                write!(f, "name `{name}` is not defined")
            }
            VmErrorKind::InternalConsistency { message } => {
                write!(f, "internal consistency violation: {message}")
            }
        }
    }
}

/// One annotation on an error: severity, message, optional location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmNote {
    pub severity: Severity,
    pub message: String,
    pub span: Option<Span>,
}

/// A runtime error with its annotation chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmError {
    pub kind: VmErrorKind,
    pub notes: Vec<VmNote>,
}

impl VmError {
    pub fn new(kind: VmErrorKind) -> Self {
        VmError {
            kind,
            notes: Vec::new(),
        }
    }

    /// Append an annotation.
    #[must_use]
    pub fn with_note(
        mut self,
        severity: Severity,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        self.notes.push(VmNote {
            severity,
            message: message.into(),
            span,
        });
        self
    }

    /// Append a "called from here" annotation at a call boundary.
    #[must_use]
    pub fn called_from(self, span: Span) -> Self {
        self.with_note(Severity::Note, "called from here", Some(span))
    }

    /// Attach a location if the error has none yet.
    ///
    /// Used by the rewriting passes, where the innermost failure may come
    /// from a locationless computation.
    #[must_use]
    pub fn at(self, span: Span) -> Self {
        if self.notes.iter().any(|n| n.span.is_some()) {
            self
        } else {
            self.with_note(Severity::Error, "in this expression", Some(span))
        }
    }

    /// True for internal consistency failures, which indicate runtime bugs
    /// rather than user errors.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, VmErrorKind::InternalConsistency { .. })
    }

    pub fn code(&self) -> ErrorCode {
        match self.kind {
            VmErrorKind::TypeMismatch { .. } => ErrorCode::E2001,
            VmErrorKind::ArgCountMismatch { .. } => ErrorCode::E2002,
            VmErrorKind::UnsupportedOperator { .. } => ErrorCode::E2003,
            VmErrorKind::NameResolution { .. } => ErrorCode::E2004,
            VmErrorKind::InternalConsistency { .. } => ErrorCode::E9001,
        }
    }

    /// Convert to a reportable diagnostic, preserving note order.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code()).with_message(self.kind.to_string());
        for note in &self.notes {
            diag = match note.span {
                Some(span) => diag.with_label(Label::new(note.severity, span, &note.message)),
                None => diag.with_note(&note.message),
            };
        }
        diag
    }
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for VmError {}

/// Create a type mismatch error.
pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> VmError {
    VmError::new(VmErrorKind::TypeMismatch {
        expected: expected.into(),
        found: found.into(),
    })
}

/// Create an argument count mismatch error.
pub fn arg_count_mismatch(expected: usize, actual: usize) -> VmError {
    VmError::new(VmErrorKind::ArgCountMismatch { expected, actual })
}

/// Create an unsupported operator error with a pre-rendered message.
pub fn unsupported_operator(message: impl Into<String>) -> VmError {
    VmError::new(VmErrorKind::UnsupportedOperator {
        message: message.into(),
    })
}

/// Create a name resolution error.
pub fn undefined_name(name: impl Into<String>) -> VmError {
    VmError::new(VmErrorKind::NameResolution { name: name.into() })
}

/// Create an internal consistency error.
pub fn internal(message: impl Into<String>) -> VmError {
    VmError::new(VmErrorKind::InternalConsistency {
        message: message.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_messages() {
        assert_eq!(
            type_mismatch("i32", "str").to_string(),
            "mismatched types: expected `i32`, got `str`"
        );
        assert_eq!(
            arg_count_mismatch(1, 2).to_string(),
            "this function takes 1 argument but 2 arguments were supplied"
        );
        assert_eq!(
            arg_count_mismatch(2, 1).to_string(),
            "this function takes 2 arguments but 1 argument was supplied"
        );
        assert_eq!(
            undefined_name("mymod::missing").to_string(),
            "name `mymod::missing` is not defined"
        );
    }

    #[test]
    fn note_chain_preserves_order() {
        let err = type_mismatch("i32", "str")
            .with_note(Severity::Error, "this is `str`", Some(Span::new(4, 9)))
            .called_from(Span::new(20, 30));
        assert_eq!(err.notes.len(), 2);
        assert_eq!(err.notes[0].message, "this is `str`");
        assert_eq!(err.notes[1].message, "called from here");
        assert_eq!(err.notes[1].severity, Severity::Note);
    }

    #[test]
    fn at_only_fills_missing_location() {
        let err = undefined_name("x").at(Span::new(1, 2));
        assert_eq!(err.notes.len(), 1);
        let err = err.at(Span::new(5, 6));
        assert_eq!(err.notes.len(), 1);
        assert_eq!(err.notes[0].span, Some(Span::new(1, 2)));
    }

    #[test]
    fn fatal_classification() {
        assert!(internal("oops").is_fatal());
        assert!(!type_mismatch("a", "b").is_fatal());
    }

    #[test]
    fn diagnostic_conversion() {
        let err = unsupported_operator("cannot do `i32` + `str`")
            .with_note(Severity::Error, "this is `i32`", Some(Span::new(0, 1)))
            .with_note(Severity::Note, "operands must share a type", None);
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, ErrorCode::E2003);
        assert_eq!(diag.message, "cannot do `i32` + `str`");
        assert_eq!(diag.labels.len(), 1);
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.primary_span(), Some(Span::new(0, 1)));
    }
}
