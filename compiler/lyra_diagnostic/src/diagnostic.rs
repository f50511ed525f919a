use std::fmt;

use lyra_ir::Span;

use crate::ErrorCode;

/// Severity level for diagnostics and their labels.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
            Severity::Help => write!(f, "help"),
        }
    }
}

/// A labeled span with its own severity.
///
/// The first `Error`-severity label is the primary location; further labels
/// add context (e.g. the "called from here" chain of a propagated error).
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn new(severity: Severity, span: Span, message: impl Into<String>) -> Self {
        Label {
            severity,
            span,
            message: message.into(),
        }
    }

    /// An error-severity label (the main error location).
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, span, message)
    }

    /// A note-severity label (related context).
    pub fn note(span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Note, span, message)
    }
}

/// A structured diagnostic: code, message, labeled spans and free-form notes.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported or returned, not silently dropped"]
pub struct Diagnostic {
    /// Error code for searchability.
    pub code: ErrorCode,
    /// Severity level.
    pub severity: Severity,
    /// Main message.
    pub message: String,
    /// Labeled spans showing where the error occurred.
    pub labels: Vec<Label>,
    /// Additional notes without a source location.
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn new_with_severity(code: ErrorCode, severity: Severity) -> Self {
        Diagnostic {
            code,
            severity,
            message: String::new(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Create a new error diagnostic.
    pub fn error(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Error)
    }

    /// Create a new warning diagnostic.
    pub fn warning(code: ErrorCode) -> Self {
        Self::new_with_severity(code, Severity::Warning)
    }

    /// Set the main message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a label.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Add a note without a location.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// The primary span (first error-severity label's span).
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|l| l.severity == Severity::Error)
            .map(|l| l.span)
    }

    /// Check if this is an error (vs warning).
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.code, self.message)?;
        for label in &self.labels {
            write!(
                f,
                "\n  {}: {} at {}..{}",
                label.severity, label.message, label.span.start, label.span.end
            )?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_chain() {
        let diag = Diagnostic::error(ErrorCode::E2001)
            .with_message("mismatched types")
            .with_label(Label::error(Span::new(4, 9), "this is `str`"))
            .with_label(Label::note(Span::new(0, 3), "called from here"))
            .with_note("conversion is not implicit");

        assert!(diag.is_error());
        assert_eq!(diag.primary_span(), Some(Span::new(4, 9)));
        assert_eq!(diag.labels.len(), 2);
        assert_eq!(diag.notes.len(), 1);
    }

    #[test]
    fn display_renders_labels() {
        let diag = Diagnostic::error(ErrorCode::E2003)
            .with_message("cannot do `i32` + `str`")
            .with_label(Label::error(Span::new(1, 2), "this is `i32`"));
        let rendered = diag.to_string();
        assert!(rendered.starts_with("error [E2003]: cannot do `i32` + `str`"));
        assert!(rendered.contains("this is `i32`"));
    }

    #[test]
    fn primary_span_skips_notes() {
        let diag = Diagnostic::error(ErrorCode::E2004)
            .with_message("name not found")
            .with_label(Label::note(Span::new(0, 1), "called from here"));
        assert_eq!(diag.primary_span(), None);
    }
}
