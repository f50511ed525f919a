//! Structured diagnostics for the Lyra runtime.
//!
//! Runtime errors are converted into [`Diagnostic`] values for reporting:
//! an error code, a main message, and an ordered list of labeled spans
//! carrying their own severities.

mod diagnostic;
mod error_code;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
