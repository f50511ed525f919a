use std::fmt;

/// Error codes for all runtime diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E2xxx: Type and dispatch errors
/// - E9xxx: Internal runtime errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Type and dispatch errors (E2xxx)
    /// Type mismatch
    E2001,
    /// Argument count mismatch
    E2002,
    /// Unsupported operator for operand types
    E2003,
    /// Unknown name
    E2004,

    // Internal runtime errors (E9xxx)
    /// Internal consistency violation
    E9001,
}

impl ErrorCode {
    /// The code as it appears in rendered diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E9001 => "E9001",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_as_str() {
        assert_eq!(ErrorCode::E2001.to_string(), "E2001");
        assert_eq!(ErrorCode::E9001.as_str(), "E9001");
    }
}
