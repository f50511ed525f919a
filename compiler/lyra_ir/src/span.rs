//! Byte-offset source spans.

use std::fmt;

/// A half-open byte range into a source buffer.
///
/// Spans only annotate expressions and diagnostics; they never participate in
/// equality or hashing of the values that carry them.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Placeholder span for synthesized nodes with no source location.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    #[inline]
    pub const fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.start >= self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}..{})", self.start, self.end)
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::DUMMY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_covers_both() {
        let a = Span::new(4, 10);
        let b = Span::new(8, 20);
        assert_eq!(a.merge(b), Span::new(4, 20));
        assert_eq!(b.merge(a), Span::new(4, 20));
    }

    #[test]
    fn dummy_is_empty() {
        assert!(Span::DUMMY.is_empty());
        assert_eq!(Span::DUMMY.len(), 0);
    }

    #[test]
    fn len() {
        assert_eq!(Span::new(3, 9).len(), 6);
    }
}
