//! Interned string identifiers.

use std::fmt;

/// Interned string identifier.
///
/// A compact index into the session's `StringInterner`. Equality and hashing
/// are O(1) integer operations, which is what makes `Name` suitable as a key
/// in type member tables and memoization keys.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// The pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    /// Create a `Name` from a raw index.
    ///
    /// Only meaningful for indices handed out by a `StringInterner`.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    /// Raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Index into the interner's string table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_roundtrip() {
        let name = Name::from_raw(42);
        assert_eq!(name.raw(), 42);
        assert_eq!(name.index(), 42);
    }

    #[test]
    fn empty_is_default() {
        assert_eq!(Name::default(), Name::EMPTY);
        assert_eq!(Name::EMPTY.raw(), 0);
    }

    #[test]
    fn name_hash_dedup() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Name::from_raw(1));
        set.insert(Name::from_raw(1));
        set.insert(Name::from_raw(2));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn memory_size() {
        assert_eq!(std::mem::size_of::<Name>(), 4);
    }
}
