//! String interner for identifier storage.
//!
//! Provides O(1) interning and lookup. Interned strings are leaked to get a
//! `'static` lifetime, so lookups can be handed out without holding the lock.

// Arc is needed here for SharedInterner - the interner is shared between the
// session and the registries that need to render names.
use crate::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

struct Inner {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents.
    strings: Vec<&'static str>,
}

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    /// Interner exceeded capacity (over 4 billion strings).
    Overflow { count: usize },
}

impl std::fmt::Display for InternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternError::Overflow { count } => write!(
                f,
                "interner exceeded capacity: {count} strings, max is {}",
                u32::MAX
            ),
        }
    }
}

impl std::error::Error for InternError {}

/// String interner backing every `Name` in a session.
///
/// A single `RwLock` guards the table; sessions are single-threaded so the
/// lock is uncontended and exists only to keep the API `&self`.
pub struct StringInterner {
    inner: RwLock<Inner>,
}

impl StringInterner {
    /// Create a new interner with the empty string pre-interned at index 0.
    pub fn new() -> Self {
        let mut inner = Inner {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        let empty: &'static str = "";
        inner.map.insert(empty, 0);
        inner.strings.push(empty);
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Try to intern a string, returning its `Name` or an error on overflow.
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        // Fast path: already interned.
        {
            let guard = self.inner.read();
            if let Some(&idx) = guard.map.get(s) {
                return Ok(Name::from_raw(idx));
            }
        }

        let mut guard = self.inner.write();
        if let Some(&idx) = guard.map.get(s) {
            return Ok(Name::from_raw(idx));
        }

        let idx = u32::try_from(guard.strings.len()).map_err(|_| InternError::Overflow {
            count: guard.strings.len(),
        })?;

        // Leak the string to get 'static lifetime.
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        guard.map.insert(leaked, idx);
        guard.strings.push(leaked);
        Ok(Name::from_raw(idx))
    }

    /// Intern a string, returning its `Name`.
    ///
    /// # Panics
    /// Panics if the interner holds more than `u32::MAX` strings. A session
    /// that interns four billion identifiers is unrecoverable anyway.
    pub fn intern(&self, s: &str) -> Name {
        match self.try_intern(s) {
            Ok(name) => name,
            Err(e) => panic!("{e}"),
        }
    }

    /// Look up the string for a `Name`.
    ///
    /// # Panics
    /// Panics if `name` was not produced by this interner.
    pub fn lookup(&self, name: Name) -> &'static str {
        let guard = self.inner.read();
        match guard.strings.get(name.index()) {
            Some(s) => s,
            None => panic!("Name({}) not found in interner", name.raw()),
        }
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// True when only the pre-interned empty string is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a `StringInterner`.
///
/// Cloning is cheap (an `Arc` bump); all clones observe the same table.
#[derive(Clone)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &StringInterner {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn intern_dedups() {
        let interner = StringInterner::new();
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        let c = interner.intern("bar");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn lookup_roundtrip() {
        let interner = StringInterner::new();
        let name = interner.intern("redshift");
        assert_eq!(interner.lookup(name), "redshift");
    }

    #[test]
    fn empty_string_pre_interned() {
        let interner = StringInterner::new();
        assert!(interner.is_empty());
        assert_eq!(interner.intern(""), Name::EMPTY);
        assert_eq!(interner.lookup(Name::EMPTY), "");
    }

    #[test]
    fn shared_clones_observe_same_table() {
        let shared = SharedInterner::new();
        let clone = shared.clone();
        let name = shared.intern("xyz");
        assert_eq!(clone.lookup(name), "xyz");
        assert_eq!(clone.intern("xyz"), name);
    }
}
