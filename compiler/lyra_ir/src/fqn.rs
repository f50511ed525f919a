//! Fully-qualified names for globals and synthesized entities.

use crate::{Name, StringInterner};
use std::fmt;

/// Fully-qualified name of a top-level entity.
///
/// A *global* name (`suffix == None`) identifies a module-level declaration
/// and is unique within its module. A *suffixed* name identifies a
/// synthesized entity (an attribute accessor, a materialized constant) and
/// carries a numeric suffix allocated from the session's monotone counter, so
/// no two synthesized entities ever collide.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Fqn {
    pub module: Name,
    pub attr: Name,
    pub suffix: Option<u32>,
}

impl Fqn {
    /// A global (unsuffixed) name.
    #[inline]
    pub const fn global(module: Name, attr: Name) -> Self {
        Fqn {
            module,
            attr,
            suffix: None,
        }
    }

    /// A suffixed name for a synthesized entity.
    #[inline]
    pub const fn suffixed(module: Name, attr: Name, suffix: u32) -> Self {
        Fqn {
            module,
            attr,
            suffix: Some(suffix),
        }
    }

    /// True for module-level declarations, false for synthesized names.
    #[inline]
    pub const fn is_global(&self) -> bool {
        self.suffix.is_none()
    }

    /// Render this name through an interner, e.g. `mod::attr` or
    /// `mod::attr#3`.
    pub fn display(&self, interner: &StringInterner) -> FqnDisplay {
        FqnDisplay {
            module: interner.lookup(self.module),
            attr: interner.lookup(self.attr),
            suffix: self.suffix,
        }
    }
}

/// Display helper for [`Fqn`]; resolves the interned parts eagerly so the
/// helper carries no interner borrow.
pub struct FqnDisplay {
    module: &'static str,
    attr: &'static str,
    suffix: Option<u32>,
}

impl fmt::Display for FqnDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.attr)?;
        if let Some(n) = self.suffix {
            write!(f, "#{n}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn global_display() {
        let interner = StringInterner::new();
        let fqn = Fqn::global(interner.intern("mymod"), interner.intern("add"));
        assert!(fqn.is_global());
        assert_eq!(fqn.display(&interner).to_string(), "mymod::add");
    }

    #[test]
    fn suffixed_display() {
        let interner = StringInterner::new();
        let fqn = Fqn::suffixed(interner.intern("Point"), interner.intern("__get_x__"), 7);
        assert!(!fqn.is_global());
        assert_eq!(fqn.display(&interner).to_string(), "Point::__get_x__#7");
    }

    #[test]
    fn suffix_distinguishes() {
        let interner = StringInterner::new();
        let m = interner.intern("m");
        let a = interner.intern("a");
        assert_ne!(Fqn::global(m, a), Fqn::suffixed(m, a, 0));
        assert_ne!(Fqn::suffixed(m, a, 0), Fqn::suffixed(m, a, 1));
    }
}
