//! Memoization cache for blue calls.

use crate::value::Value;
use lyra_ir::Fqn;
use rustc_hash::FxHashMap;

/// Cache key: the callee plus the full argument tuple.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct BlueKey {
    pub fqn: Fqn,
    pub args: Vec<Value>,
}

/// Value-keyed memo for blue (compile-time) calls.
///
/// Blue functions are pure, so a `(callee, args)` pair always yields the same
/// result and executing the body once per pair is enough.
#[derive(Default)]
pub(crate) struct BlueCache {
    map: FxHashMap<BlueKey, Value>,
}

impl BlueCache {
    pub fn lookup(&self, key: &BlueKey) -> Option<Value> {
        self.map.get(key).cloned()
    }

    pub fn record(&mut self, key: BlueKey, result: Value) {
        self.map.insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra_ir::{Fqn, Name};
    use pretty_assertions::assert_eq;

    fn key(args: Vec<Value>) -> BlueKey {
        BlueKey {
            fqn: Fqn::global(Name::from_raw(1), Name::from_raw(2)),
            args,
        }
    }

    #[test]
    fn record_and_lookup() {
        let mut cache = BlueCache::default();
        assert_eq!(cache.lookup(&key(vec![Value::I32(1)])), None);
        cache.record(key(vec![Value::I32(1)]), Value::I32(10));
        assert_eq!(cache.lookup(&key(vec![Value::I32(1)])), Some(Value::I32(10)));
        assert_eq!(cache.lookup(&key(vec![Value::I32(2)])), None);
        assert_eq!(cache.len(), 1);
    }
}
