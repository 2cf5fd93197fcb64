//! Sparse eligibility traces of the table Q functions.
use std::collections::{btree_map::Iter, BTreeMap};

/// Traces below this value are dropped when decayed.
pub const ELIGIBILITY_MIN: f64 = 0.01;

/// Eligibility of the visited entries of one agent.
///
/// Only entries at or above [`ELIGIBILITY_MIN`] are kept, so the trace stays
/// bounded. Entries are ordered by key, which keeps the order in which
/// updates touch the store reproducible.
#[derive(Debug, Clone)]
pub struct SparseTrace<K> {
    traces: BTreeMap<K, f64>,
}

impl<K: Ord> Default for SparseTrace<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> SparseTrace<K> {
    /// Empty trace.
    pub fn new() -> Self {
        Self {
            traces: BTreeMap::new(),
        }
    }

    /// Sets the trace of `key` to 1, whatever it was before.
    pub fn replace(&mut self, key: K) {
        self.traces.insert(key, 1.0);
    }

    /// Multiplies every trace by `factor` and drops the ones falling below
    /// [`ELIGIBILITY_MIN`].
    pub fn decay(&mut self, factor: f64) {
        self.traces.retain(|_, e| {
            *e *= factor;
            *e >= ELIGIBILITY_MIN
        });
    }

    /// Trace of `key`, 0 if absent.
    pub fn get(&self, key: &K) -> f64 {
        self.traces.get(key).copied().unwrap_or(0.0)
    }

    /// Iterates over `(key, trace)` pairs in key order.
    pub fn iter(&self) -> Iter<'_, K, f64> {
        self.traces.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// Returns `true` if no entry is eligible.
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.traces.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_does_not_accumulate() {
        let mut trace = SparseTrace::new();
        trace.replace(3);
        trace.replace(3);
        assert_eq!(trace.get(&3), 1.0);
        assert_eq!(trace.len(), 1);
    }

    #[test]
    fn test_decay_prunes() {
        let mut trace = SparseTrace::new();
        trace.replace(1);
        trace.decay(0.5);
        trace.replace(2);
        assert_eq!(trace.get(&1), 0.5);
        assert_eq!(trace.get(&2), 1.0);

        let mut n = 0;
        while !trace.is_empty() {
            trace.decay(0.5);
            n += 1;
            assert!(n < 10);
        }
        // 0.5^7 < 0.01 <= 0.5^6
        assert_eq!(n, 7);
    }

    #[test]
    fn test_zero_factor_empties() {
        let mut trace = SparseTrace::new();
        trace.replace("a");
        trace.replace("b");
        trace.decay(0.0);
        assert!(trace.is_empty());
    }
}
