//! Table Q function with eviction of stale entries.
use super::{check_action, check_agent, FunctionApproximator, SparseTrace};
use crate::{
    error::Result,
    sa_pair::{QuantizedKey, StateActionPair},
};
use log::debug;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Default of [`CacheConfig::expire_after`], in ticks.
pub const DEFAULT_EXPIRE_AFTER: u64 = 100_000;

/// Configuration of [`QCache`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct CacheConfig {
    /// Estimate given to an entry the first time it is read, or after it has
    /// been evicted.
    pub initial_q: f64,

    /// Entries not accessed for this many ticks are evicted. The tick advances
    /// once per [`FunctionApproximator::degrade_eligibilities`] call, i.e.
    /// once per agent per learning step.
    ///
    /// The default of [`DEFAULT_EXPIRE_AFTER`] ticks is only a starting point
    /// for small tasks. Size the window from the length of a game with
    /// [`CacheConfig::expire_after_games`].
    pub expire_after: u64,

    /// Optional hard bound on the number of entries.
    pub capacity: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_q: 50.0,
            expire_after: DEFAULT_EXPIRE_AFTER,
            capacity: None,
        }
    }
}

impl CacheConfig {
    /// Sets the initial estimate.
    pub fn initial_q(mut self, v: f64) -> Self {
        self.initial_q = v;
        self
    }

    /// Sets the number of idle ticks after which an entry is evicted.
    pub fn expire_after(mut self, ticks: u64) -> Self {
        self.expire_after = ticks;
        self
    }

    /// Keeps entries used in the last `games` games, a game lasting
    /// `ticks_per_game` ticks (one per agent per frame, typically).
    ///
    /// Retaining 100 games of 24 agents playing 5000 frames, for instance,
    /// takes `expire_after_games(24 * 5000, 100)`, i.e. 12 000 000 ticks.
    pub fn expire_after_games(mut self, ticks_per_game: u64, games: u64) -> Self {
        self.expire_after = ticks_per_game * games;
        self
    }

    /// Sets the maximum number of entries.
    pub fn capacity(mut self, v: Option<usize>) -> Self {
        self.capacity = v;
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    q: f64,
    last_access: u64,
}

/// Q function stored in a table whose entries expire.
///
/// Entries are kept in access order together with the logical tick of their
/// last access. The tick advances with
/// [`FunctionApproximator::degrade_eligibilities`], not with wall-clock time,
/// so what gets evicted depends only on the sequence of calls. Capacity is
/// thereby a function of training throughput.
pub struct QCache {
    table: LruCache<QuantizedKey, Entry>,
    traces: Vec<SparseTrace<QuantizedKey>>,
    tick: u64,
    initial_q: f64,
    expire_after: u64,
    num_outputs: usize,
}

impl QCache {
    /// Builds an empty cache serving `num_agents` agents.
    pub fn build(config: &CacheConfig, num_agents: usize, num_outputs: usize) -> Self {
        let table = match config.capacity.and_then(NonZeroUsize::new) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };

        Self {
            table,
            traces: (0..num_agents).map(|_| SparseTrace::new()).collect(),
            tick: 0,
            initial_q: config.initial_q,
            expire_after: config.expire_after,
            num_outputs,
        }
    }

    /// Current logical tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of eligible entries of an agent.
    pub fn eligibility_len(&self, agent: usize) -> Result<usize> {
        check_agent(agent, self.traces.len())?;
        Ok(self.traces[agent].len())
    }

    /// Returns the entry for `key`, inserting the initial estimate if needed,
    /// and marks it as used now.
    fn touch(&mut self, key: &QuantizedKey) -> &mut Entry {
        let tick = self.tick;
        let initial_q = self.initial_q;
        let entry = self.table.get_or_insert_mut(key.clone(), || Entry {
            q: initial_q,
            last_access: tick,
        });
        entry.last_access = tick;
        entry
    }

    fn evict_expired(&mut self) {
        let mut evicted = 0;
        while let Some((_, e)) = self.table.peek_lru() {
            if self.tick - e.last_access < self.expire_after {
                break;
            }
            self.table.pop_lru();
            evicted += 1;
        }
        if evicted > 0 {
            debug!(
                "Evicted {} entries at tick {}, {} left",
                evicted,
                self.tick,
                self.table.len()
            );
        }
    }
}

impl FunctionApproximator for QCache {
    fn evaluate(&mut self, pair: &StateActionPair) -> Result<f64> {
        check_action(pair.action(), self.num_outputs)?;
        Ok(self.touch(&pair.quantize()).q)
    }

    fn peek(&self, pair: &StateActionPair) -> Result<f64> {
        check_action(pair.action(), self.num_outputs)?;
        Ok(self
            .table
            .peek(&pair.quantize())
            .map(|e| e.q)
            .unwrap_or(self.initial_q))
    }

    fn accumulate_eligibilities(&mut self, agent: usize, pair: &StateActionPair) -> Result<()> {
        check_agent(agent, self.traces.len())?;
        check_action(pair.action(), self.num_outputs)?;
        self.traces[agent].replace(pair.quantize());
        Ok(())
    }

    fn degrade_eligibilities(&mut self, agent: usize, gamma: f64, lambda: f64) -> Result<()> {
        check_agent(agent, self.traces.len())?;
        self.traces[agent].decay(gamma * lambda);
        self.tick += 1;
        self.evict_expired();
        Ok(())
    }

    fn reset_eligibilities(&mut self, agent: usize) -> Result<()> {
        check_agent(agent, self.traces.len())?;
        self.traces[agent].clear();
        Ok(())
    }

    fn update(&mut self, agent: usize, alpha: f64, delta: f64) -> Result<()> {
        check_agent(agent, self.traces.len())?;
        let trace: Vec<(QuantizedKey, f64)> = self.traces[agent]
            .iter()
            .map(|(k, e)| (k.clone(), *e))
            .collect();
        for (key, e) in trace {
            self.touch(&key).q += alpha * delta * e;
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(state: &[f64], action: usize) -> StateActionPair {
        StateActionPair::new(state.to_vec(), action)
    }

    #[test]
    fn test_expire_after_games() {
        assert_eq!(CacheConfig::default().expire_after, DEFAULT_EXPIRE_AFTER);
        let config = CacheConfig::default().expire_after_games(24 * 5000, 100);
        assert_eq!(config.expire_after, 12_000_000);
    }

    #[test]
    fn test_first_read_is_idempotent() -> Result<()> {
        let mut q = QCache::build(&CacheConfig::default(), 1, 2);
        let p = pair(&[-1.0, 2.0], 1);
        assert_eq!(q.evaluate(&p)?, 50.0);
        assert_eq!(q.evaluate(&p)?, 50.0);
        assert_eq!(q.len(), 1);
        Ok(())
    }

    #[test]
    fn test_stale_entries_are_evicted() -> Result<()> {
        let mut q = QCache::build(&CacheConfig::default().initial_q(0.0).expire_after(3), 1, 2);
        let p = pair(&[1.0], 0);
        q.accumulate_eligibilities(0, &p)?;
        q.update(0, 1.0, 2.0)?;
        assert_eq!(q.peek(&p)?, 2.0);

        q.degrade_eligibilities(0, 1.0, 1.0)?;
        q.degrade_eligibilities(0, 1.0, 1.0)?;
        assert_eq!(q.len(), 1);
        q.degrade_eligibilities(0, 1.0, 1.0)?;
        assert_eq!(q.tick(), 3);
        assert_eq!(q.len(), 0);
        assert_eq!(q.peek(&p)?, 0.0);
        Ok(())
    }

    #[test]
    fn test_reads_keep_entries_alive() -> Result<()> {
        let mut q = QCache::build(&CacheConfig::default().expire_after(2), 1, 2);
        let hot = pair(&[1.0], 0);
        let cold = pair(&[-1.0], 0);
        q.evaluate(&hot)?;
        q.evaluate(&cold)?;

        for _ in 0..5 {
            q.degrade_eligibilities(0, 0.0, 0.0)?;
            q.evaluate(&hot)?;
        }
        assert_eq!(q.len(), 1);
        assert_eq!(q.peek(&hot)?, 50.0);
        Ok(())
    }

    #[test]
    fn test_peek_does_not_refresh() -> Result<()> {
        let mut q = QCache::build(&CacheConfig::default().expire_after(1), 1, 2);
        let p = pair(&[1.0], 1);
        q.evaluate(&p)?;
        q.peek(&p)?;
        q.degrade_eligibilities(0, 0.0, 0.0)?;
        assert_eq!(q.len(), 0);
        Ok(())
    }

    #[test]
    fn test_update_reseeds_evicted_entries() -> Result<()> {
        let mut q = QCache::build(&CacheConfig::default().initial_q(10.0).expire_after(1), 1, 2);
        let p = pair(&[1.0], 1);
        q.evaluate(&p)?;
        q.accumulate_eligibilities(0, &p)?;
        q.degrade_eligibilities(0, 1.0, 1.0)?;
        assert_eq!(q.len(), 0);
        assert_eq!(q.eligibility_len(0)?, 1);

        q.update(0, 0.5, 2.0)?;
        assert_eq!(q.peek(&p)?, 11.0);
        Ok(())
    }

    #[test]
    fn test_capacity_bound() -> Result<()> {
        let mut q = QCache::build(&CacheConfig::default().capacity(Some(2)), 1, 2);
        q.evaluate(&pair(&[1.0, 1.0], 0))?;
        q.evaluate(&pair(&[1.0, -1.0], 0))?;
        q.evaluate(&pair(&[1.0, 1.0], 0))?;
        q.evaluate(&pair(&[-1.0, -1.0], 0))?;
        assert_eq!(q.len(), 2);
        assert_eq!(q.table.peek(&pair(&[1.0, -1.0], 0).quantize()).map(|e| e.q), None);
        Ok(())
    }
}
