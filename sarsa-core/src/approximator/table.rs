//! Table Q function.
use super::{check_action, check_agent, FunctionApproximator, SparseTrace};
use crate::{
    error::Result,
    sa_pair::{QuantizedKey, StateActionPair},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration of [`QTable`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TableConfig {
    /// Estimate given to an entry the first time it is read.
    pub initial_q: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self { initial_q: 50.0 }
    }
}

impl TableConfig {
    /// Sets the initial estimate.
    pub fn initial_q(mut self, v: f64) -> Self {
        self.initial_q = v;
        self
    }
}

/// Q function stored in an unbounded table.
///
/// Keys are the sign projection of the state ([`StateActionPair::quantize`]).
/// Entries are seeded with [`TableConfig::initial_q`] on first access.
pub struct QTable {
    table: HashMap<QuantizedKey, f64>,
    traces: Vec<SparseTrace<QuantizedKey>>,
    initial_q: f64,
    num_outputs: usize,
}

impl QTable {
    /// Builds an empty table serving `num_agents` agents.
    pub fn build(config: &TableConfig, num_agents: usize, num_outputs: usize) -> Self {
        Self {
            table: HashMap::new(),
            traces: (0..num_agents).map(|_| SparseTrace::new()).collect(),
            initial_q: config.initial_q,
            num_outputs,
        }
    }

    /// Number of eligible entries of an agent.
    pub fn eligibility_len(&self, agent: usize) -> Result<usize> {
        check_agent(agent, self.traces.len())?;
        Ok(self.traces[agent].len())
    }
}

impl FunctionApproximator for QTable {
    fn evaluate(&mut self, pair: &StateActionPair) -> Result<f64> {
        check_action(pair.action(), self.num_outputs)?;
        let initial_q = self.initial_q;
        Ok(*self.table.entry(pair.quantize()).or_insert(initial_q))
    }

    fn peek(&self, pair: &StateActionPair) -> Result<f64> {
        check_action(pair.action(), self.num_outputs)?;
        Ok(self
            .table
            .get(&pair.quantize())
            .copied()
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
        Ok(())
    }

    fn reset_eligibilities(&mut self, agent: usize) -> Result<()> {
        check_agent(agent, self.traces.len())?;
        self.traces[agent].clear();
        Ok(())
    }

    fn update(&mut self, agent: usize, alpha: f64, delta: f64) -> Result<()> {
        check_agent(agent, self.traces.len())?;
        let initial_q = self.initial_q;
        for (key, e) in self.traces[agent].iter() {
            let q = self.table.entry(key.clone()).or_insert(initial_q);
            *q += alpha * delta * e;
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
    use crate::error::SarsaError;

    fn pair(state: &[f64], action: usize) -> StateActionPair {
        StateActionPair::new(state.to_vec(), action)
    }

    #[test]
    fn test_first_read_is_idempotent() -> Result<()> {
        let mut q = QTable::build(&TableConfig::default(), 1, 2);
        let p = pair(&[1.0, -1.0], 0);
        assert_eq!(q.evaluate(&p)?, 50.0);
        assert_eq!(q.evaluate(&p)?, 50.0);
        assert_eq!(q.len(), 1);
        Ok(())
    }

    #[test]
    fn test_peek_does_not_seed() -> Result<()> {
        let q = QTable::build(&TableConfig::default().initial_q(3.0), 1, 2);
        assert_eq!(q.peek(&pair(&[1.0], 1))?, 3.0);
        assert_eq!(q.len(), 0);
        Ok(())
    }

    #[test]
    fn test_update_uses_replacing_trace() -> Result<()> {
        let mut q = QTable::build(&TableConfig::default().initial_q(0.0), 1, 2);
        let p = pair(&[1.0, -1.0], 1);
        q.accumulate_eligibilities(0, &p)?;
        q.accumulate_eligibilities(0, &p)?;
        q.update(0, 0.5, 2.0)?;
        assert_eq!(q.evaluate(&p)?, 1.0);

        // Magnitude does not matter to the table.
        assert_eq!(q.evaluate(&pair(&[7.0, -0.1], 1))?, 1.0);
        Ok(())
    }

    #[test]
    fn test_agents_have_separate_traces() -> Result<()> {
        let mut q = QTable::build(&TableConfig::default().initial_q(0.0), 2, 2);
        let p = pair(&[1.0], 0);
        q.accumulate_eligibilities(0, &p)?;
        assert_eq!(q.eligibility_len(0)?, 1);
        assert_eq!(q.eligibility_len(1)?, 0);

        q.update(1, 1.0, 1.0)?;
        assert_eq!(q.evaluate(&p)?, 0.0);
        q.update(0, 1.0, 1.0)?;
        assert_eq!(q.evaluate(&p)?, 1.0);

        q.reset_eligibilities(0)?;
        assert_eq!(q.eligibility_len(0)?, 0);
        Ok(())
    }

    #[test]
    fn test_degrade_empties_trace() -> Result<()> {
        let mut q = QTable::build(&TableConfig::default(), 1, 3);
        for a in 0..3 {
            q.accumulate_eligibilities(0, &pair(&[a as f64 - 1.0], a))?;
        }
        let mut calls = 0;
        while q.eligibility_len(0)? > 0 {
            q.degrade_eligibilities(0, 0.9, 0.5)?;
            calls += 1;
            assert!(calls <= 10);
        }
        Ok(())
    }

    #[test]
    fn test_usage_errors() {
        let mut q = QTable::build(&TableConfig::default(), 1, 2);
        assert!(matches!(
            q.evaluate(&pair(&[1.0], 2)),
            Err(SarsaError::ActionOutOfRange { action: 2, .. })
        ));
        assert!(matches!(
            q.update(1, 0.1, 0.1),
            Err(SarsaError::AgentOutOfRange { agent: 1, .. })
        ));
    }
}
