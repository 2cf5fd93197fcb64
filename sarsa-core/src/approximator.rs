//! Function approximators of the Q function.
//!
//! A [`FunctionApproximator`] estimates the value of a state-action pair and
//! learns from gradient-scaled updates. One instance is shared by every agent
//! of a learner: the estimates (table entries or network weights) are common,
//! while each agent has its own eligibility trace.
//!
//! Three implementations are provided:
//!
//! * [`QTable`] - unbounded table keyed by the sign projection of the state.
//! * [`QCache`] - the same table with eviction of entries not used for a
//!   number of logical ticks.
//! * [`QNetworks`] - one sigmoid perceptron per action.
//!
//! [`Approximator`] selects one of them from an [`ApproximatorConfig`].
mod cache;
mod network;
mod table;
mod trace;
use crate::{
    error::{Result, SarsaError},
    sa_pair::StateActionPair,
    settings::Settings,
};
pub use cache::{CacheConfig, QCache, DEFAULT_EXPIRE_AFTER};
pub use network::{LayerTraces, NetworkConfig, QNetwork, QNetworks};
use rand::Rng;
use serde::{Deserialize, Serialize};
pub use table::{QTable, TableConfig};
pub use trace::{SparseTrace, ELIGIBILITY_MIN};

/// Estimator of the Q function shared by several agents.
pub trait FunctionApproximator {
    /// Returns the estimate of `pair`.
    ///
    /// Table implementations seed missing entries here and count the read as
    /// a use of the entry.
    fn evaluate(&mut self, pair: &StateActionPair) -> Result<f64>;

    /// Returns the estimate of `pair` without changing anything.
    fn peek(&self, pair: &StateActionPair) -> Result<f64>;

    /// Marks `pair` as eligible for the updates of an agent.
    fn accumulate_eligibilities(&mut self, agent: usize, pair: &StateActionPair) -> Result<()>;

    /// Decays the eligibilities of an agent by `gamma * lambda`.
    fn degrade_eligibilities(&mut self, agent: usize, gamma: f64, lambda: f64) -> Result<()>;

    /// Clears the eligibilities of an agent.
    fn reset_eligibilities(&mut self, agent: usize) -> Result<()>;

    /// Moves every eligible estimate of an agent by `alpha * delta` times its
    /// eligibility.
    fn update(&mut self, agent: usize, alpha: f64, delta: f64) -> Result<()>;

    /// Size of the store: table entries, or network weights.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn check_agent(agent: usize, num_agents: usize) -> Result<()> {
    if agent >= num_agents {
        return Err(SarsaError::AgentOutOfRange { agent, num_agents });
    }
    Ok(())
}

pub(crate) fn check_action(action: usize, num_outputs: usize) -> Result<()> {
    if action >= num_outputs {
        return Err(SarsaError::ActionOutOfRange {
            action,
            num_outputs,
        });
    }
    Ok(())
}

/// Selects the function approximator of a learner.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum ApproximatorConfig {
    /// [`QTable`].
    Table(TableConfig),

    /// [`QCache`].
    Cache(CacheConfig),

    /// [`QNetworks`].
    Network(NetworkConfig),
}

impl Default for ApproximatorConfig {
    fn default() -> Self {
        Self::Network(NetworkConfig::default())
    }
}

/// One of the function approximators, chosen at construction.
pub enum Approximator {
    /// [`QTable`].
    Table(QTable),

    /// [`QCache`].
    Cache(QCache),

    /// [`QNetworks`].
    Network(QNetworks),
}

impl Approximator {
    /// Builds the approximator described by `config` for a learner with
    /// `settings`. Network weights are drawn from `rng`.
    pub fn build<R: Rng + ?Sized>(
        config: &ApproximatorConfig,
        settings: &Settings,
        rng: &mut R,
    ) -> Result<Self> {
        let q = match config {
            ApproximatorConfig::Table(c) => {
                Self::Table(QTable::build(c, settings.num_agents, settings.num_outputs))
            }
            ApproximatorConfig::Cache(c) => {
                Self::Cache(QCache::build(c, settings.num_agents, settings.num_outputs))
            }
            ApproximatorConfig::Network(c) => Self::Network(QNetworks::build(
                c,
                settings.hidden_nodes,
                settings.state_width(),
                settings.num_outputs,
                settings.num_agents,
                rng,
            )?),
        };
        Ok(q)
    }

    fn inner(&self) -> &dyn FunctionApproximator {
        match self {
            Self::Table(q) => q,
            Self::Cache(q) => q,
            Self::Network(q) => q,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn FunctionApproximator {
        match self {
            Self::Table(q) => q,
            Self::Cache(q) => q,
            Self::Network(q) => q,
        }
    }
}

impl FunctionApproximator for Approximator {
    fn evaluate(&mut self, pair: &StateActionPair) -> Result<f64> {
        self.inner_mut().evaluate(pair)
    }

    fn peek(&self, pair: &StateActionPair) -> Result<f64> {
        self.inner().peek(pair)
    }

    fn accumulate_eligibilities(&mut self, agent: usize, pair: &StateActionPair) -> Result<()> {
        self.inner_mut().accumulate_eligibilities(agent, pair)
    }

    fn degrade_eligibilities(&mut self, agent: usize, gamma: f64, lambda: f64) -> Result<()> {
        self.inner_mut().degrade_eligibilities(agent, gamma, lambda)
    }

    fn reset_eligibilities(&mut self, agent: usize) -> Result<()> {
        self.inner_mut().reset_eligibilities(agent)
    }

    fn update(&mut self, agent: usize, alpha: f64, delta: f64) -> Result<()> {
        self.inner_mut().update(agent, alpha, delta)
    }

    fn len(&self) -> usize {
        self.inner().len()
    }
}
