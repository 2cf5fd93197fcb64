//! SARSA(λ) control.
mod config;
mod memory;
use crate::{
    approximator::{check_action, check_agent, Approximator, ApproximatorConfig, FunctionApproximator},
    error::{Result, SarsaError},
    explorer::ExplorationConfig,
    learner::Learner,
    record::{Record, RecordValue},
    sa_pair::StateActionPair,
    settings::Settings,
};
pub use config::SarsaConfig;
use log::{debug, info, trace};
use memory::AgentMemory;
use rand::{rngs::StdRng, SeedableRng};
use std::path::Path;

/// Interval, in calls of [`Learner::get_action`], of the debug log of the
/// store size.
const LOG_STORE_INTERVAL: u64 = 10_000;

/// Learning rate, trace decay, temperature and exploration rate after decay.
///
/// Each is multiplied by `1 - rate` once per call of [`Learner::get_action`]
/// or [`Learner::force_action`], `rate` being the matching decay rate of
/// [`Settings`]. They are not restored by [`Learner::reset`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayedParams {
    /// Learning rate.
    pub alpha: f64,

    /// Trace decay. Only reported: eligibilities decay with the configured
    /// [`Settings::lambda`].
    pub lambda: f64,

    /// Boltzmann temperature.
    pub temperature: f64,

    /// Probability of a random action.
    pub epsilon: f64,
}

impl DecayedParams {
    fn new(settings: &Settings) -> Self {
        Self {
            alpha: settings.alpha,
            lambda: settings.lambda,
            temperature: settings.temperature,
            epsilon: settings.epsilon,
        }
    }

    fn decay(&mut self, settings: &Settings) {
        self.alpha *= 1.0 - settings.alpha_decay_rate;
        self.lambda *= 1.0 - settings.lambda_decay_rate;
        self.temperature *= 1.0 - settings.temperature_decay_rate;
        self.epsilon *= 1.0 - settings.epsilon_decay_rate;
    }
}

/// SARSA(λ) learner serving several agents with one Q function.
///
/// The state seen by the Q function is the agent's memory window followed by
/// the current observation, `settings.state_width()` values in total. Until
/// every window slot has been filled the learner returns action 0 without
/// learning.
///
/// Agents share the estimates of the Q function. Each has its own window,
/// step counter, previous state-action pair and eligibility trace.
///
/// ```
/// use sarsa_core::{
///     ApproximatorConfig, Learner, SarsaConfig, SarsaLambda, Settings, TableConfig,
/// };
///
/// let config = SarsaConfig::default()
///     .settings(Settings::default().num_inputs(2).num_outputs(2))
///     .approximator(ApproximatorConfig::Table(TableConfig::default()));
/// let mut learner = SarsaLambda::build(config).unwrap();
/// let action = learner.get_action_single(&[1.0, -1.0], 0.0).unwrap();
/// assert!(action < 2);
/// ```
pub struct SarsaLambda<Q: FunctionApproximator = Approximator> {
    settings: Settings,
    exploration: ExplorationConfig,
    seed: u64,
    approximator_config: Option<ApproximatorConfig>,
    q: Q,
    memories: Vec<AgentMemory>,
    params: DecayedParams,
    rng: StdRng,
    n_calls: u64,
}

impl SarsaLambda<Approximator> {
    /// Builds a learner from its configuration.
    pub fn build(config: SarsaConfig) -> Result<Self> {
        config.settings.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let q = Approximator::build(&config.approximator, &config.settings, &mut rng)?;
        info!(
            "Built SARSA(lambda) learner with {:?}, {} agents, state width {}",
            config.approximator,
            config.settings.num_agents,
            config.settings.state_width()
        );

        let mut learner = Self::with_rng(config.settings, q, config.exploration, config.seed, rng);
        learner.approximator_config = Some(config.approximator);
        Ok(learner)
    }

    /// Builds a learner with the configuration in the YAML file at `path`.
    pub fn build_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config = SarsaConfig::load(path)?;
        Ok(Self::build(config)?)
    }

    /// A new learner with the configuration of this one and a freshly
    /// initialized Q function.
    ///
    /// The seed is reused, so the new learner is identical to this one as it
    /// was right after [`SarsaLambda::build`].
    pub fn fresh(&self) -> Result<Self> {
        let approximator = self.approximator_config.clone().ok_or_else(|| {
            SarsaError::InvalidSettings("learner was not built from a configuration".into())
        })?;
        Self::build(self.config_with(approximator))
    }

    /// Configuration this learner was built from, if any.
    pub fn config(&self) -> Option<SarsaConfig> {
        self.approximator_config
            .clone()
            .map(|approximator| self.config_with(approximator))
    }

    fn config_with(&self, approximator: ApproximatorConfig) -> SarsaConfig {
        SarsaConfig {
            settings: self.settings.clone(),
            approximator,
            exploration: self.exploration.clone(),
            seed: self.seed,
        }
    }
}

impl<Q: FunctionApproximator> SarsaLambda<Q> {
    /// Builds a learner around an existing Q function.
    ///
    /// `q` must serve `settings.num_agents` agents and accept states of
    /// `settings.state_width()` values.
    pub fn new(settings: Settings, q: Q, exploration: ExplorationConfig, seed: u64) -> Result<Self> {
        settings.validate()?;
        let rng = StdRng::seed_from_u64(seed);
        Ok(Self::with_rng(settings, q, exploration, seed, rng))
    }

    fn with_rng(
        settings: Settings,
        q: Q,
        exploration: ExplorationConfig,
        seed: u64,
        rng: StdRng,
    ) -> Self {
        let memories = (0..settings.num_agents)
            .map(|_| AgentMemory::new(settings.memory_length))
            .collect();

        Self {
            params: DecayedParams::new(&settings),
            settings,
            exploration,
            seed,
            approximator_config: None,
            q,
            memories,
            rng,
            n_calls: 0,
        }
    }

    /// Hyperparameters.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current values of the decaying hyperparameters.
    pub fn params(&self) -> &DecayedParams {
        &self.params
    }

    /// The Q function.
    pub fn approximator(&self) -> &Q {
        &self.q
    }

    /// State-action pair an agent learned from last, if any since the last
    /// reset.
    pub fn previous_pair(&self, agent: usize) -> Result<Option<&StateActionPair>> {
        check_agent(agent, self.memories.len())?;
        Ok(self.memories[agent].previous())
    }

    /// Number of [`Learner::get_action`] calls of an agent since the last
    /// reset.
    pub fn step(&self, agent: usize) -> Result<u64> {
        check_agent(agent, self.memories.len())?;
        Ok(self.memories[agent].step())
    }

    /// Decayed hyperparameters and store size.
    pub fn record(&self) -> Record {
        Record::from_slice(&[
            ("alpha", RecordValue::Scalar(self.params.alpha as f32)),
            ("lambda", RecordValue::Scalar(self.params.lambda as f32)),
            ("temperature", RecordValue::Scalar(self.params.temperature as f32)),
            ("epsilon", RecordValue::Scalar(self.params.epsilon as f32)),
            ("store_size", RecordValue::Scalar(self.q.len() as f32)),
        ])
    }

    fn check_state(&self, state: &[f64]) -> Result<()> {
        let width = self.settings.state_width();
        if state.len() != width {
            return Err(SarsaError::InputWidth {
                got: state.len(),
                expected: width,
            });
        }
        Ok(())
    }

    fn check_observation(&self, observation: &[f64]) -> Result<()> {
        if observation.len() != self.settings.num_inputs {
            return Err(SarsaError::InputWidth {
                got: observation.len(),
                expected: self.settings.num_inputs,
            });
        }
        Ok(())
    }
}

impl<Q: FunctionApproximator> Learner for SarsaLambda<Q> {
    fn reset(&mut self) -> Result<()> {
        for (agent, memory) in self.memories.iter_mut().enumerate() {
            memory.reset();
            self.q.reset_eligibilities(agent)?;
        }
        debug!("Reset {} agents, store size {}", self.memories.len(), self.q.len());
        Ok(())
    }

    fn get_action(&mut self, observation: &[f64], reward: f64, agent: usize) -> Result<usize> {
        check_agent(agent, self.memories.len())?;
        self.check_observation(observation)?;

        self.n_calls += 1;
        if self.n_calls % LOG_STORE_INTERVAL == 0 {
            debug!("Store size {} after {} calls", self.q.len(), self.n_calls);
        }

        let memory = &mut self.memories[agent];
        let warming = memory.is_warming();
        memory.advance(observation, self.settings.memory_interval);
        if warming {
            self.params.decay(&self.settings);
            return Ok(0);
        }

        let state = memory.state(observation);
        let q = (0..self.settings.num_outputs)
            .map(|a| self.q.evaluate(&StateActionPair::new(state.clone(), a)))
            .collect::<Result<Vec<_>>>()?;
        let action = self.exploration.action(
            &q,
            self.params.temperature,
            self.params.epsilon,
            &mut self.rng,
        );
        trace!("agent {}: q = {:?}, action = {}", agent, q, action);

        self.force_action(&state, reward, agent, action)?;
        Ok(action)
    }

    fn force_action(
        &mut self,
        state: &[f64],
        reward: f64,
        agent: usize,
        action: usize,
    ) -> Result<()> {
        check_agent(agent, self.memories.len())?;
        check_action(action, self.settings.num_outputs)?;
        self.check_state(state)?;

        let current = StateActionPair::new(state.to_vec(), action);
        if let Some(previous) = self.memories[agent].previous().cloned() {
            self.q.accumulate_eligibilities(agent, &previous)?;
            let q_current = self.q.evaluate(&current)?;
            let delta = reward + self.settings.gamma * q_current - self.q.evaluate(&previous)?;
            trace!("agent {}: reward = {}, delta = {}", agent, reward, delta);
            self.q.update(agent, self.params.alpha, delta)?;
            self.q
                .degrade_eligibilities(agent, self.settings.gamma, self.settings.lambda)?;
        }
        self.memories[agent].set_previous(current);
        self.params.decay(&self.settings);
        Ok(())
    }

    fn evaluate_state(&self, state: &[f64]) -> Result<Vec<f64>> {
        self.check_state(state)?;
        (0..self.settings.num_outputs)
            .map(|a| self.q.peek(&StateActionPair::new(state.to_vec(), a)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approximator::{NetworkConfig, QTable, TableConfig};
    use rand::Rng;

    fn table_config(settings: Settings) -> SarsaConfig {
        SarsaConfig::default()
            .settings(settings)
            .approximator(ApproximatorConfig::Table(TableConfig::default()))
    }

    #[test]
    fn test_warm_up() -> Result<()> {
        let settings = Settings::default()
            .num_inputs(2)
            .memory_length(2)
            .memory_interval(3)
            .epsilon(1.0);
        let mut learner = SarsaLambda::build(table_config(settings))?;

        for step in 1..=6 {
            assert_eq!(learner.get_action(&[1.0, -1.0], 1.0, 0)?, 0);
            assert_eq!(learner.step(0)?, step);
            assert!(learner.previous_pair(0)?.is_none());
        }
        assert!(learner.approximator().is_empty());

        learner.get_action(&[-1.0, 1.0], 1.0, 0)?;
        let previous = learner.previous_pair(0)?.map(|p| p.state().to_vec());
        assert_eq!(previous, Some(vec![1.0, -1.0, 1.0, -1.0, -1.0, 1.0]));
        Ok(())
    }

    #[test]
    fn test_params_decay_once_per_call() -> Result<()> {
        let settings = Settings::default()
            .memory_length(1)
            .alpha(1.0)
            .alpha_decay_rate(0.5)
            .epsilon(0.8)
            .epsilon_decay_rate(0.5);
        let mut learner = SarsaLambda::build(table_config(settings))?;

        // Warming, then active.
        learner.get_action(&[1.0], 0.0, 0)?;
        learner.get_action(&[1.0], 0.0, 0)?;
        learner.get_action(&[1.0], 0.0, 0)?;
        assert_eq!(learner.params().alpha, 0.125);
        assert_eq!(learner.params().epsilon, 0.1);

        learner.force_action(&[1.0, 1.0], 0.0, 0, 1)?;
        assert_eq!(learner.params().alpha, 0.0625);

        learner.reset()?;
        assert_eq!(learner.params().alpha, 0.0625);
        assert!(learner.previous_pair(0)?.is_none());
        assert_eq!(learner.step(0)?, 0);
        Ok(())
    }

    #[test]
    fn test_td_update() -> Result<()> {
        let settings = Settings::default()
            .alpha(0.5)
            .gamma(0.5)
            .lambda(0.0)
            .num_outputs(2);
        let q = QTable::build(&TableConfig::default().initial_q(0.0), 1, 2);
        let mut learner = SarsaLambda::new(settings, q, ExplorationConfig::greedy(), 0)?;

        learner.force_action(&[1.0], 5.0, 0, 0)?;
        assert_eq!(learner.evaluate_state(&[1.0])?, vec![0.0, 0.0]);

        // delta = 2 + 0.5 * 0 - 0
        learner.force_action(&[-1.0], 2.0, 0, 1)?;
        assert_eq!(learner.evaluate_state(&[1.0])?, vec![1.0, 0.0]);

        // delta = 0 + 0.5 * 1 - 0, applied to ([-1], 1)
        learner.force_action(&[1.0], 0.0, 0, 0)?;
        assert_eq!(learner.evaluate_state(&[-1.0])?, vec![0.0, 0.25]);
        Ok(())
    }

    #[test]
    fn test_deterministic_given_seed() -> Result<()> {
        let settings = Settings::default()
            .num_inputs(3)
            .num_outputs(4)
            .memory_length(1)
            .temperature(1.0)
            .epsilon(0.2);
        let config = SarsaConfig::default()
            .settings(settings)
            .approximator(ApproximatorConfig::Network(NetworkConfig::default()))
            .seed(3);
        let mut l1 = SarsaLambda::build(config.clone())?;
        let mut l2 = SarsaLambda::build(config)?;

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let obs: Vec<f64> = (0..3).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let reward = rng.gen_range(0.0..1.0);
            assert_eq!(l1.get_action(&obs, reward, 0)?, l2.get_action(&obs, reward, 0)?);
        }
        let state = [0.1, 0.2, 0.3, -0.1, -0.2, -0.3];
        assert_eq!(l1.evaluate_state(&state)?, l2.evaluate_state(&state)?);
        Ok(())
    }

    #[test]
    fn test_fresh_starts_over() -> Result<()> {
        let settings = Settings::default().num_inputs(2).alpha(0.5);
        let config = SarsaConfig::default().settings(settings);
        let mut learner = SarsaLambda::build(config.clone())?;
        let state = [0.5, -0.5];
        let before = learner.evaluate_state(&state)?;

        for i in 0..50 {
            learner.get_action(&[0.5, -0.5], i as f64, 0)?;
        }
        assert_ne!(learner.evaluate_state(&state)?, before);

        let fresh = learner.fresh()?;
        assert_eq!(fresh.evaluate_state(&state)?, before);
        assert_eq!(fresh.config(), Some(config));
        Ok(())
    }

    #[test]
    fn test_evaluate_state_is_pure() -> Result<()> {
        let learner = SarsaLambda::build(table_config(Settings::default()))?;
        assert_eq!(learner.evaluate_state(&[1.0])?, vec![50.0, 50.0]);
        assert!(learner.approximator().is_empty());
        Ok(())
    }

    #[test]
    fn test_evaluate_state_checks_width() -> Result<()> {
        let settings = Settings::default().num_inputs(2).memory_length(1);
        let learner = SarsaLambda::build(table_config(settings))?;
        assert!(matches!(
            learner.evaluate_state(&[1.0]),
            Err(SarsaError::InputWidth { got: 1, expected: 4 })
        ));
        assert!(matches!(
            learner.evaluate_state(&[1.0, 1.0]),
            Err(SarsaError::InputWidth { got: 2, expected: 4 })
        ));
        assert_eq!(learner.evaluate_state(&[1.0, 1.0, -1.0, 1.0])?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_traces_decay_with_configured_lambda() -> Result<()> {
        let settings = Settings::default()
            .gamma(1.0)
            .lambda(1.0)
            .lambda_decay_rate(0.9);
        let q = QTable::build(&TableConfig::default(), 1, 2);
        let mut learner = SarsaLambda::new(settings, q, ExplorationConfig::greedy(), 0)?;

        learner.force_action(&[1.0], 0.0, 0, 0)?;
        learner.force_action(&[-1.0], 0.0, 0, 1)?;
        learner.force_action(&[1.0], 0.0, 0, 1)?;

        assert_eq!(learner.approximator().eligibility_len(0)?, 2);
        assert!((learner.params().lambda - 0.001).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_record() -> Result<()> {
        let mut learner = SarsaLambda::build(table_config(Settings::default().alpha(0.25)))?;
        learner.get_action(&[1.0], 0.0, 0)?;
        let record = learner.record();
        assert_eq!(record.get_scalar("alpha"), Ok(0.25));
        assert_eq!(record.get_scalar("store_size"), Ok(2.0));
        Ok(())
    }

    #[test]
    fn test_usage_errors() -> Result<()> {
        let mut learner = SarsaLambda::build(table_config(Settings::default().num_agents(2)))?;
        assert!(matches!(
            learner.get_action(&[1.0], 0.0, 2),
            Err(SarsaError::AgentOutOfRange { agent: 2, .. })
        ));
        assert!(matches!(
            learner.get_action(&[1.0, 2.0], 0.0, 0),
            Err(SarsaError::InputWidth { got: 2, expected: 1 })
        ));
        assert!(matches!(
            learner.force_action(&[1.0], 0.0, 0, 2),
            Err(SarsaError::ActionOutOfRange { action: 2, .. })
        ));
        assert!(matches!(
            SarsaLambda::build(table_config(Settings::default().num_outputs(0))),
            Err(SarsaError::InvalidSettings(_))
        ));

        let q = QTable::build(&TableConfig::default(), 1, 2);
        let learner = SarsaLambda::new(Settings::default(), q, ExplorationConfig::default(), 0)?;
        assert!(learner.previous_pair(0)?.is_none());
        Ok(())
    }
}
