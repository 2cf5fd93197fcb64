//! Hyperparameters of [`SarsaLambda`](crate::SarsaLambda).
use crate::error::{Result, SarsaError};
use anyhow::Result as AnyResult;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::File,
    hash::{Hash, Hasher},
    io::{BufReader, Write},
    ops::{Add, Mul, Sub},
    path::Path,
};

/// Hyperparameters of a SARSA(λ) learner.
///
/// The bundle is a plain value. Arithmetic (`+`, `-`, `* f64`,
/// [`Settings::scale_elements`]) acts component-wise, which lets a search
/// driver interpolate between a minimum and a maximum bundle. Integer
/// components are rounded after scaling and saturate at zero when subtracted.
///
/// Equality and hashing compare floating components by bit pattern, without
/// tolerance.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Hidden nodes of each action network. Values below 1 are treated as 1.
    pub hidden_nodes: usize,

    /// Learning rate, `0 <= alpha`.
    pub alpha: f64,

    /// Discount factor, `0 <= gamma <= 1`. 0 makes the agent short sighted,
    /// values close to 1 make it strive for long term reward.
    pub gamma: f64,

    /// Trace decay, `0 <= lambda <= 1`. 0 gives no feedback beyond the
    /// current time step.
    pub lambda: f64,

    /// Boltzmann temperature. Values close to 0 make action selection
    /// nearly greedy.
    pub temperature: f64,

    /// Chance of picking a uniformly random action.
    pub epsilon: f64,

    /// Per-step decay rate of `alpha`. 0 gives no decay.
    pub alpha_decay_rate: f64,

    /// Per-step decay rate of `lambda`.
    pub lambda_decay_rate: f64,

    /// Per-step decay rate of `temperature`.
    pub temperature_decay_rate: f64,

    /// Per-step decay rate of `epsilon`.
    pub epsilon_decay_rate: f64,

    /// Number of agents sharing the learner.
    pub num_agents: usize,

    /// Width of an observation.
    pub num_inputs: usize,

    /// Number of discrete actions.
    pub num_outputs: usize,

    /// Number of past observations kept in the memory window. 0 means the
    /// learner only sees the current observation.
    pub memory_length: usize,

    /// Interval, in steps, at which observations are pushed into the memory
    /// window. 0 is treated as 1.
    pub memory_interval: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hidden_nodes: 10,
            alpha: 0.01,
            gamma: 0.9,
            lambda: 0.8,
            temperature: 0.01,
            epsilon: 0.01,
            alpha_decay_rate: 0.0,
            lambda_decay_rate: 0.0,
            temperature_decay_rate: 0.0,
            epsilon_decay_rate: 0.0,
            num_agents: 1,
            num_inputs: 1,
            num_outputs: 2,
            memory_length: 0,
            memory_interval: 1,
        }
    }
}

/// Per-component factors for [`Settings::scale_elements`].
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ElementScale {
    /// Factor for [`Settings::hidden_nodes`].
    pub hidden_nodes: f64,
    /// Factor for [`Settings::alpha`].
    pub alpha: f64,
    /// Factor for [`Settings::gamma`].
    pub gamma: f64,
    /// Factor for [`Settings::lambda`].
    pub lambda: f64,
    /// Factor for [`Settings::temperature`].
    pub temperature: f64,
    /// Factor for [`Settings::epsilon`].
    pub epsilon: f64,
    /// Factor for [`Settings::alpha_decay_rate`].
    pub alpha_decay_rate: f64,
    /// Factor for [`Settings::lambda_decay_rate`].
    pub lambda_decay_rate: f64,
    /// Factor for [`Settings::temperature_decay_rate`].
    pub temperature_decay_rate: f64,
    /// Factor for [`Settings::epsilon_decay_rate`].
    pub epsilon_decay_rate: f64,
    /// Factor for [`Settings::num_agents`].
    pub num_agents: f64,
    /// Factor for [`Settings::num_inputs`].
    pub num_inputs: f64,
    /// Factor for [`Settings::num_outputs`].
    pub num_outputs: f64,
    /// Factor for [`Settings::memory_length`].
    pub memory_length: f64,
    /// Factor for [`Settings::memory_interval`].
    pub memory_interval: f64,
}

impl Default for ElementScale {
    /// Identity scale.
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl ElementScale {
    /// The same factor for every component.
    pub fn uniform(s: f64) -> Self {
        Self {
            hidden_nodes: s,
            alpha: s,
            gamma: s,
            lambda: s,
            temperature: s,
            epsilon: s,
            alpha_decay_rate: s,
            lambda_decay_rate: s,
            temperature_decay_rate: s,
            epsilon_decay_rate: s,
            num_agents: s,
            num_inputs: s,
            num_outputs: s,
            memory_length: s,
            memory_interval: s,
        }
    }
}

fn scale_count(n: usize, s: f64) -> usize {
    (n as f64 * s).round().max(0.0) as usize
}

impl Settings {
    /// Sets the number of hidden nodes.
    pub fn hidden_nodes(mut self, v: usize) -> Self {
        self.hidden_nodes = v;
        self
    }

    /// Sets the learning rate.
    pub fn alpha(mut self, v: f64) -> Self {
        self.alpha = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the trace decay.
    pub fn lambda(mut self, v: f64) -> Self {
        self.lambda = v;
        self
    }

    /// Sets the Boltzmann temperature.
    pub fn temperature(mut self, v: f64) -> Self {
        self.temperature = v;
        self
    }

    /// Sets the exploration rate.
    pub fn epsilon(mut self, v: f64) -> Self {
        self.epsilon = v;
        self
    }

    /// Sets the decay rate of the learning rate.
    pub fn alpha_decay_rate(mut self, v: f64) -> Self {
        self.alpha_decay_rate = v;
        self
    }

    /// Sets the decay rate of the trace decay.
    pub fn lambda_decay_rate(mut self, v: f64) -> Self {
        self.lambda_decay_rate = v;
        self
    }

    /// Sets the decay rate of the temperature.
    pub fn temperature_decay_rate(mut self, v: f64) -> Self {
        self.temperature_decay_rate = v;
        self
    }

    /// Sets the decay rate of the exploration rate.
    pub fn epsilon_decay_rate(mut self, v: f64) -> Self {
        self.epsilon_decay_rate = v;
        self
    }

    /// Sets the number of agents.
    pub fn num_agents(mut self, v: usize) -> Self {
        self.num_agents = v;
        self
    }

    /// Sets the width of an observation.
    pub fn num_inputs(mut self, v: usize) -> Self {
        self.num_inputs = v;
        self
    }

    /// Sets the number of actions.
    pub fn num_outputs(mut self, v: usize) -> Self {
        self.num_outputs = v;
        self
    }

    /// Sets the length of the memory window.
    pub fn memory_length(mut self, v: usize) -> Self {
        self.memory_length = v;
        self
    }

    /// Sets the interval at which observations enter the memory window.
    pub fn memory_interval(mut self, v: usize) -> Self {
        self.memory_interval = v;
        self
    }

    /// Width of the effective state: memory window plus current observation.
    pub fn state_width(&self) -> usize {
        self.num_inputs * (1 + self.memory_length)
    }

    /// Checks that a learner can be built from these settings.
    pub fn validate(&self) -> Result<()> {
        if self.num_agents == 0 {
            return Err(SarsaError::InvalidSettings("num_agents must be at least 1".into()));
        }
        if self.num_inputs == 0 {
            return Err(SarsaError::InvalidSettings("num_inputs must be at least 1".into()));
        }
        if self.num_outputs == 0 {
            return Err(SarsaError::InvalidSettings("num_outputs must be at least 1".into()));
        }
        let reals = [
            ("alpha", self.alpha),
            ("gamma", self.gamma),
            ("lambda", self.lambda),
            ("temperature", self.temperature),
            ("epsilon", self.epsilon),
            ("alpha_decay_rate", self.alpha_decay_rate),
            ("lambda_decay_rate", self.lambda_decay_rate),
            ("temperature_decay_rate", self.temperature_decay_rate),
            ("epsilon_decay_rate", self.epsilon_decay_rate),
        ];
        if let Some((name, v)) = reals.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SarsaError::InvalidSettings(format!("{} is not finite: {}", name, v)));
        }
        Ok(())
    }

    /// Returns `true` if the magnitude of every component is at most that of
    /// the corresponding component of `s`.
    pub fn magnitude_le(&self, s: &Settings) -> bool {
        self.hidden_nodes <= s.hidden_nodes
            && self.alpha.abs() <= s.alpha.abs()
            && self.gamma.abs() <= s.gamma.abs()
            && self.lambda.abs() <= s.lambda.abs()
            && self.temperature.abs() <= s.temperature.abs()
            && self.epsilon.abs() <= s.epsilon.abs()
            && self.alpha_decay_rate.abs() <= s.alpha_decay_rate.abs()
            && self.lambda_decay_rate.abs() <= s.lambda_decay_rate.abs()
            && self.temperature_decay_rate.abs() <= s.temperature_decay_rate.abs()
            && self.epsilon_decay_rate.abs() <= s.epsilon_decay_rate.abs()
            && self.num_agents <= s.num_agents
            && self.num_inputs <= s.num_inputs
            && self.num_outputs <= s.num_outputs
            && self.memory_length <= s.memory_length
            && self.memory_interval <= s.memory_interval
    }

    /// Scales each component by its own factor.
    pub fn scale_elements(&self, k: &ElementScale) -> Self {
        Self {
            hidden_nodes: scale_count(self.hidden_nodes, k.hidden_nodes),
            alpha: self.alpha * k.alpha,
            gamma: self.gamma * k.gamma,
            lambda: self.lambda * k.lambda,
            temperature: self.temperature * k.temperature,
            epsilon: self.epsilon * k.epsilon,
            alpha_decay_rate: self.alpha_decay_rate * k.alpha_decay_rate,
            lambda_decay_rate: self.lambda_decay_rate * k.lambda_decay_rate,
            temperature_decay_rate: self.temperature_decay_rate * k.temperature_decay_rate,
            epsilon_decay_rate: self.epsilon_decay_rate * k.epsilon_decay_rate,
            num_agents: scale_count(self.num_agents, k.num_agents),
            num_inputs: scale_count(self.num_inputs, k.num_inputs),
            num_outputs: scale_count(self.num_outputs, k.num_outputs),
            memory_length: scale_count(self.memory_length, k.memory_length),
            memory_interval: scale_count(self.memory_interval, k.memory_interval),
        }
    }

    /// Constructs [`Settings`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> AnyResult<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`Settings`].
    pub fn save(&self, path: impl AsRef<Path>) -> AnyResult<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    fn real_bits(&self) -> [u64; 9] {
        [
            self.alpha.to_bits(),
            self.gamma.to_bits(),
            self.lambda.to_bits(),
            self.temperature.to_bits(),
            self.epsilon.to_bits(),
            self.alpha_decay_rate.to_bits(),
            self.lambda_decay_rate.to_bits(),
            self.temperature_decay_rate.to_bits(),
            self.epsilon_decay_rate.to_bits(),
        ]
    }

    fn counts(&self) -> [usize; 6] {
        [
            self.hidden_nodes,
            self.num_agents,
            self.num_inputs,
            self.num_outputs,
            self.memory_length,
            self.memory_interval,
        ]
    }
}

impl PartialEq for Settings {
    fn eq(&self, other: &Self) -> bool {
        self.real_bits() == other.real_bits() && self.counts() == other.counts()
    }
}

impl Eq for Settings {}

impl Hash for Settings {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.real_bits().hash(state);
        self.counts().hash(state);
    }
}

impl Add for &Settings {
    type Output = Settings;

    fn add(self, s: &Settings) -> Settings {
        Settings {
            hidden_nodes: self.hidden_nodes + s.hidden_nodes,
            alpha: self.alpha + s.alpha,
            gamma: self.gamma + s.gamma,
            lambda: self.lambda + s.lambda,
            temperature: self.temperature + s.temperature,
            epsilon: self.epsilon + s.epsilon,
            alpha_decay_rate: self.alpha_decay_rate + s.alpha_decay_rate,
            lambda_decay_rate: self.lambda_decay_rate + s.lambda_decay_rate,
            temperature_decay_rate: self.temperature_decay_rate + s.temperature_decay_rate,
            epsilon_decay_rate: self.epsilon_decay_rate + s.epsilon_decay_rate,
            num_agents: self.num_agents + s.num_agents,
            num_inputs: self.num_inputs + s.num_inputs,
            num_outputs: self.num_outputs + s.num_outputs,
            memory_length: self.memory_length + s.memory_length,
            memory_interval: self.memory_interval + s.memory_interval,
        }
    }
}

impl Sub for &Settings {
    type Output = Settings;

    fn sub(self, s: &Settings) -> Settings {
        Settings {
            hidden_nodes: self.hidden_nodes.saturating_sub(s.hidden_nodes),
            alpha: self.alpha - s.alpha,
            gamma: self.gamma - s.gamma,
            lambda: self.lambda - s.lambda,
            temperature: self.temperature - s.temperature,
            epsilon: self.epsilon - s.epsilon,
            alpha_decay_rate: self.alpha_decay_rate - s.alpha_decay_rate,
            lambda_decay_rate: self.lambda_decay_rate - s.lambda_decay_rate,
            temperature_decay_rate: self.temperature_decay_rate - s.temperature_decay_rate,
            epsilon_decay_rate: self.epsilon_decay_rate - s.epsilon_decay_rate,
            num_agents: self.num_agents.saturating_sub(s.num_agents),
            num_inputs: self.num_inputs.saturating_sub(s.num_inputs),
            num_outputs: self.num_outputs.saturating_sub(s.num_outputs),
            memory_length: self.memory_length.saturating_sub(s.memory_length),
            memory_interval: self.memory_interval.saturating_sub(s.memory_interval),
        }
    }
}

impl Mul<f64> for &Settings {
    type Output = Settings;

    fn mul(self, s: f64) -> Settings {
        self.scale_elements(&ElementScale::uniform(s))
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings [hidden_nodes={}, alpha={}, gamma={}, lambda={}, T={}, epsilon={}, \
             alpha_decay_rate={}, lambda_decay_rate={}, T_decay_rate={}, epsilon_decay_rate={}, \
             num_agents={}, num_inputs={}, num_outputs={}, memory_length={}, memory_interval={}]",
            self.hidden_nodes,
            self.alpha,
            self.gamma,
            self.lambda,
            self.temperature,
            self.epsilon,
            self.alpha_decay_rate,
            self.lambda_decay_rate,
            self.temperature_decay_rate,
            self.epsilon_decay_rate,
            self.num_agents,
            self.num_inputs,
            self.num_outputs,
            self.memory_length,
            self.memory_interval,
        )
    }
}
