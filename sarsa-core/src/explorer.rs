//! Exploration strategies of [`SarsaLambda`](crate::SarsaLambda).
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Selects the exploration layers applied on top of the greedy action.
///
/// Both layers are enabled by default and are applied in order: Boltzmann
/// sampling first, then the epsilon-greedy override.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ExplorationConfig {
    /// Sample the action from the softmax of the estimates.
    pub boltzmann: bool,

    /// With probability epsilon, replace the action with a uniformly random one.
    pub epsilon_greedy: bool,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            boltzmann: true,
            epsilon_greedy: true,
        }
    }
}

impl ExplorationConfig {
    /// Enables or disables Boltzmann sampling.
    pub fn boltzmann(mut self, v: bool) -> Self {
        self.boltzmann = v;
        self
    }

    /// Enables or disables the epsilon-greedy override.
    pub fn epsilon_greedy(mut self, v: bool) -> Self {
        self.epsilon_greedy = v;
        self
    }

    /// Greedy selection only.
    pub fn greedy() -> Self {
        Self {
            boltzmann: false,
            epsilon_greedy: false,
        }
    }

    /// Takes an action given the estimates `q` of every action.
    pub fn action<R: Rng + ?Sized>(
        &self,
        q: &[f64],
        temperature: f64,
        epsilon: f64,
        rng: &mut R,
    ) -> usize {
        let mut action = if self.boltzmann {
            boltzmann(q, temperature, rng)
        } else {
            greedy(q)
        };

        if self.epsilon_greedy {
            action = epsilon_greedy(action, q.len(), epsilon, rng);
        }

        action
    }
}

/// Index of the first maximal estimate.
pub fn greedy(q: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in q.iter().enumerate().skip(1) {
        if *v > q[best] {
            best = i;
        }
    }
    best
}

/// Samples an action with probability proportional to `exp(q / temperature)`.
///
/// The maximum estimate is subtracted before exponentiation. A temperature
/// that is not strictly positive and finite selects [`greedy`].
pub fn boltzmann<R: Rng + ?Sized>(q: &[f64], temperature: f64, rng: &mut R) -> usize {
    let r: f64 = rng.gen();
    if !(temperature > 0.0 && temperature.is_finite()) || q.is_empty() {
        return greedy(q);
    }

    let max = q.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = q.iter().map(|v| ((v - max) / temperature).exp()).collect();
    let total: f64 = weights.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return greedy(q);
    }

    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w / total;
        if r < cumulative {
            return i;
        }
    }

    // Rounding left the cumulative sum just below r.
    greedy(q)
}

/// With probability `epsilon` returns a uniformly random action in
/// `0..num_outputs`, otherwise `action`.
pub fn epsilon_greedy<R: Rng + ?Sized>(
    action: usize,
    num_outputs: usize,
    epsilon: f64,
    rng: &mut R,
) -> usize {
    let r: f64 = rng.gen();
    if r < epsilon && num_outputs > 0 {
        rng.gen_range(0..num_outputs)
    } else {
        action
    }
}
