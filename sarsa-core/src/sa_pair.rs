//! State-action pairs.
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// An observation vector paired with a discrete action.
///
/// Equality is element-wise on the state and exact on the action; hashing
/// agrees with it, so pairs can be used as map keys.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StateActionPair {
    state: Vec<f64>,
    action: usize,
}

impl StateActionPair {
    /// Pairs `state` with `action`.
    pub fn new(state: Vec<f64>, action: usize) -> Self {
        Self { state, action }
    }

    /// The state.
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    /// The action.
    pub fn action(&self) -> usize {
        self.action
    }

    /// Sign projection used as the key of the table Q functions.
    ///
    /// Each element becomes `element > 0`, so states that differ only in
    /// magnitude map to the same key.
    pub fn quantize(&self) -> QuantizedKey {
        QuantizedKey {
            signs: self.state.iter().map(|x| *x > 0.0).collect(),
            action: self.action,
        }
    }
}

impl PartialEq for StateActionPair {
    fn eq(&self, other: &Self) -> bool {
        self.action == other.action
            && self.state.len() == other.state.len()
            && self
                .state
                .iter()
                .zip(other.state.iter())
                .all(|(a, b)| OrderedFloat(*a) == OrderedFloat(*b))
    }
}

impl Eq for StateActionPair {}

impl Hash for StateActionPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.action.hash(state);
        self.state.len().hash(state);
        for x in self.state.iter() {
            OrderedFloat(*x).hash(state);
        }
    }
}

/// Quantized state-action pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuantizedKey {
    signs: Vec<bool>,
    action: usize,
}

impl QuantizedKey {
    /// Signs of the state elements (`true` where the element is positive).
    pub fn signs(&self) -> &[bool] {
        &self.signs
    }

    /// The action.
    pub fn action(&self) -> usize {
        self.action
    }
}
