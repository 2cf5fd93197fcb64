//! Short-term state of one agent.
use crate::sa_pair::StateActionPair;
use std::collections::VecDeque;

/// Memory window, step counter and previous state-action pair of an agent.
///
/// Window slots start as placeholders. A placeholder reads as an observation
/// of ones.
#[derive(Debug, Clone)]
pub(super) struct AgentMemory {
    window: VecDeque<Option<Vec<f64>>>,
    step: u64,
    previous: Option<StateActionPair>,
}

impl AgentMemory {
    pub fn new(memory_length: usize) -> Self {
        Self {
            window: (0..memory_length).map(|_| None).collect(),
            step: 0,
            previous: None,
        }
    }

    pub fn reset(&mut self) {
        self.window.iter_mut().for_each(|slot| *slot = None);
        self.step = 0;
        self.previous = None;
    }

    /// Returns `true` while a window slot still holds a placeholder.
    pub fn is_warming(&self) -> bool {
        self.window.iter().any(Option::is_none)
    }

    /// Counts a step and, every `interval` steps, pushes `observation` into
    /// the window, dropping the oldest slot.
    pub fn advance(&mut self, observation: &[f64], interval: usize) {
        self.step += 1;
        if self.window.is_empty() || self.step % interval.max(1) as u64 != 0 {
            return;
        }
        self.window.pop_front();
        self.window.push_back(Some(observation.to_vec()));
    }

    /// Window contents, oldest first, followed by `observation`.
    pub fn state(&self, observation: &[f64]) -> Vec<f64> {
        let mut state = Vec::with_capacity(observation.len() * (1 + self.window.len()));
        for slot in self.window.iter() {
            match slot {
                Some(o) => state.extend_from_slice(o),
                None => state.extend(std::iter::repeat(1.0).take(observation.len())),
            }
        }
        state.extend_from_slice(observation);
        state
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn previous(&self) -> Option<&StateActionPair> {
        self.previous.as_ref()
    }

    pub fn set_previous(&mut self, pair: StateActionPair) {
        self.previous = Some(pair);
    }
}
