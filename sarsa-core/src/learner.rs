//! Learner interface.
use crate::error::Result;

/// A controller that picks discrete actions and learns from rewards.
///
/// One learner serves several agents, identified by index. Agents share what
/// is learned but keep their own short-term state (memory window, previous
/// state-action pair, eligibility trace).
pub trait Learner {
    /// Starts a new episode for every agent.
    ///
    /// Learned estimates are kept.
    fn reset(&mut self) -> Result<()>;

    /// Observes `observation` and `reward` for `agent`, learns from the
    /// transition and returns the action to take.
    fn get_action(&mut self, observation: &[f64], reward: f64, agent: usize) -> Result<usize>;

    /// Learns as if `action` had been chosen in `state`.
    ///
    /// `state` is the effective state: memory window followed by the current
    /// observation.
    fn force_action(
        &mut self,
        state: &[f64],
        reward: f64,
        agent: usize,
        action: usize,
    ) -> Result<()>;

    /// Estimates of every action in `state`, without side effects.
    fn evaluate_state(&self, state: &[f64]) -> Result<Vec<f64>>;

    /// [`Learner::get_action`] for agent 0.
    fn get_action_single(&mut self, observation: &[f64], reward: f64) -> Result<usize> {
        self.get_action(observation, reward, 0)
    }
}
