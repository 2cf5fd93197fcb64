//! SARSA(λ) learning engine.
//!
//! The engine consists of the following crates:
//!
//! * [sarsa-core](../sarsa_core/index.html) provides the learner, the
//!   function approximators of the Q function (table, table with eviction,
//!   and one neural network per action) and their configuration.
//! * `sarsa` re-exports the core crate and adds utilities to drive learners
//!   on toy tasks, together with examples.
pub mod util;

pub use sarsa_core as core;
