#![warn(missing_docs)]
//! SARSA(λ) control for discrete actions, shared by several agents.
//!
//! A [`SarsaLambda`] learner turns observations and rewards into actions and
//! learns a Q function with eligibility traces. The Q function is one of the
//! [`FunctionApproximator`]s in [`approximator`], selected through
//! [`ApproximatorConfig`].
pub mod approximator;
pub mod error;
pub mod explorer;
pub mod record;

mod learner;
pub use learner::Learner;

mod mat;
pub use mat::Mat;

mod sa_pair;
pub use sa_pair::{QuantizedKey, StateActionPair};

mod sarsa;
pub use sarsa::{DecayedParams, SarsaConfig, SarsaLambda};

mod settings;
pub use settings::{ElementScale, Settings};

pub use approximator::{
    Approximator, ApproximatorConfig, CacheConfig, FunctionApproximator, NetworkConfig, QCache,
    QNetworks, QTable, TableConfig,
};
pub use error::{Result, SarsaError};
pub use explorer::ExplorationConfig;
pub use record::{Record, RecordValue};
