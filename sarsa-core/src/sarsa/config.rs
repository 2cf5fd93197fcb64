//! Configuration of [`SarsaLambda`](super::SarsaLambda).
use crate::{approximator::ApproximatorConfig, explorer::ExplorationConfig, settings::Settings};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`SarsaLambda`](super::SarsaLambda).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SarsaConfig {
    /// Hyperparameters.
    pub settings: Settings,

    /// Function approximator of the Q function.
    pub approximator: ApproximatorConfig,

    /// Exploration layers.
    pub exploration: ExplorationConfig,

    /// Seed of the random number generator used for weight initialization
    /// and exploration.
    pub seed: u64,
}

impl Default for SarsaConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            approximator: ApproximatorConfig::default(),
            exploration: ExplorationConfig::default(),
            seed: 42,
        }
    }
}

impl SarsaConfig {
    /// Sets the hyperparameters.
    pub fn settings(mut self, v: Settings) -> Self {
        self.settings = v;
        self
    }

    /// Sets the function approximator.
    pub fn approximator(mut self, v: ApproximatorConfig) -> Self {
        self.approximator = v;
        self
    }

    /// Sets the exploration layers.
    pub fn exploration(mut self, v: ExplorationConfig) -> Self {
        self.exploration = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`SarsaConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`SarsaConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approximator::CacheConfig;
    use tempdir::TempDir;

    #[test]
    fn test_serde_sarsa_config() -> Result<()> {
        let config = SarsaConfig::default()
            .settings(Settings::default().num_inputs(3).memory_length(2))
            .approximator(ApproximatorConfig::Cache(
                CacheConfig::default().expire_after_games(4 * 500, 100),
            ))
            .exploration(ExplorationConfig::default().boltzmann(false))
            .seed(7);

        let dir = TempDir::new("sarsa_config")?;
        let path = dir.path().join("sarsa_config.yaml");
        println!("{:?}", path);

        config.save(&path)?;
        let config_ = SarsaConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
