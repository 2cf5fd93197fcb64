//! XOR task with rewards for correct answers.
use anyhow::Result;
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use sarsa_core::Learner;

/// Outcome of [`XorTask::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XorReport {
    /// Steps taken.
    pub steps: usize,

    /// Moving average of correct answers at the last step.
    pub moving_average: f64,

    /// Whether the moving average reached the target.
    pub learnt: bool,
}

/// Presents random sign pairs `(±10, ±10)` to agent 0 of a learner, which
/// has to answer 1 when the signs differ and 0 otherwise.
///
/// The reward for an answer, 1 if correct and 0 if not, is passed with the
/// next observation. The learner needs 2 inputs and 2 outputs.
pub struct XorTask {
    rng: StdRng,
    ma_period: f64,
    target: f64,
    report_interval: usize,
}

impl XorTask {
    /// Task drawing its inputs from a generator seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ma_period: 100.0,
            target: 0.95,
            report_interval: 100_000,
        }
    }

    /// Sets the period of the moving average of correct answers.
    pub fn ma_period(mut self, v: f64) -> Self {
        self.ma_period = v;
        self
    }

    /// Sets the moving average at which the task counts as learnt.
    pub fn target(mut self, v: f64) -> Self {
        self.target = v;
        self
    }

    /// Sets the interval, in steps, of progress reports. The target is only
    /// checked at reports.
    pub fn report_interval(mut self, v: usize) -> Self {
        self.report_interval = v.max(1);
        self
    }

    /// Runs until the task is learnt or `max_steps` steps have been taken.
    pub fn run<L: Learner>(&mut self, learner: &mut L, max_steps: usize) -> Result<XorReport> {
        let mut reward = 0.0;
        let mut ma = 0.0;

        for step in 1..=max_steps {
            let i1 = if self.rng.gen::<f64>() < 0.5 { 10.0 } else { -10.0 };
            let i2 = if self.rng.gen::<f64>() < 0.5 { 10.0 } else { -10.0 };
            let desired = ((i1 > 0.0) ^ (i2 > 0.0)) as usize;

            let output = learner.get_action_single(&[i1, i2], reward)?;
            reward = if output == desired { 1.0 } else { 0.0 };
            ma += (reward - ma) / self.ma_period;

            if step % self.report_interval == 0 {
                info!("{}: {}% correct", step, (ma * 100.0).round());
                if ma >= self.target {
                    info!("Function learnt");
                    return Ok(XorReport {
                        steps: step,
                        moving_average: ma,
                        learnt: true,
                    });
                }
            }
        }

        Ok(XorReport {
            steps: max_steps,
            moving_average: ma,
            learnt: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sarsa_core::{ApproximatorConfig, SarsaConfig, SarsaLambda, Settings, TableConfig};

    fn settings() -> Settings {
        Settings::default()
            .num_inputs(2)
            .num_outputs(2)
            .alpha(0.1)
            .gamma(0.0)
            .lambda(0.0)
            .temperature(0.01)
            .epsilon(0.01)
    }

    #[test]
    fn test_table_learns_xor() -> Result<()> {
        let config = SarsaConfig::default()
            .settings(settings())
            .approximator(ApproximatorConfig::Table(TableConfig::default()));
        let mut learner = SarsaLambda::build(config)?;
        let report = XorTask::new(0)
            .report_interval(100)
            .run(&mut learner, 20_000)?;
        assert!(report.learnt, "{:?}", report);
        Ok(())
    }

    #[test]
    fn test_stops_at_max_steps() -> Result<()> {
        let config = SarsaConfig::default()
            .settings(settings())
            .approximator(ApproximatorConfig::Table(TableConfig::default()));
        let mut learner = SarsaLambda::build(config)?;
        let report = XorTask::new(0).target(1.1).run(&mut learner, 500)?;
        assert!(!report.learnt);
        assert_eq!(report.steps, 500);
        assert_eq!(learner.step(0)?, 500);
        Ok(())
    }
}
