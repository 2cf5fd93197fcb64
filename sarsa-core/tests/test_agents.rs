use anyhow::Result;
use sarsa_core::{
    ApproximatorConfig, ExplorationConfig, Learner, QTable, SarsaConfig, SarsaLambda, Settings,
    TableConfig,
};

#[test]
fn test_agents_share_estimates_not_history() -> Result<()> {
    let settings = Settings::default()
        .num_agents(3)
        .num_inputs(1)
        .memory_length(1)
        .alpha(0.5)
        .gamma(0.0)
        .lambda(0.0);
    let config = SarsaConfig::default()
        .settings(settings)
        .approximator(ApproximatorConfig::Table(TableConfig::default().initial_q(0.0)))
        .exploration(ExplorationConfig::greedy());
    let mut learner = SarsaLambda::build(config)?;

    // Agent 0 fills its window and acts twice, agent 2 only warms up.
    learner.get_action(&[1.0], 0.0, 0)?;
    learner.get_action(&[1.0], 0.0, 0)?;
    learner.get_action(&[1.0], 4.0, 0)?;
    learner.get_action(&[-1.0], 0.0, 2)?;

    assert_eq!(learner.step(0)?, 3);
    assert_eq!(learner.step(1)?, 0);
    assert_eq!(learner.step(2)?, 1);
    assert!(learner.previous_pair(0)?.is_some());
    assert!(learner.previous_pair(1)?.is_none());
    assert!(learner.previous_pair(2)?.is_none());

    // The reward of agent 0 is visible to every agent.
    assert_eq!(learner.evaluate_state(&[1.0, 1.0])?, vec![2.0, 0.0]);

    learner.reset()?;
    assert!(learner.previous_pair(0)?.is_none());
    assert_eq!(learner.evaluate_state(&[1.0, 1.0])?, vec![2.0, 0.0]);
    Ok(())
}

#[test]
fn test_custom_approximator() -> Result<()> {
    let settings = Settings::default().num_agents(2).num_outputs(3);
    let q = QTable::build(&TableConfig::default().initial_q(1.0), 2, 3);
    let mut learner = SarsaLambda::new(settings, q, ExplorationConfig::default(), 0)?;

    for i in 0..100 {
        let action = learner.get_action(&[i as f64 - 50.0], 1.0, i % 2)?;
        assert!(action < 3);
    }
    assert!(learner.approximator().eligibility_len(0)? <= 6);
    Ok(())
}

#[test]
fn test_learner_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<SarsaLambda>();
}
