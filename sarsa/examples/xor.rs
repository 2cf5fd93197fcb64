use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;
use sarsa::{
    core::{
        ApproximatorConfig, CacheConfig, NetworkConfig, SarsaConfig, SarsaLambda, Settings,
        TableConfig,
    },
    util::XorTask,
};

const REPORT_INTERVAL: usize = 100_000;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Backend {
    Table,
    Cache,
    Network,
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Function approximator of the Q function
    #[arg(short, long, value_enum, default_value_t = Backend::Network)]
    backend: Backend,

    /// Maximum number of steps
    #[arg(short, long, default_value_t = 5_000_000)]
    max_steps: usize,

    /// Random seed of the learner and of the task
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Learner configuration in YAML, overrides --backend
    #[arg(short, long)]
    config: Option<String>,
}

fn config(args: &Args) -> Result<SarsaConfig> {
    if let Some(path) = &args.config {
        return SarsaConfig::load(path);
    }

    let settings = Settings::default()
        .num_agents(1)
        .num_inputs(2)
        .num_outputs(2)
        .memory_length(0)
        .memory_interval(1)
        .hidden_nodes(3)
        .alpha(0.01)
        .gamma(0.0)
        .lambda(0.0)
        .temperature(0.01)
        .epsilon(0.01);
    let approximator = match args.backend {
        Backend::Table => ApproximatorConfig::Table(TableConfig::default()),
        Backend::Cache => ApproximatorConfig::Cache(CacheConfig::default()),
        Backend::Network => ApproximatorConfig::Network(NetworkConfig::default()),
    };

    Ok(SarsaConfig::default()
        .settings(settings)
        .approximator(approximator)
        .seed(args.seed))
}

fn run(args: &Args, report_interval: usize) -> Result<bool> {
    let config = config(args)?;
    let mut learner = SarsaLambda::build(config)?;
    let report = XorTask::new(args.seed)
        .report_interval(report_interval)
        .run(&mut learner, args.max_steps)?;
    info!("{:?}", report);
    info!("{}", learner.record());
    Ok(report.learnt)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if !run(&args, REPORT_INTERVAL)? {
        info!("Function not learnt in {} steps", args.max_steps);
    }

    Ok(())
}
