//! `hulhe`: the command-line entry point for building HU-LHE game trees,
//! training CFR/CFR+ strategies against them, and running the reference
//! validation fixtures.

use clap::{Parser, Subcommand};
use hulhe_cfr::{train, FullDeckChance, SolverState};
use hulhe_core::{CFRConfig, GameParams, SamplingStrategy};
use hulhe_tree::build_game_tree;
use log::info;
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[derive(Parser)]
#[command(name = "hulhe", about = "HU-LHE CFR equilibrium solver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a game tree and report its size, without training.
    Build {
        #[arg(long, default_value_t = 400)]
        stack: i32,
        #[arg(long = "sb", default_value_t = 1)]
        small_blind: i32,
        #[arg(long = "bb", default_value_t = 2)]
        big_blind: i32,
        #[arg(long = "max-raises", default_value_t = 4)]
        max_raises: usize,
        #[arg(long)]
        preflop_only: bool,
    },
    /// Train CFR/CFR+ on a freshly built tree.
    Train {
        #[arg(long, default_value_t = 4)]
        stack: i32,
        #[arg(long = "sb", default_value_t = 1)]
        small_blind: i32,
        #[arg(long = "bb", default_value_t = 2)]
        big_blind: i32,
        #[arg(long = "max-raises", default_value_t = 4)]
        max_raises: usize,
        #[arg(long)]
        preflop_only: bool,
        #[arg(long, default_value_t = 10_000)]
        iterations: usize,
        #[arg(long = "cfr-plus")]
        cfr_plus: bool,
        #[arg(long)]
        linear: bool,
        #[arg(long, value_enum)]
        sampling: Option<SamplingArg>,
        #[arg(long, default_value_t = 0.001)]
        target_exploitability: f64,
        #[arg(long, default_value_t = 3600)]
        max_time: u64,
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Run the three reference validation fixtures (RPS, Kuhn, HU-LHE
    /// preflop-only scenario) and report PASS/FAIL for each.
    Validate {
        #[arg(long, default_value_t = 10_000)]
        iterations: usize,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum SamplingArg {
    Chance,
    External,
    Outcome,
}

impl From<SamplingArg> for SamplingStrategy {
    fn from(value: SamplingArg) -> Self {
        match value {
            SamplingArg::Chance => SamplingStrategy::Chance,
            SamplingArg::External => SamplingStrategy::External,
            SamplingArg::Outcome => SamplingStrategy::Outcome,
        }
    }
}

fn main() -> anyhow::Result<()> {
    hulhe_core::init_logging(log::LevelFilter::Info)?;
    ctrlc::set_handler(hulhe_core::request_stop)?;
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            stack,
            small_blind,
            big_blind,
            max_raises,
            preflop_only,
        } => {
            let params = GameParams::new(stack, small_blind, big_blind, max_raises)?;
            let tree = build_game_tree(params, preflop_only, true)?;
            info!(
                "built tree: {} nodes, {} terminals, {} player nodes",
                tree.nodes.len(),
                tree.terminal_nodes.len(),
                tree.player_nodes.len()
            );
            println!(
                "nodes={} terminals={} player_nodes={}",
                tree.nodes.len(),
                tree.terminal_nodes.len(),
                tree.player_nodes.len()
            );
            Ok(())
        }
        Command::Train {
            stack,
            small_blind,
            big_blind,
            max_raises,
            preflop_only,
            iterations,
            cfr_plus,
            linear,
            sampling,
            target_exploitability,
            max_time,
            seed,
        } => {
            let params = GameParams::new(stack, small_blind, big_blind, max_raises)?;
            let tree = build_game_tree(params, preflop_only, false)?;

            let sampling_strategy = sampling.map(SamplingStrategy::from).unwrap_or(SamplingStrategy::None);
            let mut config = CFRConfig {
                use_cfr_plus: cfr_plus,
                use_linear_weighting: linear,
                use_sampling: sampling.is_some(),
                sampling_strategy,
                target_exploitability,
                max_time_seconds: max_time,
                max_iterations: iterations,
                ..CFRConfig::default()
            };
            config.min_iterations = config.min_iterations.min(iterations);
            let config = config.validated()?;
            hulhe_core::set_deadline(std::time::Duration::from_secs(max_time));

            let mut state = SolverState::new();
            let chance = FullDeckChance;
            let mut rng = SmallRng::seed_from_u64(seed);
            let reason = train(&tree, &mut state, config, None, &chance, Some(iterations), &mut rng);

            let stats = state.training_stats();
            info!("training stopped: {reason}");
            println!(
                "iterations={} infosets={} it/s={:.1} stopping_reason={}",
                stats.iterations,
                stats.infosets,
                stats.iterations_per_second,
                reason
            );
            Ok(())
        }
        Command::Validate { iterations } => {
            let results = hulhe_validation::run_all(iterations);
            let mut all_passed = true;
            for result in &results {
                let status = if result.passed() { "PASS" } else { "FAIL" };
                if !result.passed() {
                    all_passed = false;
                }
                println!(
                    "[{status}] {}: observed={:.6} expected={:.6} tolerance={:.6} infosets={}",
                    result.name, result.observed_value, result.expected_value, result.tolerance, result.infosets
                );
            }
            if all_passed {
                Ok(())
            } else {
                anyhow::bail!("one or more validation fixtures failed")
            }
        }
    }
}
