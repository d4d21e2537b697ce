//! Train command - Train a learner on a track and race the result

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::output::{
        format_number, format_percent, print_evaluation, print_kv, print_section,
        print_subsection,
    },
    config::LearnerConfig,
    learning::{Algorithm, build_learner},
    pipeline::{
        JsonlObserver, MetricsObserver, ProgressObserver, TrainingConfig, TrainingPipeline,
        TrainingSummary,
    },
    ports::TrainingReport,
    racetrack::{CrashPolicy, load_track},
};

#[derive(Parser, Debug)]
#[command(about = "Train a learner on a track")]
pub struct TrainArgs {
    /// Track file
    pub track: PathBuf,

    /// Learning algorithm (vi, q-learning or sarsa)
    #[arg(long, short = 'a', default_value = "value-iteration")]
    pub algorithm: Algorithm,

    /// Crash policy (minor or major)
    #[arg(long)]
    pub crash: Option<CrashPolicy>,

    /// Number of training episodes (Q-learning and SARSA)
    #[arg(long, short = 'e')]
    pub episodes: Option<usize>,

    /// Maximum number of sweeps (value iteration)
    #[arg(long, short = 'i')]
    pub iterations: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON file with learner settings; flags take precedence
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Number of policy-following runs after training
    #[arg(long, default_value_t = 1)]
    pub evaluation_runs: usize,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Optional path for saving the learned policy
    #[arg(long)]
    pub save_policy: Option<PathBuf>,

    /// Optional file for JSONL observations
    #[arg(long)]
    pub jsonl: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl TrainArgs {
    /// Learner settings from the config file (or the algorithm's defaults)
    /// with flag overrides applied.
    pub fn learner_config(&self) -> Result<LearnerConfig> {
        let mut config = match &self.config {
            Some(path) => LearnerConfig::load_with_defaults(
                path,
                LearnerConfig::for_algorithm(self.algorithm),
            )
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => LearnerConfig::for_algorithm(self.algorithm),
        };

        if let Some(crash) = self.crash {
            config = config.with_crash_policy(crash);
        }
        if let Some(episodes) = self.episodes {
            config = config.with_episodes(episodes);
        }
        if let Some(iterations) = self.iterations {
            config = config.with_max_iterations(iterations);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        Ok(config)
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let grid = Arc::new(
        load_track(&args.track)
            .with_context(|| format!("failed to load track {}", args.track.display()))?,
    );
    let config = args.learner_config()?;
    let seed = config.seed;

    let mut learner = build_learner(args.algorithm, Arc::clone(&grid), config.clone())
        .context("invalid learner configuration")?;

    print_section(&format!("Training {} on {}", learner.name(), args.track.display()));
    print_kv("Grid", &format!("{} x {}", grid.rows(), grid.cols()));
    print_kv("Crash policy", &config.crash_policy.to_string());
    match args.algorithm {
        Algorithm::ValueIteration => {
            print_kv("Max iterations", &format_number(config.max_iterations));
            print_kv("Threshold", &config.bellman_threshold.to_string());
        }
        Algorithm::QLearning | Algorithm::Sarsa => {
            print_kv("Episodes", &format_number(config.episodes));
            print_kv("Learning rate", &config.learning_rate.to_string());
            print_kv("Epsilon", &config.epsilon.to_string());
        }
    }
    print_kv("Discount", &config.discount_factor.to_string());
    if let Some(seed) = seed {
        print_kv("Seed", &seed.to_string());
    }

    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        seed,
        evaluation_runs: args.evaluation_runs,
    })
    .with_observer(Box::new(MetricsObserver::new()));
    if !args.no_progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.jsonl {
        let observer = JsonlObserver::new(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        pipeline = pipeline.with_observer(Box::new(observer));
    }

    let summary = pipeline.run(learner.as_mut()).context("training failed")?;

    print_training(&summary);
    print_evaluation(&grid, &summary.evaluations);

    if let Some(path) = &args.save_policy {
        learner
            .saved_policy()
            .save(path)
            .with_context(|| format!("failed to save policy to {}", path.display()))?;
        println!("\nPolicy saved to {}", path.display());
    }
    if let Some(path) = &args.summary {
        summary
            .save(path)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        println!("Summary written to {}", path.display());
    }

    Ok(())
}

fn print_training(summary: &TrainingSummary) {
    print_subsection("Training");
    match &summary.training {
        TrainingReport::Episodes { steps, converged } => {
            print_kv("Episodes", &format_number(steps.len()));
            if let Some(rate) = summary.training.success_rate() {
                print_kv("Finished", &format_percent(rate));
            }
            if let (Some(last), Some(done)) = (steps.last(), converged.last()) {
                print_kv(
                    "Last episode",
                    &format!("{last} steps{}", if *done { "" } else { " (timed out)" }),
                );
            }
        }
        TrainingReport::Sweeps {
            iterations,
            max_deltas,
            converged,
        } => {
            print_kv("Sweeps", &format_number(*iterations));
            if let Some(delta) = max_deltas.last() {
                print_kv("Final max delta", &format!("{delta:.6}"));
            }
            print_kv("Converged", if *converged { "yes" } else { "no" });
        }
        TrainingReport::Frozen => print_kv("Training", "none (frozen policy)"),
    }
}
