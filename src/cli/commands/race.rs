//! Race command - Follow a saved policy on a track

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::output::{print_evaluation, print_kv, print_section},
    config::LearnerConfig,
    episode::{StartSelection, TRAINING_STEP_BUDGET},
    persistence::{PolicyLearner, SavedPolicy},
    pipeline::{TrainingConfig, TrainingPipeline},
    ports::Learner,
    racetrack::load_track,
};

#[derive(Parser, Debug)]
#[command(about = "Race a saved policy on a track")]
pub struct RaceArgs {
    /// Track file
    pub track: PathBuf,

    /// Policy file written by `train --save-policy`
    pub policy: PathBuf,

    /// Number of runs
    #[arg(long, short = 'n', default_value_t = 1)]
    pub runs: usize,

    /// Step budget per run
    #[arg(long, default_value_t = TRAINING_STEP_BUDGET)]
    pub max_steps: usize,

    /// Start from any track cell instead of the start line
    #[arg(long, default_value_t = false)]
    pub anywhere: bool,

    /// Random seed for start-cell selection
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn execute(args: RaceArgs) -> Result<()> {
    let grid = Arc::new(
        load_track(&args.track)
            .with_context(|| format!("failed to load track {}", args.track.display()))?,
    );
    let policy = SavedPolicy::load(&args.policy)
        .with_context(|| format!("failed to load policy {}", args.policy.display()))?;

    let evaluation_start = if args.anywhere {
        StartSelection::ValidCells
    } else {
        StartSelection::StartCells
    };
    let config = LearnerConfig::default()
        .with_max_evaluation_steps(args.max_steps)
        .with_evaluation_start(evaluation_start);
    config.validate().context("invalid race settings")?;

    let mut learner = PolicyLearner::new(Arc::clone(&grid), policy, config)
        .context("policy does not fit this track")?;

    print_section(&format!("Racing {} on {}", learner.name(), args.track.display()));
    print_kv("Policy", &args.policy.display().to_string());
    print_kv("Crash policy", &learner.policy().crash_policy.to_string());

    let summary = TrainingPipeline::new(TrainingConfig {
        seed: args.seed,
        evaluation_runs: args.runs,
    })
    .run(&mut learner)
    .context("race failed")?;

    print_evaluation(&grid, &summary.evaluations);
    Ok(())
}
