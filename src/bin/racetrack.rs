//! Racetrack CLI - Train and race tabular agents on grid tracks
//!
//! This CLI provides a unified interface for:
//! - Training value iteration, Q-learning or SARSA on a track file
//! - Inspecting a track's geometry
//! - Racing a saved policy

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "racetrack")]
#[command(version, about = "Tabular reinforcement learning on grid racetracks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a learner and race the learned policy
    Train(racetrack::cli::commands::train::TrainArgs),

    /// Show statistics for a track file
    Inspect(racetrack::cli::commands::inspect::InspectArgs),

    /// Follow a saved policy on a track
    Race(racetrack::cli::commands::race::RaceArgs),
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    match cli.command {
        Commands::Train(args) => racetrack::cli::commands::train::execute(args),
        Commands::Inspect(args) => racetrack::cli::commands::inspect::execute(args),
        Commands::Race(args) => racetrack::cli::commands::race::execute(args),
    }
}
