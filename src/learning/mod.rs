//! Tabular learning engines
//!
//! Three interchangeable algorithms learn a driving policy on a fixed grid:
//!
//! | Algorithm | Kind | Update |
//! |-----------|------|--------|
//! | Value iteration | Dynamic programming | Full synchronous sweep over every state |
//! | Q-learning | Off-policy TD | Uses max_a Q(s',a') |
//! | SARSA | On-policy TD | Uses Q(s',a') of the next action actually taken |
//!
//! ## Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use racetrack::{Algorithm, LearnerConfig, build_learner, load_track, pipeline::MetricsObserver};
//!
//! let grid = Arc::new(load_track("tracks/L-track.txt")?);
//! let config = LearnerConfig::for_algorithm(Algorithm::QLearning).with_seed(7);
//! let mut learner = build_learner(Algorithm::QLearning, grid, config)?;
//! learner.train(&mut MetricsObserver::new())?;
//! let run = learner.evaluate()?;
//! println!("finished in {} steps", run.steps);
//! # Ok::<(), racetrack::Error>(())
//! ```

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, config::LearnerConfig, ports::Learner, racetrack::Grid};

pub mod exploration;
pub mod policy;
pub mod q_learning;
pub mod q_table;
pub mod sarsa;
pub mod td;
pub mod value_iteration;

pub use exploration::{ExplorationSchedule, epsilon_greedy};
pub use policy::{GreedyPolicy, TablePolicy};
pub use q_learning::{QLearning, QLearningAgent};
pub use q_table::QTable;
pub use sarsa::{Sarsa, SarsaAgent};
pub use td::{TdAgent, TdRule};
pub use value_iteration::ValueIterationAgent;

/// Learning algorithm selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    ValueIteration,
    QLearning,
    Sarsa,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::ValueIteration,
        Algorithm::QLearning,
        Algorithm::Sarsa,
    ];
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Algorithm::ValueIteration => "value-iteration",
            Algorithm::QLearning => "q-learning",
            Algorithm::Sarsa => "sarsa",
        };
        f.write_str(label)
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "vi" | "value-iteration" => Ok(Algorithm::ValueIteration),
            "q" | "q-learning" | "qlearning" => Ok(Algorithm::QLearning),
            "sarsa" => Ok(Algorithm::Sarsa),
            _ => Err(Error::ParseAlgorithm {
                input: s.to_string(),
                expected: "vi/value-iteration, q-learning, sarsa".to_string(),
            }),
        }
    }
}

/// Create a learner for `algorithm` on `grid`.
///
/// # Errors
///
/// Returns [`Error::InvalidConfiguration`] if `config` fails validation.
pub fn build_learner(
    algorithm: Algorithm,
    grid: Arc<Grid>,
    config: LearnerConfig,
) -> Result<Box<dyn Learner>> {
    config.validate()?;
    tracing::debug!(%algorithm, rows = grid.rows(), cols = grid.cols(), "building learner");
    let learner: Box<dyn Learner> = match algorithm {
        Algorithm::ValueIteration => Box::new(ValueIterationAgent::new(grid, config)),
        Algorithm::QLearning => Box::new(QLearningAgent::new(grid, config)),
        Algorithm::Sarsa => Box::new(SarsaAgent::new(grid, config)),
    };
    Ok(learner)
}
