//! Learner port - abstraction over the three learning algorithms
//!
//! Value iteration, Q-learning and SARSA all train against the same grid and
//! produce a policy that the episode driver can follow. A frozen policy
//! loaded from disk implements the same port.

use serde::{Deserialize, Serialize};

use super::observer::Observer;
use crate::{
    Result,
    episode::EpisodeOutcome,
    learning::Algorithm,
    persistence::SavedPolicy,
    racetrack::{CrashPolicy, Grid, VehicleState},
    types::Acceleration,
};

/// Outcome of one policy-following run
pub type EvaluationResult = EpisodeOutcome;

/// What a learner reports after training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainingReport {
    /// Per-episode step counts and finish flags of a TD learner.
    Episodes {
        steps: Vec<usize>,
        converged: Vec<bool>,
    },
    /// Value-iteration sweep history; `max_deltas[0]` is a zero placeholder.
    Sweeps {
        iterations: usize,
        max_deltas: Vec<f64>,
        converged: bool,
    },
    /// The learner does not train.
    Frozen,
}

impl TrainingReport {
    /// Whether training ended in a converged state.
    ///
    /// For TD learners this is the finish flag of the last episode.
    pub fn converged(&self) -> bool {
        match self {
            TrainingReport::Episodes { converged, .. } => {
                converged.last().copied().unwrap_or(false)
            }
            TrainingReport::Sweeps { converged, .. } => *converged,
            TrainingReport::Frozen => true,
        }
    }

    /// Number of episodes or sweeps performed.
    pub fn len(&self) -> usize {
        match self {
            TrainingReport::Episodes { steps, .. } => steps.len(),
            TrainingReport::Sweeps { iterations, .. } => *iterations,
            TrainingReport::Frozen => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fraction of episodes that reached the finish line.
    pub fn success_rate(&self) -> Option<f64> {
        match self {
            TrainingReport::Episodes { converged, .. } if !converged.is_empty() => {
                let finished = converged.iter().filter(|&&done| done).count();
                Some(finished as f64 / converged.len() as f64)
            }
            _ => None,
        }
    }
}

/// Learner trait - unified interface for all learning approaches
pub trait Learner: Send {
    /// Get the learner's name.
    fn name(&self) -> &str;

    fn algorithm(&self) -> Algorithm;

    /// The grid this learner drives on.
    fn grid(&self) -> &Grid;

    fn crash_policy(&self) -> CrashPolicy;

    /// Run the full training procedure, reporting progress to `observer`.
    fn train(&mut self, observer: &mut dyn Observer) -> Result<TrainingReport>;

    /// Follow the current policy once from an evaluation start cell.
    fn evaluate(&mut self) -> Result<EvaluationResult>;

    /// The acceleration the learned policy picks in `state`.
    ///
    /// `state` must lie on the grid.
    fn policy_action(&self, state: VehicleState) -> Acceleration;

    /// Seed the learner's internal random number generator.
    ///
    /// Training pipelines call this method when supplied with a deterministic
    /// seed to ensure reproducible results.
    ///
    /// # Default Implementation
    ///
    /// Does nothing and returns `Ok(())`.
    fn set_rng_seed(&mut self, _seed: u64) -> Result<()> {
        Ok(())
    }

    /// Snapshot of the greedy action in every state.
    fn saved_policy(&self) -> SavedPolicy {
        SavedPolicy::capture(self)
    }
}
