//! Saved policies
//!
//! A trained learner is stored as the greedy acceleration of every state,
//! which is all the episode driver needs to race it again later.

use std::{fs::File, io::BufWriter, path::Path, sync::Arc};

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    config::LearnerConfig,
    episode::EpisodeDriver,
    learning::{Algorithm, TablePolicy, td::build_rng},
    ports::{EvaluationResult, Learner, Observer, TrainingReport},
    racetrack::{CrashPolicy, Grid, VehicleState},
    state_space::StateIndex,
    tables::{CELL_STRIDE, StateTable},
    types::Acceleration,
};

/// Format version written by [`SavedPolicy::save`].
pub const POLICY_FORMAT_VERSION: u32 = 1;

/// Greedy policy of a trained learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPolicy {
    pub version: u32,
    pub algorithm: Algorithm,
    pub crash_policy: CrashPolicy,
    pub rows: usize,
    pub cols: usize,
    pub actions: StateTable<Acceleration>,
}

impl SavedPolicy {
    /// Record the action `learner` picks in every state of its grid.
    pub fn capture<L: Learner + ?Sized>(learner: &L) -> Self {
        let grid = learner.grid();
        let actions = StateTable::from_fn(grid.rows(), grid.cols(), |index| {
            learner.policy_action(index.to_state())
        });
        Self {
            version: POLICY_FORMAT_VERSION,
            algorithm: learner.algorithm(),
            crash_policy: learner.crash_policy(),
            rows: grid.rows(),
            cols: grid.cols(),
            actions,
        }
    }

    /// The stored action for `state`.
    pub fn action(&self, state: VehicleState) -> Acceleration {
        *self.actions.get(StateIndex::from_state(state))
    }

    /// Check that this policy was recorded on a grid of the same size.
    pub fn check_grid(&self, grid: &Grid) -> Result<()> {
        if (self.rows, self.cols) != (grid.rows(), grid.cols()) {
            return Err(Error::PolicyMismatch {
                message: format!(
                    "policy covers a {}x{} grid, track is {}x{}",
                    self.rows,
                    self.cols,
                    grid.rows(),
                    grid.cols()
                ),
            });
        }
        Ok(())
    }

    /// Save the policy to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|source| Error::io(format!("create policy file {}", path.display()), source))?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load a policy from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|source| Error::io(format!("open policy file {}", path.display()), source))?;
        let policy: SavedPolicy = serde_json::from_reader(std::io::BufReader::new(file))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Check the format version and that the action table covers every state
    /// of the grid named in the header.
    pub fn validate(&self) -> Result<()> {
        if self.version != POLICY_FORMAT_VERSION {
            return Err(Error::PolicyMismatch {
                message: format!(
                    "unsupported format version {} (expected {POLICY_FORMAT_VERSION})",
                    self.version
                ),
            });
        }
        let expected = (self.rows, self.cols, 11, 11);
        if self.actions.shape() != expected {
            return Err(Error::PolicyMismatch {
                message: format!(
                    "action table has shape {:?}, header says {:?}",
                    self.actions.shape(),
                    expected
                ),
            });
        }
        if !self.actions.is_complete() {
            return Err(Error::PolicyMismatch {
                message: format!(
                    "action table holds {} entries, a {}x{} grid needs {}",
                    self.actions.len(),
                    self.rows,
                    self.cols,
                    self.rows * self.cols * CELL_STRIDE
                ),
            });
        }
        Ok(())
    }
}

/// A frozen saved policy behind the learner port
///
/// Races with the crash policy stored in the saved policy; the step budget,
/// start selection and seed come from the configuration.
#[derive(Debug, Clone)]
pub struct PolicyLearner {
    name: String,
    grid: Arc<Grid>,
    policy: SavedPolicy,
    config: LearnerConfig,
    rng: StdRng,
}

impl PolicyLearner {
    /// # Errors
    ///
    /// Returns [`Error::PolicyMismatch`] if the policy is malformed or was
    /// recorded on a grid of a different size.
    pub fn new(grid: Arc<Grid>, policy: SavedPolicy, config: LearnerConfig) -> Result<Self> {
        policy.validate()?;
        policy.check_grid(&grid)?;
        Ok(Self {
            name: format!("Saved {}", policy.algorithm),
            rng: build_rng(config.seed),
            grid,
            policy,
            config,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn policy(&self) -> &SavedPolicy {
        &self.policy
    }
}

impl Learner for PolicyLearner {
    fn name(&self) -> &str {
        &self.name
    }

    fn algorithm(&self) -> Algorithm {
        self.policy.algorithm
    }

    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn crash_policy(&self) -> CrashPolicy {
        self.policy.crash_policy
    }

    fn train(&mut self, _observer: &mut dyn Observer) -> Result<TrainingReport> {
        Ok(TrainingReport::Frozen)
    }

    fn evaluate(&mut self) -> Result<EvaluationResult> {
        let driver = EpisodeDriver::new(
            &self.grid,
            self.policy.crash_policy,
            self.config.max_evaluation_steps,
        );
        let start = self.config.evaluation_start.pick(&self.grid, &mut self.rng)?;
        driver.run(start, &mut TablePolicy::new(&self.policy.actions))
    }

    fn policy_action(&self, state: VehicleState) -> Acceleration {
        self.policy.action(state)
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.rng = StdRng::seed_from_u64(seed);
        Ok(())
    }

    fn saved_policy(&self) -> SavedPolicy {
        self.policy.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{learning::ValueIterationAgent, pipeline::MetricsObserver, types::Position};

    fn corridor() -> Arc<Grid> {
        Arc::new("5,5\n#####\n##F##\n##.##\n##S##\n#####\n".parse().unwrap())
    }

    #[test]
    fn captured_policy_matches_learner() {
        let grid = corridor();
        let mut agent = ValueIterationAgent::new(
            Arc::clone(&grid),
            LearnerConfig::for_algorithm(Algorithm::ValueIteration),
        );
        agent.train(&mut MetricsObserver::new()).unwrap();

        let saved = agent.saved_policy();
        assert_eq!(saved.algorithm, Algorithm::ValueIteration);
        for index in saved.actions.iter_indices() {
            let state = index.to_state();
            assert_eq!(saved.action(state), agent.policy_action(state));
        }
    }

    #[test]
    fn rejects_grid_of_other_size() {
        let grid = corridor();
        let agent = ValueIterationAgent::new(Arc::clone(&grid), LearnerConfig::default());
        let saved = agent.saved_policy();
        let other = Arc::new("1,3\nS.F\n".parse::<Grid>().unwrap());
        assert!(matches!(
            PolicyLearner::new(other, saved, LearnerConfig::default()),
            Err(Error::PolicyMismatch { .. })
        ));
    }

    #[test]
    fn frozen_learner_replays_policy() {
        let grid = corridor();
        let mut agent = ValueIterationAgent::new(
            Arc::clone(&grid),
            LearnerConfig::for_algorithm(Algorithm::ValueIteration),
        );
        agent.train(&mut MetricsObserver::new()).unwrap();

        let mut frozen = PolicyLearner::new(
            grid,
            agent.saved_policy(),
            LearnerConfig::for_algorithm(Algorithm::ValueIteration),
        )
        .unwrap();
        assert_eq!(frozen.train(&mut MetricsObserver::new()).unwrap(), TrainingReport::Frozen);
        let run = frozen.evaluate().unwrap();
        assert!(run.finished);
        assert_eq!(run.trajectory[0], Position::new(3, 2));
        assert_eq!(run.steps, 2);
    }

    #[test]
    fn truncated_action_table_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("policy.json");
        std::fs::write(
            &path,
            r#"{
                "version": 1,
                "algorithm": "value-iteration",
                "crash_policy": "minor",
                "rows": 5,
                "cols": 5,
                "actions": { "rows": 5, "cols": 5, "data": [] }
            }"#,
        )
        .unwrap();
        assert!(matches!(
            SavedPolicy::load(&path),
            Err(Error::PolicyMismatch { .. })
        ));

        let agent = ValueIterationAgent::new(corridor(), LearnerConfig::default());
        let mut saved = agent.saved_policy();
        saved.actions = StateTable::from_fn(5, 5, |_| Acceleration::NONE);
        assert!(saved.validate().is_ok());
        saved.actions = StateTable::filled(5, 4, Acceleration::NONE);
        assert!(PolicyLearner::new(corridor(), saved, LearnerConfig::default()).is_err());
    }
}
