//! Learner configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Error, Result,
    episode::{StartSelection, TRAINING_STEP_BUDGET, VALUE_ITERATION_STEP_BUDGET},
    learning::Algorithm,
    racetrack::CrashPolicy,
};

/// Parameters shared by all learners.
///
/// Fields a learner does not use are ignored by it: value iteration reads
/// `discount_factor`, `bellman_threshold` and `max_iterations`, the TD
/// learners read the episode and exploration settings.
///
/// # Examples
///
/// ```
/// use racetrack::{Algorithm, CrashPolicy, LearnerConfig};
///
/// let config = LearnerConfig::for_algorithm(Algorithm::Sarsa)
///     .with_seed(42)
///     .with_crash_policy(CrashPolicy::Major)
///     .with_episodes(2000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    pub crash_policy: CrashPolicy,
    /// Training episodes for Q-learning and SARSA
    pub episodes: usize,
    pub max_training_steps: usize,
    pub max_evaluation_steps: usize,
    /// Discount factor γ
    pub discount_factor: f64,
    /// Initial learning rate α
    pub learning_rate: f64,
    /// α stops decaying once it is no longer above this value
    pub min_learning_rate: f64,
    pub learning_rate_decay: f64,
    /// Initial exploration rate ε
    pub epsilon: f64,
    pub epsilon_decay: f64,
    pub min_epsilon: f64,
    /// Value iteration stops once the largest value change drops below this
    pub bellman_threshold: f64,
    /// Value iteration sweep cap
    pub max_iterations: usize,
    /// Where training episodes begin
    pub start_selection: StartSelection,
    /// Where evaluation runs begin
    pub evaluation_start: StartSelection,
    pub seed: Option<u64>,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            crash_policy: CrashPolicy::Minor,
            episodes: 999,
            max_training_steps: TRAINING_STEP_BUDGET,
            max_evaluation_steps: TRAINING_STEP_BUDGET,
            discount_factor: 0.95,
            learning_rate: 0.75,
            min_learning_rate: 0.01,
            learning_rate_decay: 0.9999,
            epsilon: 0.5,
            epsilon_decay: 0.9999,
            min_epsilon: 0.0,
            bellman_threshold: 0.1,
            max_iterations: 50,
            start_selection: StartSelection::ValidCells,
            evaluation_start: StartSelection::StartCells,
            seed: None,
        }
    }
}

impl LearnerConfig {
    /// Defaults for `algorithm`; value iteration evaluates with a shorter budget.
    pub fn for_algorithm(algorithm: Algorithm) -> Self {
        let max_evaluation_steps = match algorithm {
            Algorithm::ValueIteration => VALUE_ITERATION_STEP_BUDGET,
            Algorithm::QLearning | Algorithm::Sarsa => TRAINING_STEP_BUDGET,
        };
        Self {
            max_evaluation_steps,
            ..Self::default()
        }
    }

    /// Read a (possibly partial) configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_defaults(path, Self::default())
    }

    /// Read a JSON file whose fields override `defaults`; missing fields keep
    /// the value from `defaults`.
    pub fn load_with_defaults<P: AsRef<Path>>(path: P, defaults: Self) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| Error::io(format!("read config {}", path.display()), source))?;

        let overrides: Value = serde_json::from_str(&text)?;
        let merged = match (serde_json::to_value(defaults)?, overrides) {
            (Value::Object(mut base), Value::Object(fields)) => {
                base.extend(fields);
                Value::Object(base)
            }
            (_, other) => other,
        };
        Ok(serde_json::from_value(merged)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_crash_policy(mut self, crash_policy: CrashPolicy) -> Self {
        self.crash_policy = crash_policy;
        self
    }

    pub fn with_episodes(mut self, episodes: usize) -> Self {
        self.episodes = episodes;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_evaluation_steps(mut self, steps: usize) -> Self {
        self.max_evaluation_steps = steps;
        self
    }

    pub fn with_discount_factor(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_start_selection(mut self, start_selection: StartSelection) -> Self {
        self.start_selection = start_selection;
        self
    }

    pub fn with_evaluation_start(mut self, evaluation_start: StartSelection) -> Self {
        self.evaluation_start = evaluation_start;
        self
    }

    /// Check ranges and budgets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        unit_interval("discount_factor", self.discount_factor)?;
        unit_interval("learning_rate", self.learning_rate)?;
        unit_interval("min_learning_rate", self.min_learning_rate)?;
        unit_interval("learning_rate_decay", self.learning_rate_decay)?;
        unit_interval("epsilon", self.epsilon)?;
        unit_interval("epsilon_decay", self.epsilon_decay)?;
        unit_interval("min_epsilon", self.min_epsilon)?;

        if !self.bellman_threshold.is_finite() || self.bellman_threshold <= 0.0 {
            return Err(Error::config(format!(
                "bellman_threshold must be positive, got {}",
                self.bellman_threshold
            )));
        }

        for (name, value) in [
            ("episodes", self.episodes),
            ("max_training_steps", self.max_training_steps),
            ("max_evaluation_steps", self.max_evaluation_steps),
            ("max_iterations", self.max_iterations),
        ] {
            if value == 0 {
                return Err(Error::config(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }
}

fn unit_interval(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::config(format!("{name} must lie in [0, 1], got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_iteration_evaluates_with_short_budget() {
        assert_eq!(
            LearnerConfig::for_algorithm(Algorithm::ValueIteration).max_evaluation_steps,
            50
        );
        assert_eq!(
            LearnerConfig::for_algorithm(Algorithm::QLearning).max_evaluation_steps,
            999
        );
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(LearnerConfig::default().validate().is_ok());
        assert!(
            LearnerConfig::default()
                .with_discount_factor(1.5)
                .validate()
                .is_err()
        );
        assert!(
            LearnerConfig::default()
                .with_epsilon(f64::NAN)
                .validate()
                .is_err()
        );
        let err = LearnerConfig::default().with_episodes(0).validate().unwrap_err();
        assert!(err.to_string().contains("episodes"));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: LearnerConfig =
            serde_json::from_str(r#"{"episodes": 10, "crash_policy": "major"}"#).unwrap();
        assert_eq!(config.episodes, 10);
        assert_eq!(config.crash_policy, CrashPolicy::Major);
        assert_eq!(config.learning_rate, 0.75);
    }

    #[test]
    fn file_fields_override_algorithm_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"episodes": 10, "seed": 4}"#).unwrap();

        let defaults = LearnerConfig::for_algorithm(Algorithm::ValueIteration);
        let config = LearnerConfig::load_with_defaults(&path, defaults).unwrap();
        assert_eq!(config.episodes, 10);
        assert_eq!(config.seed, Some(4));
        assert_eq!(config.max_evaluation_steps, 50);

        assert_eq!(LearnerConfig::load(&path).unwrap().max_evaluation_steps, 999);

        std::fs::write(&path, "42").unwrap();
        assert!(LearnerConfig::load(&path).is_err());
    }
}
