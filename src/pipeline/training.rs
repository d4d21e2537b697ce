//! Training pipeline for learners

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use super::observers::CompositeObserver;
use crate::{
    Error, Result,
    learning::Algorithm,
    ports::{EvaluationResult, Learner, Observer, TrainingReport},
    racetrack::CrashPolicy,
};

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Random seed
    pub seed: Option<u64>,

    /// Policy-following runs after training
    pub evaluation_runs: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: None,
            evaluation_runs: 1,
        }
    }
}

impl TrainingConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_evaluation_runs(mut self, runs: usize) -> Self {
        self.evaluation_runs = runs;
        self
    }
}

/// Result of a training run followed by evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub learner: String,
    pub algorithm: Algorithm,
    pub crash_policy: CrashPolicy,
    pub seed: Option<u64>,
    pub training: TrainingReport,
    pub evaluations: Vec<EvaluationResult>,
    /// Fraction of evaluation runs that reached the finish line
    pub evaluation_success_rate: f64,
    /// Mean steps over the evaluation runs
    pub evaluation_mean_steps: f64,
}

impl TrainingSummary {
    fn new(
        learner: &dyn Learner,
        seed: Option<u64>,
        training: TrainingReport,
        evaluations: Vec<EvaluationResult>,
    ) -> Self {
        let runs = evaluations.len().max(1) as f64;
        let finished = evaluations.iter().filter(|run| run.finished).count();
        let steps: usize = evaluations.iter().map(|run| run.steps).sum();
        Self {
            learner: learner.name().to_string(),
            algorithm: learner.algorithm(),
            crash_policy: learner.crash_policy(),
            seed,
            training,
            evaluation_success_rate: finished as f64 / runs,
            evaluation_mean_steps: steps as f64 / runs,
            evaluations,
        }
    }

    /// The first evaluation run, if any
    pub fn first_run(&self) -> Option<&EvaluationResult> {
        self.evaluations.first()
    }

    /// Save summary to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|source| Error::io(format!("create summary {}", path.display()), source))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load summary from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|source| Error::io(format!("open summary {}", path.display()), source))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Seeds, trains and evaluates a single learner
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: CompositeObserver,
}

impl TrainingPipeline {
    /// Create a new training pipeline
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: CompositeObserver::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train `learner`, then follow its policy `evaluation_runs` times.
    pub fn run(&mut self, learner: &mut dyn Learner) -> Result<TrainingSummary> {
        if let Some(seed) = self.config.seed {
            learner.set_rng_seed(seed)?;
        }

        tracing::info!(
            learner = learner.name(),
            algorithm = %learner.algorithm(),
            seed = ?self.config.seed,
            "starting training"
        );
        let training = learner.train(&mut self.observers)?;

        let evaluations = (0..self.config.evaluation_runs)
            .map(|_| learner.evaluate())
            .collect::<Result<Vec<_>>>()?;
        let summary = TrainingSummary::new(learner, self.config.seed, training, evaluations);

        tracing::info!(
            learner = %summary.learner,
            success_rate = summary.evaluation_success_rate,
            mean_steps = summary.evaluation_mean_steps,
            "evaluation finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::LearnerConfig, learning::ValueIterationAgent, racetrack::Grid};

    fn corridor() -> Arc<Grid> {
        Arc::new("5,5\n#####\n##F##\n##.##\n##S##\n#####\n".parse().unwrap())
    }

    #[test]
    fn pipeline_trains_then_evaluates() {
        let mut agent = ValueIterationAgent::new(
            corridor(),
            LearnerConfig::for_algorithm(Algorithm::ValueIteration),
        );
        let mut pipeline =
            TrainingPipeline::new(TrainingConfig::default().with_seed(3).with_evaluation_runs(4));

        let summary = pipeline.run(&mut agent).unwrap();

        assert_eq!(summary.algorithm, Algorithm::ValueIteration);
        assert!(summary.training.converged());
        assert_eq!(summary.evaluations.len(), 4);
        assert_eq!(summary.evaluation_success_rate, 1.0);
        assert_eq!(summary.evaluation_mean_steps, 2.0);
        assert_eq!(summary.first_run().map(|run| run.steps), Some(2));
    }

    #[test]
    fn summary_survives_save_and_load() {
        let mut agent = ValueIterationAgent::new(
            corridor(),
            LearnerConfig::for_algorithm(Algorithm::ValueIteration),
        );
        let summary = TrainingPipeline::new(TrainingConfig::default())
            .run(&mut agent)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        summary.save(&path).unwrap();
        assert_eq!(TrainingSummary::load(&path).unwrap(), summary);
    }

    #[test]
    fn sweep_deltas_reload_bit_for_bit() {
        let report = TrainingReport::Sweeps {
            iterations: 2,
            max_deltas: vec![0.0, 0.9025, 0.09944025698709068],
            converged: true,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(serde_json::from_str::<TrainingReport>(&json).unwrap(), report);
    }
}
