//! Shared machinery of the temporal difference learners
//!
//! Q-learning and SARSA differ only in how a single transition updates the
//! Q-table. Everything else (episode loop, start selection, decay schedule,
//! greedy evaluation) lives in [`TdAgent`], parameterized by a [`TdRule`].

use std::{marker::PhantomData, sync::Arc};

use rand::{SeedableRng, rngs::StdRng};

use super::{
    Algorithm,
    exploration::ExplorationSchedule,
    policy::GreedyPolicy,
    q_table::QTable,
};
use crate::{
    Result,
    config::LearnerConfig,
    episode::{DrivingPolicy, EpisodeDriver},
    ports::{EpisodeStats, EvaluationResult, Learner, Observer, TrainingReport},
    racetrack::{CrashPolicy, Grid, VehicleState},
    state_space::StateIndex,
    types::Acceleration,
};

/// Episodes between progress log lines.
const LOG_EVERY: usize = 1000;

pub(crate) fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// The update rule of a temporal difference algorithm
pub trait TdRule: Send + 'static {
    const ALGORITHM: Algorithm;
    const NAME: &'static str;

    /// Exploring policy that updates `q_table` while one episode runs.
    type Policy<'a>: DrivingPolicy;

    fn episode_policy<'a>(
        q_table: &'a mut QTable,
        schedule: ExplorationSchedule,
        rng: &'a mut StdRng,
    ) -> Self::Policy<'a>;
}

/// Tabular TD agent driving on one grid
#[derive(Debug, Clone)]
pub struct TdAgent<R> {
    grid: Arc<Grid>,
    config: LearnerConfig,
    q_table: QTable,
    schedule: ExplorationSchedule,
    rng: StdRng,
    rng_seed: Option<u64>,
    rule: PhantomData<R>,
}

impl<R: TdRule> TdAgent<R> {
    /// Create an agent with a randomly seeded Q-table.
    ///
    /// Uses `config.seed` when present, entropy otherwise.
    pub fn new(grid: Arc<Grid>, config: LearnerConfig) -> Self {
        let mut rng = build_rng(config.seed);
        let q_table = QTable::random(grid.rows(), grid.cols(), config.discount_factor, &mut rng);
        Self {
            schedule: ExplorationSchedule::new(&config),
            rng_seed: config.seed,
            grid,
            config,
            q_table,
            rng,
            rule: PhantomData,
        }
    }

    /// Restart from a table seeded by `seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.reseed(seed);
        self
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
        self.q_table = QTable::random(
            self.grid.rows(),
            self.grid.cols(),
            self.config.discount_factor,
            &mut self.rng,
        );
        self.schedule = ExplorationSchedule::new(&self.config);
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn schedule(&self) -> &ExplorationSchedule {
        &self.schedule
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    pub fn rng_seed(&self) -> Option<u64> {
        self.rng_seed
    }
}

impl<R: TdRule> Learner for TdAgent<R> {
    fn name(&self) -> &str {
        R::NAME
    }

    fn algorithm(&self) -> Algorithm {
        R::ALGORITHM
    }

    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn crash_policy(&self) -> CrashPolicy {
        self.config.crash_policy
    }

    fn train(&mut self, observer: &mut dyn Observer) -> Result<TrainingReport> {
        let grid = Arc::clone(&self.grid);
        let driver = EpisodeDriver::new(
            &grid,
            self.config.crash_policy,
            self.config.max_training_steps,
        );
        let episodes = self.config.episodes;
        let mut steps = Vec::with_capacity(episodes);
        let mut converged = Vec::with_capacity(episodes);

        observer.on_training_start(episodes)?;
        for episode in 0..episodes {
            let start = self.config.start_selection.pick(&grid, &mut self.rng)?;
            let schedule = self.schedule;
            let mut policy = R::episode_policy(&mut self.q_table, schedule, &mut self.rng);
            let outcome = driver.run(start, &mut policy)?;

            observer.on_episode_end(
                episode,
                &EpisodeStats {
                    steps: outcome.steps,
                    finished: outcome.finished,
                    epsilon: schedule.epsilon(),
                    learning_rate: schedule.learning_rate(),
                },
            )?;
            steps.push(outcome.steps);
            converged.push(outcome.finished);
            self.schedule.decay();

            if (episode + 1) % LOG_EVERY == 0 {
                tracing::debug!(
                    learner = R::NAME,
                    episode = episode + 1,
                    steps = outcome.steps,
                    epsilon = self.schedule.epsilon(),
                    learning_rate = self.schedule.learning_rate(),
                    "training progress"
                );
            }
        }
        observer.on_training_end()?;

        let report = TrainingReport::Episodes { steps, converged };
        if report.converged() {
            tracing::info!(learner = R::NAME, episodes, "training finished");
        } else {
            tracing::warn!(
                learner = R::NAME,
                episodes,
                "last training episode did not reach the finish line"
            );
        }
        Ok(report)
    }

    fn evaluate(&mut self) -> Result<EvaluationResult> {
        let driver = EpisodeDriver::new(
            &self.grid,
            self.config.crash_policy,
            self.config.max_evaluation_steps,
        );
        let start = self.config.evaluation_start.pick(&self.grid, &mut self.rng)?;
        driver.run(start, &mut GreedyPolicy::new(&self.q_table))
    }

    fn policy_action(&self, state: VehicleState) -> Acceleration {
        self.q_table
            .greedy_action(StateIndex::from_state(state))
            .acceleration()
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.reseed(seed);
        Ok(())
    }
}
