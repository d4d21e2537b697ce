//! Value iteration (synchronous dynamic programming)
//!
//! Every sweep recomputes the value of every table state, walls and
//! unreachable velocities included, from a frozen snapshot of the previous
//! sweep. Grid rows are swept in parallel on the rayon pool; each row task
//! owns a scratch vehicle and writes only its own row.

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};
use rayon::prelude::*;

use super::{Algorithm, policy::TablePolicy, td::build_rng};
use crate::{
    Result,
    config::LearnerConfig,
    episode::EpisodeDriver,
    ports::{EvaluationResult, Learner, Observer, TrainingReport},
    racetrack::{CrashPolicy, Grid, StepOutcome, Vehicle, VehicleState},
    state_space::{ACTIONS, StateIndex},
    tables::{ActionValues, StateTable, index_at},
    types::{Acceleration, Position},
};

/// Value-iteration learner
#[derive(Debug, Clone)]
pub struct ValueIterationAgent {
    grid: Arc<Grid>,
    config: LearnerConfig,
    values: StateTable<f64>,
    q_values: StateTable<ActionValues>,
    policy: StateTable<Acceleration>,
    rng: StdRng,
}

impl ValueIterationAgent {
    /// Create a learner with all-zero tables.
    pub fn new(grid: Arc<Grid>, config: LearnerConfig) -> Self {
        let (rows, cols) = (grid.rows(), grid.cols());
        Self {
            values: StateTable::filled(rows, cols, 0.0),
            q_values: StateTable::filled(rows, cols, ActionValues::zeros()),
            policy: StateTable::filled(rows, cols, Acceleration::NONE),
            rng: build_rng(config.seed),
            grid,
            config,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn values(&self) -> &StateTable<f64> {
        &self.values
    }

    pub fn q_values(&self) -> &StateTable<ActionValues> {
        &self.q_values
    }

    pub fn policy(&self) -> &StateTable<Acceleration> {
        &self.policy
    }

    /// Run one synchronous sweep and return the largest value change.
    pub fn sweep(&mut self) -> f64 {
        let previous = self.values.clone();
        let grid: &Grid = &self.grid;
        let crash_policy = self.config.crash_policy;
        let discount = self.config.discount_factor;
        let stride = previous.row_stride();

        self.values
            .par_rows_mut()
            .zip(self.q_values.par_rows_mut())
            .zip(self.policy.par_rows_mut())
            .enumerate()
            .map(|(row, ((values, q_values), policy))| {
                let mut vehicle = Vehicle::new(grid, Position::new(0, 0), crash_policy);
                let mut max_delta = 0.0_f64;

                let entries = values
                    .iter_mut()
                    .zip(q_values.iter_mut())
                    .zip(policy.iter_mut())
                    .enumerate();
                for (local, ((value, action_values), action)) in entries {
                    let index = index_at(grid.cols(), row * stride + local);
                    let state = index.to_state();
                    let mut best = f64::NEG_INFINITY;

                    for candidate in ACTIONS {
                        vehicle.place(state);
                        vehicle.accelerate(candidate.acceleration());
                        let q = match vehicle.step() {
                            StepOutcome::Finished => 0.0,
                            StepOutcome::Crashed | StepOutcome::Moved => {
                                -1.0 + discount
                                    * previous.get(StateIndex::from_state(vehicle.state()))
                            }
                        };
                        action_values.set(candidate, q);
                        if q > best {
                            best = q;
                            *action = candidate.acceleration();
                        }
                    }

                    max_delta = max_delta.max((previous.get(index) - best).abs());
                    *value = best;
                }
                max_delta
            })
            .reduce(|| 0.0, f64::max)
    }
}

impl Learner for ValueIterationAgent {
    fn name(&self) -> &str {
        "Value iteration"
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::ValueIteration
    }

    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn crash_policy(&self) -> CrashPolicy {
        self.config.crash_policy
    }

    fn train(&mut self, observer: &mut dyn Observer) -> Result<TrainingReport> {
        let max_iterations = self.config.max_iterations;
        let mut max_deltas = vec![0.0];
        let mut iterations = 0;
        let mut converged = false;

        observer.on_training_start(max_iterations)?;
        while iterations < max_iterations {
            iterations += 1;
            let max_delta = self.sweep();
            max_deltas.push(max_delta);
            observer.on_sweep_end(iterations, max_delta)?;
            tracing::debug!(iteration = iterations, max_delta, "value iteration sweep");

            if max_delta < self.config.bellman_threshold {
                converged = true;
                break;
            }
        }
        observer.on_training_end()?;

        if converged {
            tracing::info!(iterations, "value iteration converged");
        } else {
            tracing::warn!(
                iterations,
                threshold = self.config.bellman_threshold,
                "value iteration hit the sweep cap before converging"
            );
        }

        Ok(TrainingReport::Sweeps {
            iterations,
            max_deltas,
            converged,
        })
    }

    fn evaluate(&mut self) -> Result<EvaluationResult> {
        let driver = EpisodeDriver::new(
            &self.grid,
            self.config.crash_policy,
            self.config.max_evaluation_steps,
        );
        let start = self.config.evaluation_start.pick(&self.grid, &mut self.rng)?;
        driver.run(start, &mut TablePolicy::new(&self.policy))
    }

    fn policy_action(&self, state: VehicleState) -> Acceleration {
        *self.policy.get(StateIndex::from_state(state))
    }

    fn set_rng_seed(&mut self, seed: u64) -> Result<()> {
        self.rng = StdRng::seed_from_u64(seed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pipeline::MetricsObserver, types::Velocity};

    fn corridor() -> Arc<Grid> {
        Arc::new("5,5\n#####\n##F##\n##.##\n##S##\n#####\n".parse().unwrap())
    }

    fn config() -> LearnerConfig {
        LearnerConfig::for_algorithm(Algorithm::ValueIteration)
    }

    #[test]
    fn first_sweep_values() {
        let mut agent = ValueIterationAgent::new(corridor(), config());
        let delta = agent.sweep();
        assert_eq!(delta, 1.0);

        // one step short of the line: finishing is worth 0
        let near = StateIndex::from_state(VehicleState::new(
            Position::new(2, 2),
            Velocity::new(-1, 0),
        ));
        assert_eq!(*agent.values().get(near), 0.0);
        let start = StateIndex::from_state(VehicleState::at_rest(Position::new(3, 2)));
        assert_eq!(*agent.values().get(start), -1.0);
    }

    #[test]
    fn thread_count_does_not_change_results() {
        let pool = |threads: usize| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap()
        };
        let (one, three) = (pool(1), pool(3));
        let mut single = ValueIterationAgent::new(corridor(), config());
        let mut many = ValueIterationAgent::new(corridor(), config());
        for _ in 0..5 {
            assert_eq!(one.install(|| single.sweep()), three.install(|| many.sweep()));
        }
        assert_eq!(single.values(), many.values());
        assert_eq!(single.policy(), many.policy());
    }

    #[test]
    fn training_converges_and_policy_finishes_in_two_steps() {
        let mut agent = ValueIterationAgent::new(corridor(), config()).with_seed(1);
        let report = agent.train(&mut MetricsObserver::new()).unwrap();
        assert!(report.converged());
        assert!(report.len() <= 50);

        let run = agent.evaluate().unwrap();
        assert!(run.finished);
        assert_eq!(run.steps, 2);
        assert_eq!(
            agent.policy_action(VehicleState::at_rest(Position::new(3, 2))),
            Acceleration::new(-1, 0)
        );
    }
}
