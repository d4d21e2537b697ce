//! Episode driver shared by training and evaluation
//!
//! An episode places a fresh vehicle at rest on a start cell and lets a
//! [`DrivingPolicy`] pick accelerations until the finish line is crossed or
//! the step budget runs out.

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    racetrack::{CrashPolicy, Grid, StepOutcome, Vehicle, VehicleState},
    types::{Acceleration, Position},
};

/// Step budget for training episodes and TD evaluation.
pub const TRAINING_STEP_BUDGET: usize = 999;
/// Step budget when following a value-iteration policy.
pub const VALUE_ITERATION_STEP_BUDGET: usize = 50;

/// One observed step of an episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// State before the acceleration was applied.
    pub state: VehicleState,
    pub acceleration: Acceleration,
    pub outcome: StepOutcome,
    pub next_state: VehicleState,
}

impl Transition {
    /// -1 for every continuing step, 0 for the step that finishes.
    pub fn reward(&self) -> f64 {
        if self.is_terminal() { 0.0 } else { -1.0 }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_finished()
    }
}

/// Chooses accelerations while an episode runs
pub trait DrivingPolicy {
    /// Pick the acceleration for `state`.
    fn choose(&mut self, state: VehicleState) -> Result<Acceleration>;

    /// Called after every step with the resulting transition.
    fn observe(&mut self, _transition: &Transition) -> Result<()> {
        Ok(())
    }
}

/// Result of a single episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeOutcome {
    /// Steps taken, including the one that crossed the finish line.
    pub steps: usize,
    pub finished: bool,
    /// Start cell followed by the position after each non-finishing step.
    pub trajectory: Vec<Position>,
}

/// Where episodes begin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartSelection {
    /// Any track or start cell.
    #[default]
    ValidCells,
    /// Only cells marked as start.
    StartCells,
}

impl StartSelection {
    pub fn cells(self, grid: &Grid) -> &[Position] {
        match self {
            StartSelection::ValidCells => grid.valid_cells(),
            StartSelection::StartCells => grid.start_cells(),
        }
    }

    /// Draw a start position uniformly from the selected cells.
    pub fn pick<R: Rng>(self, grid: &Grid, rng: &mut R) -> Result<Position> {
        self.cells(grid)
            .choose(rng)
            .copied()
            .ok_or(Error::NoStartCells)
    }
}

/// Runs bounded episodes on one grid
#[derive(Debug, Clone, Copy)]
pub struct EpisodeDriver<'g> {
    grid: &'g Grid,
    crash_policy: CrashPolicy,
    max_steps: usize,
}

impl<'g> EpisodeDriver<'g> {
    pub fn new(grid: &'g Grid, crash_policy: CrashPolicy, max_steps: usize) -> Self {
        Self {
            grid,
            crash_policy,
            max_steps,
        }
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Drive from `start` until the finish line or the step budget.
    pub fn run<P>(&self, start: Position, policy: &mut P) -> Result<EpisodeOutcome>
    where
        P: DrivingPolicy + ?Sized,
    {
        let mut vehicle = Vehicle::new(self.grid, start, self.crash_policy);
        let mut trajectory = vec![start];
        let mut steps = 0;
        let mut finished = false;

        while steps < self.max_steps {
            let state = vehicle.state();
            let acceleration = policy.choose(state)?;
            vehicle.accelerate(acceleration);
            let outcome = vehicle.step();
            steps += 1;

            policy.observe(&Transition {
                state,
                acceleration,
                outcome,
                next_state: vehicle.state(),
            })?;

            if outcome.is_finished() {
                finished = true;
                break;
            }
            trajectory.push(vehicle.position());
        }

        Ok(EpisodeOutcome {
            steps,
            finished,
            trajectory,
        })
    }
}
