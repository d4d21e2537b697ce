//! Vehicle kinematics, collisions and crash recovery

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::grid::Grid;
use crate::{
    Error,
    state_space::VELOCITY_LIMIT,
    types::{Acceleration, Position, Velocity},
};

/// How a vehicle recovers after driving into a wall
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrashPolicy {
    /// Stop and return to the position held before the failed move.
    #[default]
    Minor,
    /// Stop and restart from the start cell nearest to the crash.
    Major,
}

impl fmt::Display for CrashPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CrashPolicy::Minor => "minor",
            CrashPolicy::Major => "major",
        };
        f.write_str(label)
    }
}

impl FromStr for CrashPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minor" | "0" => Ok(CrashPolicy::Minor),
            "major" | "1" => Ok(CrashPolicy::Major),
            _ => Err(Error::ParseCrashPolicy {
                input: s.to_string(),
                expected: "minor/0, major/1".to_string(),
            }),
        }
    }
}

/// Result of a single [`Vehicle::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Crossed the finish line; the position was left unchanged.
    Finished,
    /// Hit a wall and the crash policy was applied.
    Crashed,
    /// Moved to the next cell.
    Moved,
}

impl StepOutcome {
    pub fn is_finished(self) -> bool {
        self == StepOutcome::Finished
    }
}

/// Snapshot of the kinematic state of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleState {
    pub position: Position,
    pub velocity: Velocity,
}

impl VehicleState {
    pub fn new(position: Position, velocity: Velocity) -> Self {
        Self { position, velocity }
    }

    /// Zero-velocity state at `position`.
    pub fn at_rest(position: Position) -> Self {
        Self::new(position, Velocity::ZERO)
    }
}

/// A single car driving on a grid
#[derive(Debug, Clone)]
pub struct Vehicle<'g> {
    grid: &'g Grid,
    position: Position,
    previous_position: Position,
    velocity: Velocity,
    crash_policy: CrashPolicy,
}

impl<'g> Vehicle<'g> {
    /// Place a vehicle at rest on `position`.
    pub fn new(grid: &'g Grid, position: Position, crash_policy: CrashPolicy) -> Self {
        Self {
            grid,
            position,
            previous_position: position,
            velocity: Velocity::ZERO,
            crash_policy,
        }
    }

    /// Move the vehicle to an arbitrary state, forgetting its history.
    pub fn place(&mut self, state: VehicleState) {
        self.position = state.position;
        self.previous_position = state.position;
        self.velocity = state.velocity;
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn previous_position(&self) -> Position {
        self.previous_position
    }

    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    pub fn crash_policy(&self) -> CrashPolicy {
        self.crash_policy
    }

    pub fn state(&self) -> VehicleState {
        VehicleState::new(self.position, self.velocity)
    }

    /// Change velocity by `delta`.
    ///
    /// Returns `false` and leaves the vehicle untouched when a component of
    /// `delta` exceeds 1 in magnitude. Otherwise each velocity component is
    /// updated unless that would push it past the speed limit.
    pub fn accelerate(&mut self, delta: Acceleration) -> bool {
        if delta.row.abs() > 1 || delta.col.abs() > 1 {
            tracing::trace!(%delta, "rejected acceleration");
            return false;
        }

        let row = self.velocity.row + delta.row;
        if row.abs() <= VELOCITY_LIMIT {
            self.velocity.row = row;
        }
        let col = self.velocity.col + delta.col;
        if col.abs() <= VELOCITY_LIMIT {
            self.velocity.col = col;
        }
        true
    }

    /// Advance one time step along the current velocity.
    pub fn step(&mut self) -> StepOutcome {
        self.previous_position = self.position;
        let next = self.position + self.velocity;

        if self.grid.crossed_finish(self.position, next) {
            StepOutcome::Finished
        } else if self.grid.is_wall(next) {
            self.crash(next);
            StepOutcome::Crashed
        } else {
            self.position = next;
            StepOutcome::Moved
        }
    }

    fn crash(&mut self, attempted: Position) {
        self.velocity = Velocity::ZERO;
        self.position = match self.crash_policy {
            CrashPolicy::Minor => self.previous_position,
            CrashPolicy::Major => self.grid.closest_start(attempted),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Grid {
        "5,5\n#####\n##F##\n##.##\n##S##\n#####\n".parse().unwrap()
    }

    #[test]
    fn rejects_oversized_acceleration() {
        let grid = corridor();
        let mut car = Vehicle::new(&grid, Position::new(3, 2), CrashPolicy::Minor);
        assert!(!car.accelerate(Acceleration::new(2, 0)));
        assert!(!car.accelerate(Acceleration::new(0, -2)));
        assert_eq!(car.velocity(), Velocity::ZERO);
    }

    #[test]
    fn velocity_limit_is_applied_per_axis() {
        let grid = corridor();
        let mut car = Vehicle::new(&grid, Position::new(3, 2), CrashPolicy::Minor);
        car.place(VehicleState::new(Position::new(3, 2), Velocity::new(5, 2)));
        assert!(car.accelerate(Acceleration::new(1, 1)));
        assert_eq!(car.velocity(), Velocity::new(5, 3));
        car.place(VehicleState::new(Position::new(3, 2), Velocity::new(-5, -5)));
        car.accelerate(Acceleration::new(-1, 1));
        assert_eq!(car.velocity(), Velocity::new(-5, -4));
    }

    #[test]
    fn major_crash_breaks_ties_in_scan_order() {
        let grid: Grid = "5,7\n#######\n#.FFF.#\n#.....#\n#S###S#\n#######\n"
            .parse()
            .unwrap();
        let mut car = Vehicle::new(&grid, Position::new(2, 3), CrashPolicy::Major);
        car.place(VehicleState::new(Position::new(2, 3), Velocity::new(1, 0)));

        // (3,3) is a wall two cells from both starts
        assert_eq!(car.step(), StepOutcome::Crashed);
        assert_eq!(car.position(), Position::new(3, 1));
        assert_eq!(car.velocity(), Velocity::ZERO);

        car.place(VehicleState::new(Position::new(2, 4), Velocity::new(1, 0)));
        assert_eq!(car.step(), StepOutcome::Crashed);
        assert_eq!(car.position(), Position::new(3, 5));
    }

    #[test]
    fn moves_along_velocity() {
        let grid = corridor();
        let mut car = Vehicle::new(&grid, Position::new(3, 2), CrashPolicy::Minor);
        car.accelerate(Acceleration::new(-1, 0));
        assert_eq!(car.step(), StepOutcome::Moved);
        assert_eq!(car.position(), Position::new(2, 2));
        assert_eq!(car.previous_position(), Position::new(3, 2));
    }

    #[test]
    fn finishing_leaves_position_unchanged() {
        let grid = corridor();
        let mut car = Vehicle::new(&grid, Position::new(2, 2), CrashPolicy::Minor);
        car.accelerate(Acceleration::new(-1, 0));
        assert_eq!(car.step(), StepOutcome::Finished);
        assert_eq!(car.position(), Position::new(2, 2));
    }

    #[test]
    fn minor_crash_reverts_and_stops() {
        let grid = corridor();
        let mut car = Vehicle::new(&grid, Position::new(3, 2), CrashPolicy::Minor);
        car.accelerate(Acceleration::new(0, 1));
        assert_eq!(car.step(), StepOutcome::Crashed);
        assert_eq!(car.position(), Position::new(3, 2));
        assert_eq!(car.velocity(), Velocity::ZERO);
    }

    #[test]
    fn major_crash_restarts_from_nearest_start() {
        let grid: Grid = "4,6\n######\n#S..F#\n#..S.#\n######\n".parse().unwrap();
        let mut car = Vehicle::new(&grid, Position::new(2, 2), CrashPolicy::Major);
        car.accelerate(Acceleration::new(1, 0));
        assert_eq!(car.step(), StepOutcome::Crashed);
        // attempted (3,2): (2,3) is 2 away, (1,1) is 3 away
        assert_eq!(car.position(), Position::new(2, 3));
        assert_eq!(car.velocity(), Velocity::ZERO);
    }

    #[test]
    fn crash_policy_parses() {
        assert_eq!("Major".parse::<CrashPolicy>().unwrap(), CrashPolicy::Major);
        assert_eq!("0".parse::<CrashPolicy>().unwrap(), CrashPolicy::Minor);
        assert!("soft".parse::<CrashPolicy>().is_err());
    }
}
