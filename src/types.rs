//! Value types for grid coordinates and vehicle kinematics.

use std::{fmt, ops::Add};

use serde::{Deserialize, Serialize};

/// A cell coordinate on the track grid.
///
/// Coordinates are signed so that a move may land outside the grid; the grid
/// treats every out-of-bounds coordinate as a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Manhattan (L1) distance between two positions.
    pub fn manhattan(self, other: Position) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl Add<Velocity> for Position {
    type Output = Position;

    fn add(self, velocity: Velocity) -> Position {
        Position::new(self.row + velocity.row, self.col + velocity.col)
    }
}

impl From<(i32, i32)> for Position {
    fn from((row, col): (i32, i32)) -> Self {
        Position::new(row, col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Per-step displacement of a vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Velocity {
    pub row: i32,
    pub col: i32,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity::new(0, 0);

    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Velocity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A change of velocity requested by a driver.
///
/// Only components in `{-1, 0, 1}` are accepted by the vehicle; anything
/// larger is rejected as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Acceleration {
    pub row: i32,
    pub col: i32,
}

impl Acceleration {
    pub const NONE: Acceleration = Acceleration::new(0, 0);

    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Acceleration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:+}, {:+})", self.row, self.col)
    }
}
