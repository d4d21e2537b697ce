//! Discretization of the state-action space
//!
//! Every learner indexes its tables through this module. Velocities in
//! `[-5, 5]` are offset by 5 to land in `[0, 10]`; accelerations in
//! `[-1, 1]` are offset by 1 to land in `[0, 2]`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{racetrack::VehicleState, types::Acceleration};

/// Maximum magnitude of each velocity component.
pub const VELOCITY_LIMIT: i32 = 5;
/// Shift applied to a velocity component to obtain its table index.
pub const VELOCITY_OFFSET: i32 = VELOCITY_LIMIT;
/// Number of distinct values per velocity component.
pub const VELOCITY_RANGE: usize = (2 * VELOCITY_LIMIT + 1) as usize;
/// Shift applied to an acceleration component to obtain its table index.
pub const ACCELERATION_OFFSET: i32 = 1;
/// Number of distinct values per acceleration component.
pub const ACCELERATION_RANGE: usize = (2 * ACCELERATION_OFFSET + 1) as usize;
/// Number of distinct accelerations.
pub const ACTION_COUNT: usize = ACCELERATION_RANGE * ACCELERATION_RANGE;

/// Table coordinates of a (position, velocity) state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateIndex {
    pub row: usize,
    pub col: usize,
    pub vel_row: usize,
    pub vel_col: usize,
}

impl StateIndex {
    /// Index of an in-bounds vehicle state.
    pub fn from_state(state: VehicleState) -> Self {
        debug_assert!(state.position.row >= 0 && state.position.col >= 0);
        debug_assert!(state.velocity.row.abs() <= VELOCITY_LIMIT);
        debug_assert!(state.velocity.col.abs() <= VELOCITY_LIMIT);
        Self {
            row: state.position.row as usize,
            col: state.position.col as usize,
            vel_row: (state.velocity.row + VELOCITY_OFFSET) as usize,
            vel_col: (state.velocity.col + VELOCITY_OFFSET) as usize,
        }
    }

    /// The vehicle state this index denotes.
    pub fn to_state(self) -> VehicleState {
        VehicleState::new(
            (self.row as i32, self.col as i32).into(),
            crate::types::Velocity::new(
                self.vel_row as i32 - VELOCITY_OFFSET,
                self.vel_col as i32 - VELOCITY_OFFSET,
            ),
        )
    }
}

/// Table coordinates of an acceleration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionIndex {
    pub row: usize,
    pub col: usize,
}

/// All actions in row-major order: `(-1,-1), (-1,0), (-1,1), (0,-1), ...`
pub const ACTIONS: [ActionIndex; ACTION_COUNT] = {
    let mut actions = [ActionIndex { row: 0, col: 0 }; ACTION_COUNT];
    let mut i = 0;
    while i < ACTION_COUNT {
        actions[i] = ActionIndex {
            row: i / ACCELERATION_RANGE,
            col: i % ACCELERATION_RANGE,
        };
        i += 1;
    }
    actions
};

impl ActionIndex {
    pub fn new(row: usize, col: usize) -> Self {
        debug_assert!(row < ACCELERATION_RANGE && col < ACCELERATION_RANGE);
        Self { row, col }
    }

    /// Index of an acceleration, or `None` if a component is outside `[-1, 1]`.
    pub fn from_acceleration(acceleration: Acceleration) -> Option<Self> {
        let row = acceleration.row + ACCELERATION_OFFSET;
        let col = acceleration.col + ACCELERATION_OFFSET;
        let range = 0..ACCELERATION_RANGE as i32;
        (range.contains(&row) && range.contains(&col)).then(|| Self {
            row: row as usize,
            col: col as usize,
        })
    }

    pub fn acceleration(self) -> Acceleration {
        Acceleration::new(
            self.row as i32 - ACCELERATION_OFFSET,
            self.col as i32 - ACCELERATION_OFFSET,
        )
    }
}

impl fmt::Display for ActionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.acceleration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Position, Velocity};

    #[test]
    fn velocity_offsets_cover_full_range() {
        let low = StateIndex::from_state(VehicleState::new(
            Position::new(2, 3),
            Velocity::new(-5, 5),
        ));
        assert_eq!((low.row, low.col, low.vel_row, low.vel_col), (2, 3, 0, 10));
        assert_eq!(low.to_state().velocity, Velocity::new(-5, 5));
        assert_eq!(VELOCITY_RANGE, 11);
    }

    #[test]
    fn actions_are_row_major() {
        assert_eq!(ACTIONS[0].acceleration(), Acceleration::new(-1, -1));
        assert_eq!(ACTIONS[1].acceleration(), Acceleration::new(-1, 0));
        assert_eq!(ACTIONS[4].acceleration(), Acceleration::NONE);
        assert_eq!(ACTIONS[8].acceleration(), Acceleration::new(1, 1));
    }

    #[test]
    fn acceleration_index_rejects_out_of_range() {
        for action in ACTIONS {
            assert_eq!(
                ActionIndex::from_acceleration(action.acceleration()),
                Some(action)
            );
        }
        assert_eq!(ActionIndex::from_acceleration(Acceleration::new(2, 0)), None);
    }
}
