//! Racetrack environment: grid geometry and vehicle physics

pub mod cell;
pub mod finish_line;
pub mod grid;
pub mod parse;
pub mod vehicle;

pub use cell::CellKind;
pub use finish_line::{FinishLine, Orientation};
pub use grid::Grid;
pub use parse::{load_track, parse_track};
pub use vehicle::{CrashPolicy, StepOutcome, Vehicle, VehicleState};
