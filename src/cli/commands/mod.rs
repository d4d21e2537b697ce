//! Subcommands of the `racetrack` binary

pub mod inspect;
pub mod race;
pub mod train;
