//! Ports (trait boundaries) between the learning core and its drivers.
//!
//! Learners and observers are owned by the domain; the pipeline and the CLI
//! only talk to them through these traits.

pub mod learner;
pub mod observer;

pub use learner::{EvaluationResult, Learner, TrainingReport};
pub use observer::{EpisodeStats, Observer};
