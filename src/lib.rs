//! Racetrack reinforcement learning
//!
//! This crate provides:
//! - A grid racetrack with discrete vehicle kinematics, wall crashes and a
//!   finish-line crossing test
//! - A dense state-action space shared by all learners
//! - Value iteration, Q-learning and SARSA behind a common `Learner` port
//! - A training pipeline with progress, metrics and JSONL observers
//! - JSON persistence for learned policies and training summaries

pub mod cli;
pub mod config;
pub mod episode;
pub mod error;
pub mod learning;
pub mod persistence;
pub mod pipeline;
pub mod ports;
pub mod racetrack;
pub mod state_space;
pub mod tables;
pub mod types;

pub use config::LearnerConfig;
pub use episode::{DrivingPolicy, EpisodeDriver, EpisodeOutcome, StartSelection, Transition};
pub use error::{Error, Result};
pub use learning::{Algorithm, QLearningAgent, SarsaAgent, ValueIterationAgent, build_learner};
pub use persistence::{PolicyLearner, SavedPolicy};
pub use ports::{EpisodeStats, EvaluationResult, Learner, Observer, TrainingReport};
pub use racetrack::{
    CellKind, CrashPolicy, FinishLine, Grid, StepOutcome, Vehicle, VehicleState, load_track,
    parse_track,
};
pub use types::{Acceleration, Position, Velocity};
