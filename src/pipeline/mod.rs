//! Training and evaluation pipeline abstractions
//!
//! This module provides:
//! - A pipeline that seeds, trains and evaluates one learner
//! - Observer adapters for progress display, metrics and JSONL export

pub mod observers;
pub mod training;

pub use observers::{
    CompositeObserver, JsonlObserver, MetricsObserver, MetricsSummary, ProgressObserver, Record,
};
pub use training::{TrainingConfig, TrainingPipeline, TrainingSummary};

pub use crate::ports::{Learner, Observer};
