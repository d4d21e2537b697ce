//! Epsilon-greedy action selection and its decay schedule

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    config::LearnerConfig,
    state_space::{ACCELERATION_RANGE, ActionIndex},
    tables::ActionValues,
};

/// Random action with probability `epsilon`, otherwise the greedy one.
pub fn epsilon_greedy<R: Rng>(values: &ActionValues, epsilon: f64, rng: &mut R) -> ActionIndex {
    if rng.random::<f64>() < epsilon {
        ActionIndex::new(
            rng.random_range(0..ACCELERATION_RANGE),
            rng.random_range(0..ACCELERATION_RANGE),
        )
    } else {
        values.argmax()
    }
}

/// Exploration and learning rates, decayed once per episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSchedule {
    epsilon: f64,
    epsilon_decay: f64,
    min_epsilon: f64,
    learning_rate: f64,
    learning_rate_decay: f64,
    min_learning_rate: f64,
}

impl ExplorationSchedule {
    pub fn new(config: &LearnerConfig) -> Self {
        Self {
            epsilon: config.epsilon,
            epsilon_decay: config.epsilon_decay,
            min_epsilon: config.min_epsilon,
            learning_rate: config.learning_rate,
            learning_rate_decay: config.learning_rate_decay,
            min_learning_rate: config.min_learning_rate,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Advance the schedule by one episode.
    pub fn decay(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.min_epsilon);
        if self.learning_rate > self.min_learning_rate {
            self.learning_rate *= self.learning_rate_decay;
        }
    }
}
