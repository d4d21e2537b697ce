//! Dense Q-table for temporal difference learning

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    state_space::{ActionIndex, StateIndex},
    tables::{ActionValues, StateTable},
};

/// Q-table mapping (state, action) pairs to Q-values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    values: StateTable<ActionValues>,
    /// Discount factor γ
    discount_factor: f64,
}

impl QTable {
    /// All-zero table for a `rows` x `cols` grid.
    pub fn new(rows: usize, cols: usize, discount_factor: f64) -> Self {
        Self {
            values: StateTable::filled(rows, cols, ActionValues::zeros()),
            discount_factor,
        }
    }

    /// Table seeded with uniform random values in `(-1, 0]`.
    pub fn random<R: Rng>(rows: usize, cols: usize, discount_factor: f64, rng: &mut R) -> Self {
        Self {
            values: StateTable::from_fn(rows, cols, |_| ActionValues::random(&mut *rng)),
            discount_factor,
        }
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    pub fn get(&self, state: StateIndex, action: ActionIndex) -> f64 {
        self.values.get(state).get(action)
    }

    pub fn set(&mut self, state: StateIndex, action: ActionIndex, value: f64) {
        self.values.get_mut(state).set(action, value);
    }

    /// All nine action values of `state`.
    pub fn action_values(&self, state: StateIndex) -> &ActionValues {
        self.values.get(state)
    }

    pub fn max_q(&self, state: StateIndex) -> f64 {
        self.values.get(state).max()
    }

    /// Highest-valued action, first in row-major order on ties.
    pub fn greedy_action(&self, state: StateIndex) -> ActionIndex {
        self.values.get(state).argmax()
    }

    pub fn values(&self) -> &StateTable<ActionValues> {
        &self.values
    }

    /// Q-learning update: off-policy TD control
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    pub fn q_learning_update(
        &mut self,
        state: StateIndex,
        action: ActionIndex,
        reward: f64,
        next_state: StateIndex,
        learning_rate: f64,
        done: bool,
    ) {
        let max_next_q = if done { 0.0 } else { self.max_q(next_state) };
        self.apply(state, action, reward + self.discount_factor * max_next_q, learning_rate);
    }

    /// SARSA update: on-policy TD control
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ Q(s',a') - Q(s,a)]
    #[allow(clippy::too_many_arguments)]
    pub fn sarsa_update(
        &mut self,
        state: StateIndex,
        action: ActionIndex,
        reward: f64,
        next_state: StateIndex,
        next_action: ActionIndex,
        learning_rate: f64,
        done: bool,
    ) {
        let next_q = if done {
            0.0
        } else {
            self.get(next_state, next_action)
        };
        self.apply(state, action, reward + self.discount_factor * next_q, learning_rate);
    }

    fn apply(
        &mut self,
        state: StateIndex,
        action: ActionIndex,
        td_target: f64,
        learning_rate: f64,
    ) {
        let current_q = self.get(state, action);
        let td_error = td_target - current_q;
        self.set(state, action, current_q + learning_rate * td_error);
    }
}
