//! Dense state-indexed tables shared by every learner

use rand::Rng;
use rayon::{prelude::*, slice::ChunksMut};
use serde::{Deserialize, Serialize};

use crate::state_space::{ACCELERATION_RANGE, ACTIONS, ActionIndex, StateIndex, VELOCITY_RANGE};

/// Number of table entries per grid cell (one per velocity pair).
pub const CELL_STRIDE: usize = VELOCITY_RANGE * VELOCITY_RANGE;

/// Table of shape `(rows, cols, 11, 11)` stored contiguously in row-major order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTable<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Clone> StateTable<T> {
    /// Table with every entry set to `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols * CELL_STRIDE],
        }
    }
}

impl<T> StateTable<T> {
    /// Table with every entry produced by `init`, called in row-major order.
    pub fn from_fn(rows: usize, cols: usize, mut init: impl FnMut(StateIndex) -> T) -> Self {
        let data = indices(rows, cols).map(&mut init).collect();
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols, 11, 11)`
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (self.rows, self.cols, VELOCITY_RANGE, VELOCITY_RANGE)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the stored entries cover every index of the shape.
    pub fn is_complete(&self) -> bool {
        self.data.len() == self.rows * self.cols * CELL_STRIDE
    }

    fn offset(&self, index: StateIndex) -> usize {
        debug_assert!(index.row < self.rows && index.col < self.cols);
        ((index.row * self.cols + index.col) * VELOCITY_RANGE + index.vel_row) * VELOCITY_RANGE
            + index.vel_col
    }

    pub fn get(&self, index: StateIndex) -> &T {
        &self.data[self.offset(index)]
    }

    pub fn get_mut(&mut self, index: StateIndex) -> &mut T {
        let offset = self.offset(index);
        &mut self.data[offset]
    }

    pub fn set(&mut self, index: StateIndex, value: T) {
        let offset = self.offset(index);
        self.data[offset] = value;
    }

    /// Every index of the table in storage order.
    pub fn iter_indices(&self) -> impl Iterator<Item = StateIndex> + use<T> {
        indices(self.rows, self.cols)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateIndex, &T)> {
        self.iter_indices().zip(self.data.iter())
    }

    /// Entries per grid row.
    pub(crate) fn row_stride(&self) -> usize {
        self.cols * CELL_STRIDE
    }

    /// One mutable slice per grid row, for parallel iteration.
    pub(crate) fn par_rows_mut(&mut self) -> ChunksMut<'_, T>
    where
        T: Send,
    {
        let stride = self.row_stride().max(1);
        self.data.par_chunks_mut(stride)
    }

    /// Apply `f` to every entry, keeping the shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> StateTable<U> {
        StateTable {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }
}

/// Index of the `offset`-th entry of a table with `cols` columns.
pub(crate) fn index_at(cols: usize, offset: usize) -> StateIndex {
    let cell = offset / CELL_STRIDE;
    let velocity = offset % CELL_STRIDE;
    StateIndex {
        row: cell / cols,
        col: cell % cols,
        vel_row: velocity / VELOCITY_RANGE,
        vel_col: velocity % VELOCITY_RANGE,
    }
}

fn indices(rows: usize, cols: usize) -> impl Iterator<Item = StateIndex> {
    (0..rows * cols * CELL_STRIDE).map(move |offset| index_at(cols, offset))
}

/// Values of the nine accelerations available in one state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionValues([[f64; ACCELERATION_RANGE]; ACCELERATION_RANGE]);

impl ActionValues {
    pub fn zeros() -> Self {
        Self::default()
    }

    /// Uniform random values in `(-1, 0]`.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut values = Self::zeros();
        for action in ACTIONS {
            values.set(action, -rng.random::<f64>());
        }
        values
    }

    pub fn get(&self, action: ActionIndex) -> f64 {
        self.0[action.row][action.col]
    }

    pub fn set(&mut self, action: ActionIndex, value: f64) {
        self.0[action.row][action.col] = value;
    }

    pub fn max(&self) -> f64 {
        self.get(self.argmax())
    }

    /// The best action, resolving ties to the first in row-major order.
    pub fn argmax(&self) -> ActionIndex {
        let mut best = ACTIONS[0];
        for action in ACTIONS.into_iter().skip(1) {
            if self.get(action) > self.get(best) {
                best = action;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn shape_and_length_match() {
        let table = StateTable::filled(3, 4, 0.0_f64);
        assert_eq!(table.shape(), (3, 4, 11, 11));
        assert_eq!(table.len(), 3 * 4 * 121);
        assert_eq!(table.iter_indices().count(), table.len());
    }

    #[test]
    fn indices_are_row_major_and_distinct() {
        let table = StateTable::from_fn(2, 3, |index| index);
        for (index, stored) in table.iter() {
            assert_eq!(index, *stored);
            assert_eq!(table.get(index), stored);
        }
        let first = table.iter_indices().next().unwrap();
        assert_eq!((first.row, first.col, first.vel_row, first.vel_col), (0, 0, 0, 0));
        let last = table.iter_indices().last().unwrap();
        assert_eq!((last.row, last.col, last.vel_row, last.vel_col), (1, 2, 10, 10));
    }

    #[test]
    fn set_and_get_agree() {
        let mut table = StateTable::filled(2, 2, 0_i32);
        let index = StateIndex {
            row: 1,
            col: 0,
            vel_row: 3,
            vel_col: 7,
        };
        table.set(index, 42);
        *table.get_mut(index) += 1;
        assert_eq!(*table.get(index), 43);
        assert_eq!(table.iter().filter(|(_, v)| **v != 0).count(), 1);
    }

    #[test]
    fn argmax_prefers_first_maximum() {
        let mut values = ActionValues::zeros();
        values.set(ActionIndex::new(1, 2), 3.0);
        values.set(ActionIndex::new(2, 0), 3.0);
        assert_eq!(values.argmax(), ActionIndex::new(1, 2));
        assert_eq!(values.max(), 3.0);
        assert_eq!(ActionValues::zeros().argmax(), ACTIONS[0]);
    }

    #[test]
    fn random_values_are_non_positive_and_above_minus_one() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let values = ActionValues::random(&mut rng);
            for action in ACTIONS {
                let v = values.get(action);
                assert!(v <= 0.0 && v > -1.0);
            }
        }
    }
}
