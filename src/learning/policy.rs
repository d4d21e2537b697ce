//! Deterministic driving policies read from learned tables

use crate::{
    Result,
    episode::DrivingPolicy,
    learning::q_table::QTable,
    racetrack::VehicleState,
    state_space::StateIndex,
    tables::StateTable,
    types::Acceleration,
};

/// Follows the argmax of a Q-table
#[derive(Debug, Clone, Copy)]
pub struct GreedyPolicy<'a> {
    q_table: &'a QTable,
}

impl<'a> GreedyPolicy<'a> {
    pub fn new(q_table: &'a QTable) -> Self {
        Self { q_table }
    }
}

impl DrivingPolicy for GreedyPolicy<'_> {
    fn choose(&mut self, state: VehicleState) -> Result<Acceleration> {
        Ok(self
            .q_table
            .greedy_action(StateIndex::from_state(state))
            .acceleration())
    }
}

/// Follows an explicit state-to-acceleration table
#[derive(Debug, Clone, Copy)]
pub struct TablePolicy<'a> {
    actions: &'a StateTable<Acceleration>,
}

impl<'a> TablePolicy<'a> {
    pub fn new(actions: &'a StateTable<Acceleration>) -> Self {
        Self { actions }
    }
}

impl DrivingPolicy for TablePolicy<'_> {
    fn choose(&mut self, state: VehicleState) -> Result<Acceleration> {
        Ok(*self.actions.get(StateIndex::from_state(state)))
    }
}
