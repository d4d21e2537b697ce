//! SARSA (on-policy TD control)
//!
//! The action for the next state is drawn from the same ε-greedy policy
//! before the update; the update target uses that action's value, and the
//! action is then taken on the following step.

use rand::rngs::StdRng;

use super::{
    Algorithm,
    exploration::{ExplorationSchedule, epsilon_greedy},
    q_table::QTable,
    td::{TdAgent, TdRule},
};
use crate::{
    Result,
    episode::{DrivingPolicy, Transition},
    racetrack::VehicleState,
    state_space::{ActionIndex, StateIndex},
    types::Acceleration,
};

/// SARSA update rule
#[derive(Debug, Clone, Copy, Default)]
pub struct Sarsa;

/// SARSA agent
pub type SarsaAgent = TdAgent<Sarsa>;

impl TdRule for Sarsa {
    const ALGORITHM: Algorithm = Algorithm::Sarsa;
    const NAME: &'static str = "SARSA";

    type Policy<'a> = SarsaEpisode<'a>;

    fn episode_policy<'a>(
        q_table: &'a mut QTable,
        schedule: ExplorationSchedule,
        rng: &'a mut StdRng,
    ) -> SarsaEpisode<'a> {
        SarsaEpisode {
            q_table,
            schedule,
            rng,
            taken: None,
            next: None,
        }
    }
}

/// ε-greedy driver that carries the next action over between steps
pub struct SarsaEpisode<'a> {
    q_table: &'a mut QTable,
    schedule: ExplorationSchedule,
    rng: &'a mut StdRng,
    taken: Option<ActionIndex>,
    next: Option<ActionIndex>,
}

impl SarsaEpisode<'_> {
    fn explore(&mut self, state: StateIndex) -> ActionIndex {
        epsilon_greedy(
            self.q_table.action_values(state),
            self.schedule.epsilon(),
            &mut *self.rng,
        )
    }
}

impl DrivingPolicy for SarsaEpisode<'_> {
    fn choose(&mut self, state: VehicleState) -> Result<Acceleration> {
        let action = match self.next.take() {
            Some(action) => action,
            None => self.explore(StateIndex::from_state(state)),
        };
        self.taken = Some(action);
        Ok(action.acceleration())
    }

    fn observe(&mut self, transition: &Transition) -> Result<()> {
        let Some(action) = self.taken.take() else {
            return Ok(());
        };
        let state = StateIndex::from_state(transition.state);
        let next_state = StateIndex::from_state(transition.next_state);
        let done = transition.is_terminal();

        // a finished episode has no next action; any index works as the target is 0
        let next_action = if done {
            action
        } else {
            self.explore(next_state)
        };
        self.q_table.sarsa_update(
            state,
            action,
            transition.reward(),
            next_state,
            next_action,
            self.schedule.learning_rate(),
            done,
        );
        if !done {
            self.next = Some(next_action);
        }
        Ok(())
    }
}
