//! Q-learning (off-policy TD control)
//!
//! Learns the optimal Q* function by always updating toward the maximum
//! next-state value, regardless of the action actually taken next.

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

/// Q-learning update rule
#[derive(Debug, Clone, Copy, Default)]
pub struct QLearning;

/// Q-learning agent
pub type QLearningAgent = TdAgent<QLearning>;

impl TdRule for QLearning {
    const ALGORITHM: Algorithm = Algorithm::QLearning;
    const NAME: &'static str = "Q-learning";

    type Policy<'a> = QLearningEpisode<'a>;

    fn episode_policy<'a>(
        q_table: &'a mut QTable,
        schedule: ExplorationSchedule,
        rng: &'a mut StdRng,
    ) -> QLearningEpisode<'a> {
        QLearningEpisode {
            q_table,
            schedule,
            rng,
            action: None,
        }
    }
}

/// ε-greedy driver that applies the Q-learning update after every step
pub struct QLearningEpisode<'a> {
    q_table: &'a mut QTable,
    schedule: ExplorationSchedule,
    rng: &'a mut StdRng,
    action: Option<ActionIndex>,
}

impl DrivingPolicy for QLearningEpisode<'_> {
    fn choose(&mut self, state: VehicleState) -> Result<Acceleration> {
        let values = self.q_table.action_values(StateIndex::from_state(state));
        let action = epsilon_greedy(values, self.schedule.epsilon(), &mut *self.rng);
        self.action = Some(action);
        Ok(action.acceleration())
    }

    fn observe(&mut self, transition: &Transition) -> Result<()> {
        if let Some(action) = self.action.take() {
            self.q_table.q_learning_update(
                StateIndex::from_state(transition.state),
                action,
                transition.reward(),
                StateIndex::from_state(transition.next_state),
                self.schedule.learning_rate(),
                transition.is_terminal(),
            );
        }
        Ok(())
    }
}
