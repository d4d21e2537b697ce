//! Observer port - abstraction for training observation and data collection
//!
//! This port defines the interface for observing training events,
//! allowing composable data collection without coupling training
//! logic to specific output formats or metrics.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Statistics of one finished training episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub steps: usize,
    /// Whether the finish line was reached within the step budget
    pub finished: bool,
    /// Exploration rate used during the episode
    pub epsilon: f64,
    /// Learning rate used during the episode
    pub learning_rate: f64,
}

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(total)` - once, with the number of episodes or the
///    sweep cap
/// 2. `on_episode_end` after every TD episode, or `on_sweep_end` after every
///    value-iteration sweep
/// 3. `on_training_end()` - once at the end
///
/// # Examples
///
/// ```no_run
/// use racetrack::ports::{EpisodeStats, Observer};
///
/// struct FinishCounter {
///     finished: usize,
/// }
///
/// impl Observer for FinishCounter {
///     fn on_episode_end(
///         &mut self,
///         _episode: usize,
///         stats: &EpisodeStats,
///     ) -> racetrack::Result<()> {
///         if stats.finished {
///             self.finished += 1;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called when training starts.
    fn on_training_start(&mut self, _total: usize) -> Result<()> {
        Ok(())
    }

    /// Called after each training episode (0-based index).
    fn on_episode_end(&mut self, _episode: usize, _stats: &EpisodeStats) -> Result<()> {
        Ok(())
    }

    /// Called after each value-iteration sweep (1-based index).
    fn on_sweep_end(&mut self, _iteration: usize, _max_delta: f64) -> Result<()> {
        Ok(())
    }

    /// Called when training completes.
    ///
    /// Use this to flush outputs or display summaries.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}
