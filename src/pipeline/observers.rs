//! Observer pattern for training pipelines
//!
//! Observers allow composable data collection during training without coupling
//! training logic to specific output formats.

use std::{
    collections::VecDeque,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    ports::{EpisodeStats, Observer},
};

/// Progress bar observer - Shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    finished: usize,
    episodes: usize,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            finished: 0,
            episodes: 0,
        }
    }

    fn message(&self) -> String {
        format!("finished {}/{}", self.finished, self.episodes)
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total: usize) -> Result<()> {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, episode: usize, stats: &EpisodeStats) -> Result<()> {
        self.episodes += 1;
        if stats.finished {
            self.finished += 1;
        }
        if let Some(pb) = &self.progress_bar {
            pb.set_position(episode as u64 + 1);
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_sweep_end(&mut self, iteration: usize, max_delta: f64) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.set_position(iteration as u64);
            pb.set_message(format!("max delta {max_delta:.4}"));
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = self.progress_bar.take() {
            if self.episodes > 0 {
                pb.finish_with_message(self.message());
            } else {
                pb.finish();
            }
        }
        Ok(())
    }
}

/// Metrics observer - Tracks finish rate and episode length
///
/// Windowed statistics cover the most recent `window` episodes.
pub struct MetricsObserver {
    window: usize,
    recent: VecDeque<EpisodeStats>,
    episodes: usize,
    finished: usize,
    total_steps: usize,
    max_deltas: Vec<f64>,
}

impl MetricsObserver {
    pub const DEFAULT_WINDOW: usize = 100;

    /// Create a new metrics observer
    pub fn new() -> Self {
        Self::with_window(Self::DEFAULT_WINDOW)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.max(1),
            recent: VecDeque::new(),
            episodes: 0,
            finished: 0,
            total_steps: 0,
            max_deltas: Vec::new(),
        }
    }

    /// Fraction of all episodes that reached the finish line
    pub fn success_rate(&self) -> f64 {
        if self.episodes == 0 {
            0.0
        } else {
            self.finished as f64 / self.episodes as f64
        }
    }

    /// Fraction of the recent window that reached the finish line
    pub fn recent_success_rate(&self) -> f64 {
        if self.recent.is_empty() {
            0.0
        } else {
            self.recent.iter().filter(|stats| stats.finished).count() as f64
                / self.recent.len() as f64
        }
    }

    /// Mean steps over the recent window
    pub fn recent_mean_steps(&self) -> f64 {
        if self.recent.is_empty() {
            0.0
        } else {
            self.recent.iter().map(|stats| stats.steps).sum::<usize>() as f64
                / self.recent.len() as f64
        }
    }

    /// Sweep history recorded by value iteration
    pub fn max_deltas(&self) -> &[f64] {
        &self.max_deltas
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            episodes: self.episodes,
            finished: self.finished,
            success_rate: self.success_rate(),
            mean_steps: if self.episodes == 0 {
                0.0
            } else {
                self.total_steps as f64 / self.episodes as f64
            },
            window: self.window,
            recent_success_rate: self.recent_success_rate(),
            recent_mean_steps: self.recent_mean_steps(),
            sweeps: self.max_deltas.len(),
            last_max_delta: self.max_deltas.last().copied(),
        }
    }
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub episodes: usize,
    pub finished: usize,
    pub success_rate: f64,
    pub mean_steps: f64,
    pub window: usize,
    pub recent_success_rate: f64,
    pub recent_mean_steps: f64,
    pub sweeps: usize,
    pub last_max_delta: Option<f64>,
}

impl Observer for MetricsObserver {
    fn on_episode_end(&mut self, _episode: usize, stats: &EpisodeStats) -> Result<()> {
        self.episodes += 1;
        self.total_steps += stats.steps;
        if stats.finished {
            self.finished += 1;
        }
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(*stats);
        Ok(())
    }

    fn on_sweep_end(&mut self, _iteration: usize, max_delta: f64) -> Result<()> {
        self.max_deltas.push(max_delta);
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if self.episodes > 0 {
            tracing::info!(
                episodes = self.episodes,
                success_rate = self.success_rate(),
                recent_success_rate = self.recent_success_rate(),
                recent_mean_steps = self.recent_mean_steps(),
                "training metrics"
            );
        }
        Ok(())
    }
}

/// One line of the JSONL export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Record {
    Episode {
        episode: usize,
        steps: usize,
        finished: bool,
        epsilon: f64,
        learning_rate: f64,
    },
    Sweep {
        iteration: usize,
        max_delta: f64,
    },
}

/// JSONL observer - Exports one record per episode or sweep
pub struct JsonlObserver {
    writer: BufWriter<File>,
}

impl JsonlObserver {
    /// Create a new JSONL observer
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|source| Error::io(format!("create {}", path.display()), source))?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    fn write(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        writeln!(self.writer)?;
        Ok(())
    }
}

impl Observer for JsonlObserver {
    fn on_episode_end(&mut self, episode: usize, stats: &EpisodeStats) -> Result<()> {
        self.write(&Record::Episode {
            episode,
            steps: stats.steps,
            finished: stats.finished,
            epsilon: stats.epsilon,
            learning_rate: stats.learning_rate,
        })
    }

    fn on_sweep_end(&mut self, iteration: usize, max_delta: f64) -> Result<()> {
        self.write(&Record::Sweep {
            iteration,
            max_delta,
        })
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Forwards every event to a list of observers in order
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Box<dyn Observer>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Observer for CompositeObserver {
    fn on_training_start(&mut self, total: usize) -> Result<()> {
        for observer in &mut self.observers {
            observer.on_training_start(total)?;
        }
        Ok(())
    }

    fn on_episode_end(&mut self, episode: usize, stats: &EpisodeStats) -> Result<()> {
        for observer in &mut self.observers {
            observer.on_episode_end(episode, stats)?;
        }
        Ok(())
    }

    fn on_sweep_end(&mut self, iteration: usize, max_delta: f64) -> Result<()> {
        for observer in &mut self.observers {
            observer.on_sweep_end(iteration, max_delta)?;
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        for observer in &mut self.observers {
            observer.on_training_end()?;
        }
        Ok(())
    }
}
