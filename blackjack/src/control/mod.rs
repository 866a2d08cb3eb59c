use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use thiserror::Error;

use crate::{
    env::{Blackjack, ForcedStart, StepError},
    value::ActionValues,
    LOG_INTERVAL,
};

pub mod glie;
pub mod importance;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("epsilon must be within [0, 1], got {0}")]
    Epsilon(f64),
    #[error("epsilon floor must be within (0, epsilon_start], got {0}")]
    EpsilonMin(f64),
    #[error("decay fraction must be within (0, 1], got {0}")]
    DecayFraction(f64),
    #[error("training needs at least one episode")]
    NoEpisodes,
    #[error("training needs at least one worker")]
    NoWorkers,
}

/// A Monte-Carlo control method: it plays episodes with its own behavior
/// policy and improves the action values it owns from them.
pub trait Control {
    fn values(&self) -> &ActionValues;
    fn into_values(self) -> ActionValues;

    /// Exploration rate of the behavior policy for the next episode.
    fn epsilon(&self) -> f64;

    /// Episodes whose update was cut short by unusable data.
    fn degenerate_episodes(&self) -> u64 {
        0
    }

    /// Generate one episode and learn from it. Returns the episode return.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment rejects an action.
    fn run_episode<R: Rng>(
        &mut self,
        env: &mut Blackjack<R>,
        forced: Option<ForcedStart>,
        rng: &mut impl Rng,
    ) -> Result<i32, StepError>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TrainingReport {
    pub episodes: u64,
    pub total_return: i64,
    /// Episodes whose update was cut short, see [`Control::degenerate_episodes`].
    pub degenerate: u64,
    /// Training ended early because a stop was requested.
    pub stopped: bool,
}

impl TrainingReport {
    #[must_use]
    pub fn mean_return(&self) -> f64 {
        if self.episodes == 0 {
            return 0.0;
        }
        self.total_return as f64 / self.episodes as f64
    }

    pub fn record(&mut self, episode_return: i32) {
        self.episodes += 1;
        self.total_return += i64::from(episode_return);
    }

    pub fn merge(&mut self, other: Self) {
        self.episodes += other.episodes;
        self.total_return += other.total_return;
        self.degenerate += other.degenerate;
        self.stopped |= other.stopped;
    }
}

/// Train for a fixed number of episodes.
///
/// `stop` is checked between episodes, so the values are never left
/// half-updated.
///
/// # Errors
///
/// Returns an error if the environment rejects an action.
pub fn train<C: Control, R: Rng>(
    control: &mut C,
    env: &mut Blackjack<R>,
    episodes: u64,
    stop: &AtomicBool,
    rng: &mut impl Rng,
) -> Result<TrainingReport, StepError> {
    let mut report = TrainingReport::default();
    let degenerate_before = control.degenerate_episodes();
    for episode in 1..=episodes {
        if stop.load(Ordering::Relaxed) {
            log::info!("stopping after {} episodes", report.episodes);
            report.stopped = true;
            break;
        }
        report.record(control.run_episode(env, None, rng)?);
        if episode % LOG_INTERVAL == 0 {
            log::info!(
                "progress: {episode}/{episodes} | epsilon: {:.4} | mean return: {:.4}",
                control.epsilon(),
                report.mean_return()
            );
        }
    }
    report.degenerate = control.degenerate_episodes() - degenerate_before;
    Ok(report)
}
