//! Multi-worker training.
//!
//! Every worker owns its own environment (and so its own shoe) and random
//! stream. Training runs in rounds: all workers start a round from the same
//! snapshot of the values, and at the end of the round what each worker added
//! is merged back through [`ActionValues::absorb`], which combines the
//! weights and weighted totals instead of averaging the means.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use thiserror::Error;

use crate::{
    behavior::EpsilonSoft,
    control::{
        glie::{EpsilonSchedule, GlieConfig, GlieControl},
        importance::{ImportanceConfig, ImportanceControl},
        ConfigError,
        Control,
        TrainingReport,
    },
    env::{Blackjack, StepError},
    value::ActionValues,
    LOG_INTERVAL,
};

#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Step(#[from] StepError),
}

/// Episodes each worker plays between two merges.
pub const ROUND_EPISODES: u64 = 5_000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ParallelConfig {
    pub workers: usize,
    pub episodes: u64,
    pub seed: u64,
}

impl ParallelConfig {
    /// # Errors
    ///
    /// Returns an error if there are no workers or no episodes.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.episodes == 0 {
            return Err(ConfigError::NoEpisodes);
        }
        Ok(())
    }
}

struct Worker {
    env: Blackjack<ChaCha8Rng>,
    rng: ChaCha8Rng,
}

impl Worker {
    fn new(seed: [u8; 32], index: usize) -> Self {
        let mut env_rng = ChaCha8Rng::from_seed(seed);
        env_rng.set_stream(2 * index as u64);
        let mut rng = ChaCha8Rng::from_seed(seed);
        rng.set_stream(2 * index as u64 + 1);
        Self {
            env: Blackjack::new(env_rng),
            rng,
        }
    }
}

/// Episodes the worker with `index` plays in a round of `total` episodes.
const fn share(total: u64, workers: u64, index: u64) -> u64 {
    total / workers + if index < total % workers { 1 } else { 0 }
}

/// Run rounds until `config.episodes` have been played or a stop is requested.
///
/// `make` builds a worker's control from the round snapshot, the global index
/// of the worker's first episode in the round, and the number of workers.
fn run<C, F>(
    config: &ParallelConfig,
    mut values: ActionValues,
    stop: &AtomicBool,
    make: F,
) -> Result<(ActionValues, TrainingReport), StepError>
where
    C: Control,
    F: Fn(ActionValues, u64, u64) -> C + Sync,
{
    let mut rng = rand::rngs::StdRng::seed_from_u64(config.seed);
    let chacha_seed = rng.gen();
    let mut workers: Vec<_> = (0..config.workers)
        .map(|i| Worker::new(chacha_seed, i))
        .collect();
    let worker_count = config.workers as u64;

    let mut report = TrainingReport::default();
    let mut next_log = LOG_INTERVAL;
    while report.episodes < config.episodes {
        if stop.load(Ordering::Relaxed) {
            log::info!("stopping after {} episodes", report.episodes);
            report.stopped = true;
            break;
        }
        let round = (config.episodes - report.episodes).min(ROUND_EPISODES * worker_count);
        let start = report.episodes;

        let results = workers
            .par_iter_mut()
            .enumerate()
            .map(|(i, worker)| -> Result<_, StepError> {
                let i = i as u64;
                let mut control = make(values.clone(), start + i, worker_count);
                let mut local = TrainingReport::default();
                for _ in 0..share(round, worker_count, i) {
                    if stop.load(Ordering::Relaxed) {
                        local.stopped = true;
                        break;
                    }
                    local.record(control.run_episode(&mut worker.env, None, &mut worker.rng)?);
                }
                local.degenerate = control.degenerate_episodes();
                Ok((control.into_values(), local))
            })
            .collect::<Result<Vec<_>, StepError>>()?;

        let mut merged = values.clone();
        for (local_values, local_report) in &results {
            merged.absorb(&values, local_values);
            report.merge(*local_report);
        }
        values = merged;

        if report.episodes >= next_log {
            log::info!(
                "progress: {}/{} | mean return: {:.4}",
                report.episodes,
                config.episodes,
                report.mean_return()
            );
            next_log = (report.episodes / LOG_INTERVAL + 1) * LOG_INTERVAL;
        }
    }
    Ok((values, report))
}

/// On-policy GLIE control spread over several workers that share one
/// epsilon schedule, interleaving their episode indices.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the environment
/// rejects an action.
pub fn train_glie(
    config: &ParallelConfig,
    glie: &GlieConfig,
    stop: &AtomicBool,
) -> Result<(ActionValues, TrainingReport), ParallelError> {
    config.validate()?;
    let schedule = EpsilonSchedule::from_config(glie, config.episodes)?;
    log::debug!(
        "training GLIE control with {} workers, epsilon decays over {} episodes",
        config.workers,
        schedule.decay_steps()
    );
    Ok(run(config, ActionValues::new(), stop, |values, first, stride| {
        GlieControl::with_values(values, schedule, first, stride)
    })?)
}

/// Off-policy control spread over several workers.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the environment
/// rejects an action.
pub fn train_importance(
    config: &ParallelConfig,
    importance: &ImportanceConfig,
    stop: &AtomicBool,
) -> Result<(ActionValues, TrainingReport), ParallelError> {
    config.validate()?;
    importance.validate()?;
    log::debug!(
        "training off-policy control with {} workers, epsilon {}",
        config.workers,
        importance.epsilon
    );
    let behavior = EpsilonSoft {
        epsilon: importance.epsilon,
    };
    Ok(run(config, ActionValues::new(), stop, |values, _, _| {
        ImportanceControl::with_behavior(values, behavior)
    })?)
}
