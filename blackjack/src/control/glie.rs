//! On-policy first-visit Monte-Carlo control with a GLIE epsilon schedule.

use std::collections::{hash_map::Entry, HashMap};

use rand::Rng;

use super::{ConfigError, Control};
use crate::{
    action::Action,
    behavior::EpsilonGreedy,
    env::{hand::State, Blackjack, ForcedStart, StepError},
    episode::{self, episode_return, Step},
    value::ActionValues,
};

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct GlieConfig {
    pub epsilon_start: f64,
    pub epsilon_min: f64,
    /// Share of the training episodes over which epsilon decays to its floor.
    pub decay_fraction: f64,
}

impl Default for GlieConfig {
    fn default() -> Self {
        Self {
            epsilon_start: 1.0,
            epsilon_min: 0.005,
            decay_fraction: 0.4,
        }
    }
}

impl GlieConfig {
    /// # Errors
    ///
    /// Returns an error if any parameter is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.epsilon_start) {
            return Err(ConfigError::Epsilon(self.epsilon_start));
        }
        if !(self.epsilon_min > 0.0 && self.epsilon_min <= self.epsilon_start) {
            return Err(ConfigError::EpsilonMin(self.epsilon_min));
        }
        if !(self.decay_fraction > 0.0 && self.decay_fraction <= 1.0) {
            return Err(ConfigError::DecayFraction(self.decay_fraction));
        }
        Ok(())
    }
}

/// Geometric decay from `start` to `min` over `decay_steps` episodes,
/// then constant.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct EpsilonSchedule {
    start: f64,
    min: f64,
    decay_steps: u64,
    rate: f64,
}

impl EpsilonSchedule {
    #[must_use]
    pub fn new(start: f64, min: f64, decay_steps: u64) -> Self {
        let decay_steps = decay_steps.max(1);
        Self {
            start,
            min,
            decay_steps,
            rate: (min / start).powf(1.0 / decay_steps as f64),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or `episodes` is zero.
    pub fn from_config(config: &GlieConfig, episodes: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        if episodes == 0 {
            return Err(ConfigError::NoEpisodes);
        }
        let decay_steps = (episodes as f64 * config.decay_fraction) as u64;
        Ok(Self::new(config.epsilon_start, config.epsilon_min, decay_steps))
    }

    /// Epsilon after `episode` completed episodes.
    #[must_use]
    pub fn at(&self, episode: u64) -> f64 {
        if episode >= self.decay_steps {
            return self.min;
        }
        (self.start * self.rate.powf(episode as f64)).max(self.min)
    }

    #[must_use]
    pub const fn decay_steps(&self) -> u64 {
        self.decay_steps
    }
}

/// First-visit Monte-Carlo update.
///
/// Returns are accumulated backwards without discounting. Each state-action
/// pair is credited once per episode, at its earliest occurrence, with the
/// running mean over every episode seen so far. Returns how many pairs were
/// updated.
pub fn update(values: &mut ActionValues, trajectory: &[Step]) -> usize {
    let mut first_visit: HashMap<(State, Action), usize> = HashMap::new();
    for (t, step) in trajectory.iter().enumerate() {
        if let Entry::Vacant(entry) = first_visit.entry((step.state, step.action)) {
            entry.insert(t);
        }
    }

    let mut ret = 0;
    let mut updated = 0;
    for (t, step) in trajectory.iter().enumerate().rev() {
        ret += step.reward;
        if first_visit.get(&(step.state, step.action)) == Some(&t) {
            values.update(step.state, step.action, f64::from(ret), 1.0);
            updated += 1;
        }
    }
    updated
}

pub struct GlieControl {
    values: ActionValues,
    schedule: EpsilonSchedule,
    episode: u64,
    stride: u64,
}

impl GlieControl {
    #[must_use]
    pub fn new(schedule: EpsilonSchedule) -> Self {
        Self::with_values(ActionValues::new(), schedule, 0, 1)
    }

    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or `episodes` is zero.
    pub fn from_config(config: &GlieConfig, episodes: u64) -> Result<Self, ConfigError> {
        Ok(Self::new(EpsilonSchedule::from_config(config, episodes)?))
    }

    /// Continue from existing values. The schedule starts at `episode` and
    /// advances by `stride` per episode, which lets several workers share
    /// one global schedule.
    #[must_use]
    pub fn with_values(
        values: ActionValues,
        schedule: EpsilonSchedule,
        episode: u64,
        stride: u64,
    ) -> Self {
        Self {
            values,
            schedule,
            episode,
            stride: stride.max(1),
        }
    }
}

impl Control for GlieControl {
    fn values(&self) -> &ActionValues {
        &self.values
    }

    fn into_values(self) -> ActionValues {
        self.values
    }

    fn epsilon(&self) -> f64 {
        self.schedule.at(self.episode)
    }

    fn run_episode<R: Rng>(
        &mut self,
        env: &mut Blackjack<R>,
        forced: Option<ForcedStart>,
        rng: &mut impl Rng,
    ) -> Result<i32, StepError> {
        let behavior = EpsilonGreedy {
            epsilon: self.epsilon(),
        };
        let trajectory = episode::generate(env, forced, &behavior, &self.values, rng)?;
        update(&mut self.values, &trajectory);
        self.episode += self.stride;
        Ok(episode_return(&trajectory))
    }
}
