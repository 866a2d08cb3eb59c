//! Off-policy Monte-Carlo control with weighted importance sampling.
//!
//! Episodes come from a fixed epsilon-soft behavior policy while the values
//! estimate the greedy target policy.

use rand::Rng;

use super::{ConfigError, Control};
use crate::{
    behavior::EpsilonSoft,
    env::{Blackjack, ForcedStart, StepError},
    episode::{self, episode_return, Step},
    value::ActionValues,
};

/// Behavior probabilities at or below this make the importance ratio unusable.
pub const MIN_BEHAVIOR_PROBABILITY: f64 = 1e-12;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ImportanceConfig {
    pub epsilon: f64,
}

impl Default for ImportanceConfig {
    fn default() -> Self {
        Self { epsilon: 0.2 }
    }
}

impl ImportanceConfig {
    /// # Errors
    ///
    /// Returns an error if epsilon is not within [0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if (0.0..=1.0).contains(&self.epsilon) {
            Ok(())
        } else {
            Err(ConfigError::Epsilon(self.epsilon))
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct UpdateReport {
    /// Steps whose value was updated, counted from the end of the episode.
    pub processed: usize,
    /// The scan stopped because of an unusable importance ratio.
    pub degenerate: bool,
}

/// Weighted importance sampling update over one episode, scanning backwards.
///
/// The scan stops at the first step (from the end) whose action differs from
/// the greedy action under the freshly updated values: the target policy
/// would never have taken it, so every earlier step has importance weight
/// zero.
pub fn update(values: &mut ActionValues, trajectory: &[Step]) -> UpdateReport {
    let mut report = UpdateReport::default();
    let mut ret = 0.0;
    let mut weight = 1.0;
    for step in trajectory.iter().rev() {
        ret += f64::from(step.reward);
        values.update(step.state, step.action, ret, weight);
        report.processed += 1;

        if step.action != values.greedy(&step.state, &step.legal) {
            break;
        }

        if !(step.probability.is_finite() && step.probability > MIN_BEHAVIOR_PROBABILITY) {
            log::warn!(
                "behavior probability {} for {} in {} is unusable, skipping the rest of the episode",
                step.probability,
                step.action,
                step.state
            );
            report.degenerate = true;
            break;
        }
        weight /= step.probability;
        if !weight.is_finite() {
            log::warn!("importance weight overflowed, skipping the rest of the episode");
            report.degenerate = true;
            break;
        }
    }
    report
}

pub struct ImportanceControl {
    values: ActionValues,
    behavior: EpsilonSoft,
    degenerate: u64,
}

impl ImportanceControl {
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &ImportanceConfig) -> Result<Self, ConfigError> {
        Self::with_values(ActionValues::new(), config)
    }

    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_values(values: ActionValues, config: &ImportanceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_behavior(
            values,
            EpsilonSoft {
                epsilon: config.epsilon,
            },
        ))
    }

    #[must_use]
    pub const fn with_behavior(values: ActionValues, behavior: EpsilonSoft) -> Self {
        Self {
            values,
            behavior,
            degenerate: 0,
        }
    }

}

impl Control for ImportanceControl {
    fn values(&self) -> &ActionValues {
        &self.values
    }

    fn into_values(self) -> ActionValues {
        self.values
    }

    fn epsilon(&self) -> f64 {
        self.behavior.epsilon
    }

    /// Episodes whose update was cut short by an unusable importance ratio.
    fn degenerate_episodes(&self) -> u64 {
        self.degenerate
    }

    fn run_episode<R: Rng>(
        &mut self,
        env: &mut Blackjack<R>,
        forced: Option<ForcedStart>,
        rng: &mut impl Rng,
    ) -> Result<i32, StepError> {
        let trajectory = episode::generate(env, forced, &self.behavior, &self.values, rng)?;
        if update(&mut self.values, &trajectory).degenerate {
            self.degenerate += 1;
        }
        Ok(episode_return(&trajectory))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::{update, ImportanceConfig, ImportanceControl};
    use crate::{
        action::{Action, Decision},
        control::{ConfigError, Control},
        env::{hand::State, Blackjack},
        episode::Step,
        value::ActionValues,
    };

    fn state(player_sum: u8) -> State {
        State {
            player_sum,
            dealer_upcard: 7,
            usable_ace: false,
            is_pair: false,
        }
    }

    fn step(player_sum: u8, action: Action, reward: i32, probability: f64) -> Step {
        Step {
            state: state(player_sum),
            action,
            reward,
            probability,
            legal: Decision::new(false, false).legal_actions(),
        }
    }

    #[test]
    fn greedy_episode_is_fully_processed() {
        // Hitting to 19 and standing for a win agrees with the greedy policy
        // once the values have been updated.
        let trajectory = [
            step(9, Action::Hit, 0, 0.1),
            step(14, Action::Hit, 0, 0.5),
            step(19, Action::Stand, 1, 0.9),
        ];
        let mut values = ActionValues::new();
        let mut previous = [0.0; 3];
        for _ in 0..5 {
            let report = update(&mut values, &trajectory);
            assert_eq!(report.processed, trajectory.len());
            assert!(!report.degenerate);
            for (s, previous) in trajectory.iter().zip(&mut previous) {
                let weight = values.estimate(&s.state, s.action).weight;
                assert!(weight > *previous);
                *previous = weight;
            }
        }

        // Importance weights compound backwards: 1, 1/0.9, 1/(0.9 * 0.5).
        let expected = [5.0 / (0.9 * 0.5), 5.0 / 0.9, 5.0];
        for (s, expected) in trajectory.iter().zip(expected) {
            let estimate = values.estimate(&s.state, s.action);
            assert!((estimate.weight - expected).abs() < 1e-9);
            assert!((estimate.value - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn deviation_from_greedy_stops_the_scan() {
        // Standing on 19 and losing makes hitting greedy there, so the hit
        // from 12 is never credited.
        let trajectory = [step(12, Action::Hit, 0, 0.5), step(19, Action::Stand, -1, 0.9)];
        let mut values = ActionValues::new();
        let report = update(&mut values, &trajectory);
        assert_eq!(report.processed, 1);
        assert!((values.value(&state(19), Action::Stand) + 1.0).abs() < f64::EPSILON);
        assert!(!values.contains(&state(12)));
    }

    #[test]
    fn degenerate_probability_skips_remaining_updates() {
        let trajectory = [
            step(9, Action::Hit, 0, 0.5),
            step(14, Action::Hit, 0, 0.0),
            step(19, Action::Stand, 1, 0.9),
        ];
        let mut values = ActionValues::new();
        let report = update(&mut values, &trajectory);
        assert!(report.degenerate);
        assert_eq!(report.processed, 2);
        assert!(!values.contains(&state(9)));
        assert!(values
            .iter()
            .flat_map(|(_, entry)| entry.iter())
            .all(|estimate| estimate.value.is_finite() && estimate.weight.is_finite()));
    }

    #[test]
    fn weighted_update_formula() {
        let mut values = ActionValues::new();
        update(&mut values, &[step(20, Action::Stand, 1, 0.9)]);
        update(&mut values, &[step(20, Action::Stand, -1, 0.9)]);
        // Both episodes have W = 1 at their last step, so the mean is plain.
        let estimate = values.estimate(&state(20), Action::Stand);
        assert!(estimate.value.abs() < 1e-12);
        assert!((estimate.weight - 2.0).abs() < 1e-12);
    }

    #[test]
    fn training_keeps_values_finite() {
        let mut control = ImportanceControl::new(&ImportanceConfig::default()).unwrap();
        let mut env = Blackjack::seeded(5);
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        for _ in 0..5_000 {
            let ret = control.run_episode(&mut env, None, &mut rng).unwrap();
            assert!((-2..=2).contains(&ret));
        }
        assert_eq!(control.degenerate_episodes(), 0);
        assert!(!control.values().is_empty());
        assert!(control
            .values()
            .iter()
            .flat_map(|(_, entry)| entry.iter())
            .all(|estimate| estimate.value.is_finite() && estimate.weight >= 0.0));
    }

    #[test]
    fn rejects_bad_epsilon() {
        assert!(matches!(
            ImportanceControl::new(&ImportanceConfig { epsilon: -0.1 }),
            Err(ConfigError::Epsilon(_))
        ));
    }
}
