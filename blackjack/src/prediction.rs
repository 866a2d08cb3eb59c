//! Monte-Carlo prediction: estimating how good states are under a fixed
//! policy, without improving the policy.

use std::collections::{HashMap, HashSet};

use rand::Rng;

use crate::{
    behavior::Behavior,
    env::{hand::State, Blackjack, ForcedStart, StepError},
    episode::{self, episode_return, Step},
    value::{ActionValues, Estimate},
};

pub type StateValues = HashMap<State, Estimate>;

/// Credit every state with the return that followed its first visit.
pub fn update(values: &mut StateValues, trajectory: &[Step]) {
    let mut returns = Vec::with_capacity(trajectory.len());
    let mut ret = 0;
    for step in trajectory.iter().rev() {
        ret += step.reward;
        returns.push(ret);
    }
    returns.reverse();

    let mut seen = HashSet::new();
    for (step, ret) in trajectory.iter().zip(returns) {
        if seen.insert(step.state) {
            values
                .entry(step.state)
                .or_default()
                .update(f64::from(ret), 1.0);
        }
    }
}

/// First-visit Monte-Carlo estimate of the state values of `policy`.
///
/// # Errors
///
/// Returns an error if the environment rejects an action.
pub fn first_visit<R: Rng>(
    env: &mut Blackjack<R>,
    policy: &impl Behavior,
    episodes: u64,
    forced: Option<ForcedStart>,
    rng: &mut impl Rng,
) -> Result<StateValues, StepError> {
    let values = ActionValues::new();
    let mut state_values = StateValues::new();
    for _ in 0..episodes {
        let trajectory = episode::generate(env, forced, policy, &values, rng)?;
        update(&mut state_values, &trajectory);
    }
    Ok(state_values)
}

/// Mean return of `policy` from each forced opening.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct StartComparison {
    pub five: Estimate,
    pub twenty_one: Estimate,
}

/// Play `episodes` rounds, each one hand from a forced 5 and one from a
/// forced 21, and average the returns per opening.
///
/// # Errors
///
/// Returns an error if the environment rejects an action.
pub fn compare_forced_starts<R: Rng>(
    env: &mut Blackjack<R>,
    policy: &impl Behavior,
    episodes: u64,
    rng: &mut impl Rng,
) -> Result<StartComparison, StepError> {
    let values = ActionValues::new();
    let mut comparison = StartComparison::default();
    for _ in 0..episodes {
        for (forced, estimate) in [
            (ForcedStart::Five, &mut comparison.five),
            (ForcedStart::TwentyOne, &mut comparison.twenty_one),
        ] {
            let trajectory = episode::generate(env, Some(forced), policy, &values, rng)?;
            estimate.update(f64::from(episode_return(&trajectory)), 1.0);
        }
    }
    Ok(comparison)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::{compare_forced_starts, first_visit, update, StateValues};
    use crate::{
        action::{Action, Decision},
        behavior::Threshold,
        env::{hand::State, Blackjack, ForcedStart},
        episode::Step,
    };

    #[test]
    fn first_visit_credits_earliest_occurrence() {
        let state = |player_sum| State {
            player_sum,
            dealer_upcard: 4,
            usable_ace: false,
            is_pair: false,
        };
        let step = |player_sum, action, reward| Step {
            state: state(player_sum),
            action,
            reward,
            probability: 1.0,
            legal: Decision::new(false, false).legal_actions(),
        };
        let mut values = StateValues::new();
        update(
            &mut values,
            &[
                step(10, Action::Hit, 0),
                step(10, Action::Hit, 0),
                step(18, Action::Stand, -1),
            ],
        );
        assert!((values[&state(10)].weight - 1.0).abs() < f64::EPSILON);
        assert!((values[&state(10)].value + 1.0).abs() < f64::EPSILON);
        assert!((values[&state(18)].value + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn standing_on_twenty_one_is_worth_more_than_five() {
        let mut env = Blackjack::seeded(21);
        let mut rng = rand::rngs::StdRng::seed_from_u64(21);
        let comparison =
            compare_forced_starts(&mut env, &Threshold::default(), 2_000, &mut rng).unwrap();
        assert!((comparison.five.weight - 2_000.0).abs() < f64::EPSILON);
        assert!(comparison.twenty_one.value > 0.5);
        assert!(comparison.twenty_one.value > comparison.five.value);
    }

    #[test]
    fn forced_prediction_visits_the_forced_state() {
        let mut env = Blackjack::seeded(3);
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let values = first_visit(
            &mut env,
            &Threshold::default(),
            500,
            Some(ForcedStart::TwentyOne),
            &mut rng,
        )
        .unwrap();
        let visited: f64 = values
            .iter()
            .filter(|(state, _)| state.player_sum == 21 && state.usable_ace)
            .map(|(_, estimate)| estimate.weight)
            .sum();
        assert!((visited - 500.0).abs() < f64::EPSILON);
        assert!(values
            .values()
            .all(|estimate| (-1.0..=1.0).contains(&estimate.value)));
    }
}
