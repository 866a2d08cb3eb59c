use rand::Rng;

use crate::{
    action::{Action, Actions},
    behavior::Behavior,
    env::{hand::State, Blackjack, ForcedStart, StepError},
    value::ActionValues,
};

#[rustfmt::skip]
#[derive(Clone, PartialEq, Debug)]
pub struct Step {
    pub state: State,     // s_t
    pub action: Action,   // a_t
    pub reward: i32,      // r_{t+1}
    pub probability: f64, // b(a_t | s_t)
    pub legal: Actions,   // actions available in s_t
}

pub type Trajectory = Vec<Step>;

/// Undiscounted sum of rewards.
#[must_use]
pub fn episode_return(trajectory: &[Step]) -> i32 {
    trajectory.iter().map(|step| step.reward).sum()
}

/// Play one hand to completion, choosing every action with `behavior`
/// among the actions legal at that point.
///
/// # Errors
///
/// Returns an error if the environment rejects an action, which would mean
/// the behavior policy picked something outside the legal set.
pub fn generate<R: Rng>(
    env: &mut Blackjack<R>,
    forced: Option<ForcedStart>,
    behavior: &impl Behavior,
    values: &ActionValues,
    rng: &mut impl Rng,
) -> Result<Trajectory, StepError> {
    let mut trajectory = Trajectory::new();
    let mut state = env.reset(forced);
    loop {
        let legal = env.decision().legal_actions();
        let choice = behavior.select(values, &state, &legal, rng);
        let transition = env.step(choice.action)?;
        trajectory.push(Step {
            state,
            action: choice.action,
            reward: transition.reward,
            probability: choice.probability,
            legal,
        });
        if transition.done {
            return Ok(trajectory);
        }
        state = transition.state;
    }
}
