use rand::{seq::SliceRandom, Rng};
use rand_distr::{Distribution, WeightedIndex};

use crate::{action::Action, env::hand::State, value::ActionValues};

/// An action together with the probability the behavior policy gave it.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Choice {
    pub action: Action,
    pub probability: f64,
}

impl Choice {
    #[must_use]
    pub const fn certain(action: Action) -> Self {
        Self {
            action,
            probability: 1.0,
        }
    }
}

pub trait Behavior {
    /// Pick one of the `legal` actions. `legal` is never empty.
    fn select(
        &self,
        values: &ActionValues,
        state: &State,
        legal: &[Action],
        rng: &mut impl Rng,
    ) -> Choice;
}

/// Probability of `action` under an epsilon-soft distribution around `greedy`.
fn soft_probability(epsilon: f64, legal: usize, action: Action, greedy: Action) -> f64 {
    let explore = epsilon / legal as f64;
    if action == greedy {
        explore + (1.0 - epsilon)
    } else {
        explore
    }
}

/// With probability epsilon explore uniformly, otherwise act greedily.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct EpsilonGreedy {
    pub epsilon: f64,
}

impl Behavior for EpsilonGreedy {
    fn select(
        &self,
        values: &ActionValues,
        state: &State,
        legal: &[Action],
        rng: &mut impl Rng,
    ) -> Choice {
        let greedy = values.greedy(state, legal);
        let action = if rng.gen::<f64>() < self.epsilon {
            legal.choose(rng).copied().unwrap_or(greedy)
        } else {
            greedy
        };
        Choice {
            action,
            probability: soft_probability(self.epsilon, legal.len(), action, greedy),
        }
    }
}

/// Sample directly from the epsilon-soft distribution: every legal action gets
/// `epsilon / |legal|` and the greedy one gets the remaining mass on top.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct EpsilonSoft {
    pub epsilon: f64,
}

impl EpsilonSoft {
    #[must_use]
    pub fn probabilities(&self, values: &ActionValues, state: &State, legal: &[Action]) -> Vec<f64> {
        let greedy = values.greedy(state, legal);
        legal
            .iter()
            .map(|&action| soft_probability(self.epsilon, legal.len(), action, greedy))
            .collect()
    }
}

impl Behavior for EpsilonSoft {
    fn select(
        &self,
        values: &ActionValues,
        state: &State,
        legal: &[Action],
        rng: &mut impl Rng,
    ) -> Choice {
        let probabilities = self.probabilities(values, state, legal);
        match WeightedIndex::new(&probabilities) {
            Ok(weighted_index) => {
                let index = weighted_index.sample(rng);
                Choice {
                    action: legal[index],
                    probability: probabilities[index],
                }
            }
            Err(_) => Choice::certain(values.greedy(state, legal)),
        }
    }
}

/// Stand once the player total reaches a threshold, hit below it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Threshold {
    pub stand_on: u8,
}

impl Default for Threshold {
    fn default() -> Self {
        Self { stand_on: 20 }
    }
}

impl Behavior for Threshold {
    fn select(
        &self,
        _values: &ActionValues,
        state: &State,
        _legal: &[Action],
        _rng: &mut impl Rng,
    ) -> Choice {
        if state.player_sum >= self.stand_on {
            Choice::certain(Action::Stand)
        } else {
            Choice::certain(Action::Hit)
        }
    }
}
