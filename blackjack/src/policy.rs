use std::collections::HashMap;

use rand::Rng;

use crate::{
    action::{Action, Decision},
    behavior::{Behavior, Choice},
    env::hand::{State, ACE},
    value::ActionValues,
};

/// Used for states the values have never seen: stand on 17 or more, hit
/// otherwise. Never doubles or splits.
pub const FALLBACK_STAND_ON: u8 = 17;

#[must_use]
pub const fn fallback(state: &State) -> Action {
    if state.player_sum >= FALLBACK_STAND_ON {
        Action::Stand
    } else {
        Action::Hit
    }
}

/// The recommended action among `legal`: the greedy one if the state has
/// values, otherwise the [`fallback`].
#[must_use]
pub fn recommend(values: &ActionValues, state: &State, legal: &[Action]) -> Action {
    if values.contains(state) {
        values.greedy(state, legal)
    } else {
        fallback(state)
    }
}

/// Play the recommended action.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Recommended;

impl Behavior for Recommended {
    fn select(
        &self,
        values: &ActionValues,
        state: &State,
        legal: &[Action],
        _rng: &mut impl Rng,
    ) -> Choice {
        Choice::certain(recommend(values, state, legal))
    }
}

pub type Policy = HashMap<State, Action>;

/// Recommended action for every state that has values, assuming the state is
/// the first decision of the hand (so doubling is allowed).
#[must_use]
pub fn extract(values: &ActionValues) -> Policy {
    values
        .iter()
        .map(|(state, _)| {
            let legal = Decision::new(true, state.is_pair).legal_actions();
            (*state, values.greedy(state, &legal))
        })
        .collect()
}

pub const UPCARD_COUNT: usize = 10;
pub const DEALER_UPCARDS: [u8; UPCARD_COUNT] = [2, 3, 4, 5, 6, 7, 8, 9, 10, ACE];

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ChartRow {
    pub label: String,
    /// One recommendation per entry of [`DEALER_UPCARDS`].
    pub actions: [Action; UPCARD_COUNT],
}

/// Layout of a basic strategy chart: hard totals, soft totals and pairs
/// against every dealer upcard. Only the data, drawing it is up to the caller.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StrategyChart {
    pub hard: Vec<ChartRow>,
    pub soft: Vec<ChartRow>,
    pub pairs: Vec<ChartRow>,
}

impl StrategyChart {
    #[must_use]
    pub fn new(values: &ActionValues) -> Self {
        let row = |label: String, player_sum: u8, usable_ace: bool, is_pair: bool| {
            let legal = Decision::new(true, is_pair).legal_actions();
            ChartRow {
                label,
                actions: DEALER_UPCARDS.map(|dealer_upcard| {
                    let state = State {
                        player_sum,
                        dealer_upcard,
                        usable_ace,
                        is_pair,
                    };
                    recommend(values, &state, &legal)
                }),
            }
        };

        let hard = (5..=19)
            .map(|total| row(total.to_string(), total, false, false))
            .collect();
        let soft = (13..=20)
            .map(|total| row(format!("A,{}", total - 11), total, true, false))
            .collect();
        let pairs = (2..=ACE)
            .map(|card| {
                let label = match card {
                    10 => "T,T".to_owned(),
                    ACE => "A,A".to_owned(),
                    card => format!("{card},{card}"),
                };
                // A pair of aces is a soft 12.
                let (total, soft) = if card == ACE { (12, true) } else { (2 * card, false) };
                row(label, total, soft, true)
            })
            .collect();

        Self { hard, soft, pairs }
    }

    pub fn rows(&self) -> impl Iterator<Item = &ChartRow> {
        self.hard.iter().chain(&self.soft).chain(&self.pairs)
    }
}
