use std::collections::{hash_map, HashMap};

use ordered_float::OrderedFloat;

use crate::{
    action::{Action, ACTION_COUNT},
    env::hand::State,
};

/// Weighted running mean of the returns seen for one state-action pair.
///
/// With unit weights this is the plain sample mean and `weight` is the visit
/// count. With importance weights it is the weighted-importance-sampling
/// estimate and `weight` is the cumulative denominator `C(s, a)`.
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct Estimate {
    pub value: f64,
    pub weight: f64,
}

impl Estimate {
    /// Fold one more return into the mean. Non-positive weights are ignored.
    pub fn update(&mut self, target: f64, weight: f64) {
        if weight <= 0.0 {
            return;
        }
        self.weight += weight;
        self.value += weight / self.weight * (target - self.value);
    }

    /// Weighted sum of all returns folded in so far.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.value * self.weight
    }

    /// Combine two estimates built from disjoint data.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        let weight = self.weight + other.weight;
        if weight <= 0.0 {
            return Self::default();
        }
        Self {
            value: (self.total() + other.total()) / weight,
            weight,
        }
    }

    /// Remove the contribution of `base` from an estimate that was built on
    /// top of it. Used to recover what a worker added to a shared snapshot.
    #[must_use]
    pub fn since(self, base: Self) -> Self {
        let weight = self.weight - base.weight;
        if weight <= 0.0 {
            return Self::default();
        }
        Self {
            value: (self.total() - base.total()) / weight,
            weight,
        }
    }
}

pub type Entry = [Estimate; ACTION_COUNT];

/// The action-value mapping `Q` together with its per-action weights.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct ActionValues {
    entries: HashMap<State, Entry>,
}

impl ActionValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, state: &State) -> bool {
        self.entries.contains_key(state)
    }

    #[must_use]
    pub fn get(&self, state: &State) -> Option<&Entry> {
        self.entries.get(state)
    }

    #[must_use]
    pub fn estimate(&self, state: &State, action: Action) -> Estimate {
        self.entries
            .get(state)
            .map(|entry| entry[action.index()])
            .unwrap_or_default()
    }

    /// `Q(s, a)`, zero for pairs that were never updated.
    #[must_use]
    pub fn value(&self, state: &State, action: Action) -> f64 {
        self.estimate(state, action).value
    }

    pub fn update(&mut self, state: State, action: Action, target: f64, weight: f64) {
        self.entries.entry(state).or_default()[action.index()].update(target, weight);
    }

    pub fn insert(&mut self, state: State, entry: Entry) {
        self.entries.insert(state, entry);
    }

    pub fn iter(&self) -> hash_map::Iter<'_, State, Entry> {
        self.entries.iter()
    }

    /// The legal action with the highest value. Ties go to the action with
    /// the lowest index. Falls back to standing if `legal` is empty.
    #[must_use]
    pub fn greedy(&self, state: &State, legal: &[Action]) -> Action {
        let entry = self.entries.get(state).copied().unwrap_or_default();
        legal
            .iter()
            .rev()
            .max_by_key(|action| OrderedFloat(entry[action.index()].value))
            .copied()
            .unwrap_or(Action::Stand)
    }

    /// Merge what `local` learned on top of `base` into this table.
    ///
    /// The running means are not associative across partial batches, so the
    /// weighted totals and weights are combined rather than the values.
    pub fn absorb(&mut self, base: &Self, local: &Self) {
        for (state, entry) in &local.entries {
            let base = base.entries.get(state).copied().unwrap_or_default();
            let mine = self.entries.entry(*state).or_default();
            for ((mine, theirs), base) in mine.iter_mut().zip(entry).zip(base) {
                *mine = mine.combine(theirs.since(base));
            }
        }
    }
}
