use std::fmt;

use arrayvec::ArrayVec;

/// Number of actions in the closed action set.
pub const ACTION_COUNT: usize = 4;

pub type Actions = ArrayVec<Action, ACTION_COUNT>;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Stand,
    Hit,
    DoubleDown,
    Split,
}

impl Action {
    /// All actions, ordered by index. Greedy ties resolve to the earliest one.
    pub const ALL: [Self; ACTION_COUNT] = [Self::Stand, Self::Hit, Self::DoubleDown, Self::Split];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Stand => 0,
            Self::Hit => 1,
            Self::DoubleDown => 2,
            Self::Split => 3,
        }
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Stand),
            1 => Some(Self::Hit),
            2 => Some(Self::DoubleDown),
            3 => Some(Self::Split),
            _ => None,
        }
    }

    /// Single letter used in strategy charts.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Stand => 'S',
            Self::Hit => 'H',
            Self::DoubleDown => 'D',
            Self::Split => 'P',
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stand => "stand",
            Self::Hit => "hit",
            Self::DoubleDown => "double",
            Self::Split => "split",
        };
        f.write_str(name)
    }
}

/// What the player is allowed to do at a decision point.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Decision {
    pub first: bool,
    pub pair: bool,
}

impl Decision {
    #[must_use]
    pub const fn new(first: bool, pair: bool) -> Self {
        Self { first, pair }
    }

    /// Stand and hit are always legal. Doubling is only allowed as the
    /// first decision, and splitting additionally needs a pair.
    #[must_use]
    pub const fn is_legal(self, action: Action) -> bool {
        match action {
            Action::Stand | Action::Hit => true,
            Action::DoubleDown => self.first,
            Action::Split => self.first && self.pair,
        }
    }

    #[must_use]
    pub fn legal_actions(self) -> Actions {
        Action::ALL
            .into_iter()
            .filter(|&action| self.is_legal(action))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Decision};

    #[test]
    fn index_roundtrip() {
        for action in Action::ALL {
            assert_eq!(Action::from_index(action.index()), Some(action));
        }
        assert_eq!(Action::from_index(4), None);
    }

    #[test]
    fn legal_sets() {
        assert_eq!(
            Decision::new(false, true).legal_actions().as_slice(),
            [Action::Stand, Action::Hit]
        );
        assert_eq!(
            Decision::new(true, false).legal_actions().as_slice(),
            [Action::Stand, Action::Hit, Action::DoubleDown]
        );
        assert_eq!(
            Decision::new(true, true).legal_actions().as_slice(),
            Action::ALL
        );
    }

    #[test]
    fn split_needs_pair_and_first_decision() {
        assert!(!Decision::new(true, false).is_legal(Action::Split));
        assert!(!Decision::new(false, true).is_legal(Action::Split));
        assert!(Decision::new(true, true).is_legal(Action::Split));
    }
}
