use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use self::{
    hand::{Hand, State, ACE},
    shoe::Shoe,
};
use crate::action::{Action, Decision};

pub mod dealer;
pub mod hand;
pub mod shoe;

/// Deterministic player opening, used for calibration and tests.
/// The dealer is still dealt at random.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ForcedStart {
    Five,
    TwentyOne,
}

impl ForcedStart {
    #[must_use]
    pub const fn cards(self) -> [u8; 2] {
        match self {
            Self::Five => [2, 3],
            Self::TwentyOne => [ACE, 10],
        }
    }

    #[must_use]
    pub const fn total(self) -> u8 {
        match self {
            Self::Five => 5,
            Self::TwentyOne => 21,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown forced start `{0}`, expected `5` or `21`")]
pub struct ParseForcedStartError(String);

impl FromStr for ForcedStart {
    type Err = ParseForcedStartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "5" => Ok(Self::Five),
            "21" => Ok(Self::TwentyOne),
            other => Err(ParseForcedStartError(other.to_owned())),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Transition {
    pub state: State,
    pub reward: i32,
    pub done: bool,
}

/// Asking for an action that is not allowed is rejected instead of guessed at.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StepError {
    #[error("{action} is not legal in state {state}")]
    Illegal { action: Action, state: State },
    #[error("the hand is already finished")]
    Finished,
}

/// One blackjack hand against the dealer, played as an episodic MDP.
pub struct Blackjack<R = ChaCha8Rng> {
    rng: R,
    shoe: Shoe,
    player: Hand,
    dealer: Hand,
    decisions: u32,
    done: bool,
}

impl Blackjack<ChaCha8Rng> {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Blackjack<R> {
    /// Create an environment that owns its random source.
    /// Call [`Self::reset`] before stepping.
    pub fn new(mut rng: R) -> Self {
        let shoe = Shoe::new(&mut rng);
        Self {
            rng,
            shoe,
            player: Hand::default(),
            dealer: Hand::default(),
            decisions: 0,
            done: true,
        }
    }

    fn draw(&mut self) -> u8 {
        self.shoe.draw(&mut self.rng)
    }

    /// Deal a new hand and return the opening state.
    pub fn reset(&mut self, forced: Option<ForcedStart>) -> State {
        self.dealer.clear();
        let (a, b) = (self.draw(), self.draw());
        self.dealer.push(a);
        self.dealer.push(b);

        self.player = match forced {
            Some(forced) => Hand::new(&forced.cards()),
            None => {
                let (a, b) = (self.draw(), self.draw());
                Hand::new(&[a, b])
            }
        };
        self.decisions = 0;
        self.done = false;
        self.state()
    }

    #[must_use]
    pub fn dealer_upcard(&self) -> u8 {
        self.dealer.cards().first().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn state(&self) -> State {
        State::observe(&self.player, self.dealer_upcard())
    }

    #[must_use]
    pub fn decision(&self) -> Decision {
        Decision::new(self.decisions == 0, self.player.is_pair())
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    #[must_use]
    pub const fn player(&self) -> &Hand {
        &self.player
    }

    #[must_use]
    pub const fn dealer(&self) -> &Hand {
        &self.dealer
    }

    /// Apply a player action.
    ///
    /// # Errors
    ///
    /// Returns an error if the action is not legal at this decision point
    /// or if the hand has already finished.
    pub fn step(&mut self, action: Action) -> Result<Transition, StepError> {
        if self.done {
            return Err(StepError::Finished);
        }
        if !self.decision().is_legal(action) {
            return Err(StepError::Illegal {
                action,
                state: self.state(),
            });
        }
        self.decisions += 1;

        let (reward, done) = match action {
            Action::Hit => {
                let card = self.draw();
                self.player.push(card);
                if self.player.value().is_bust() {
                    (-1, true)
                } else {
                    (0, false)
                }
            }
            Action::Stand => (self.finish(self.player.value().total), true),
            Action::DoubleDown => {
                let card = self.draw();
                self.player.push(card);
                let value = self.player.value();
                let outcome = if value.is_bust() {
                    -1
                } else {
                    self.finish(value.total)
                };
                (2 * outcome, true)
            }
            Action::Split => {
                let [first, second] = [self.player.cards()[0], self.player.cards()[1]];
                (self.play_split_hand(first) + self.play_split_hand(second), true)
            }
        };

        self.done = done;
        Ok(Transition {
            state: self.state(),
            reward,
            done,
        })
    }

    /// Let the dealer play out and settle a standing player total.
    fn finish(&mut self, player_total: u8) -> i32 {
        let dealer_value = dealer::play(&mut self.dealer, &mut self.shoe, &mut self.rng);
        dealer::settle(player_total, dealer_value)
    }

    /// Finish one half of a split with the fixed split rule.
    fn play_split_hand(&mut self, card: u8) -> i32 {
        let upcard = self.dealer_upcard();
        let second = self.draw();
        let mut hand = Hand::new(&[card, second]);
        while dealer::split_hand_hits(&hand, upcard) {
            let card = self.draw();
            hand.push(card);
        }
        let value = hand.value();
        if value.is_bust() {
            -1
        } else {
            self.finish(value.total)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Blackjack, ForcedStart, StepError};
    use crate::{action::Action, env::hand::BLACKJACK};

    #[test]
    fn forced_twenty_one() {
        let mut env = Blackjack::seeded(1);
        for _ in 0..1_000 {
            let state = env.reset(Some(ForcedStart::TwentyOne));
            assert_eq!(env.player().len(), 2);
            assert_eq!(state.player_sum, BLACKJACK);
            assert!(state.usable_ace);
            assert!(!state.is_pair);
            assert_eq!(env.dealer().len(), 2);
        }
    }

    #[test]
    fn forced_five() {
        let mut env = Blackjack::seeded(2);
        let state = env.reset(Some(ForcedStart::Five));
        assert_eq!(state.player_sum, 5);
        assert!(!state.usable_ace);
    }

    #[test]
    fn parse_forced_start() {
        assert_eq!("21".parse(), Ok(ForcedStart::TwentyOne));
        assert_eq!(" 5".parse(), Ok(ForcedStart::Five));
        assert!("none".parse::<ForcedStart>().is_err());
    }

    #[test]
    fn terminal_rewards_are_bounded() {
        let mut env = Blackjack::seeded(3);
        for i in 0..5_000 {
            env.reset(None);
            let action = match i % 3 {
                0 => Action::Stand,
                1 => Action::DoubleDown,
                _ => Action::Hit,
            };
            let transition = env.step(action).unwrap();
            match action {
                Action::Stand => {
                    assert!(transition.done);
                    assert!((-1..=1).contains(&transition.reward));
                }
                Action::DoubleDown => {
                    assert!(transition.done);
                    assert!([-2, 0, 2].contains(&transition.reward));
                    assert_eq!(env.player().len(), 3);
                }
                _ => {
                    if transition.done {
                        assert_eq!(transition.reward, -1);
                        assert!(transition.state.player_sum > BLACKJACK);
                    } else {
                        assert_eq!(transition.reward, 0);
                    }
                }
            }
        }
    }

    #[test]
    fn split_resolves_both_hands() {
        let mut env = Blackjack::seeded(4);
        let mut splits = 0;
        while splits < 500 {
            let state = env.reset(None);
            if !state.is_pair {
                continue;
            }
            splits += 1;
            let transition = env.step(Action::Split).unwrap();
            assert!(transition.done);
            assert!((-2..=2).contains(&transition.reward));
            assert_eq!(transition.state, state);
        }
    }

    #[test]
    fn illegal_actions_are_rejected() {
        let mut env = Blackjack::seeded(5);
        let state = env.reset(Some(ForcedStart::Five));
        assert_eq!(
            env.step(Action::Split),
            Err(StepError::Illegal {
                action: Action::Split,
                state
            })
        );

        env.step(Action::Hit).unwrap();
        if !env.is_done() {
            assert!(matches!(
                env.step(Action::DoubleDown),
                Err(StepError::Illegal { .. })
            ));
        }
        env.step(Action::Stand).unwrap();
        assert_eq!(env.step(Action::Stand), Err(StepError::Finished));
    }
}
