use std::fmt;

pub const ACE: u8 = 11;
pub const BLACKJACK: u8 = 21;

/// Value of a hand after aces have been demoted as needed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct HandValue {
    pub total: u8,
    /// At least one ace is still counted as 11.
    pub soft: bool,
}

impl HandValue {
    #[must_use]
    pub const fn is_bust(self) -> bool {
        self.total > BLACKJACK
    }
}

/// Cards are stored by blackjack value: 2 to 10, and 11 for an ace.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Hand {
    cards: Vec<u8>,
}

impl Hand {
    #[must_use]
    pub fn new(cards: &[u8]) -> Self {
        Self {
            cards: cards.to_vec(),
        }
    }

    pub fn push(&mut self, card: u8) {
        self.cards.push(card);
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    #[must_use]
    pub fn cards(&self) -> &[u8] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Aces count as 11, then get demoted to 1 one at a time
    /// until the total is at most 21 or there are no aces left.
    #[must_use]
    pub fn value(&self) -> HandValue {
        let mut total: u32 = self.cards.iter().map(|&c| u32::from(c)).sum();
        let mut aces = self.cards.iter().filter(|&&c| c == ACE).count();
        while total > u32::from(BLACKJACK) && aces > 0 {
            total -= 10;
            aces -= 1;
        }
        HandValue {
            total: u8::try_from(total).unwrap_or(u8::MAX),
            soft: aces > 0,
        }
    }

    /// Holds an ace and stays at 21 or under with every ace counted as 11,
    /// so no ace has been demoted.
    #[must_use]
    pub fn is_raw_soft(&self) -> bool {
        let raw: u32 = self.cards.iter().map(|&c| u32::from(c)).sum();
        self.cards.contains(&ACE) && raw <= u32::from(BLACKJACK)
    }

    #[must_use]
    pub fn is_pair(&self) -> bool {
        matches!(self.cards.as_slice(), [a, b] if a == b)
    }
}

/// What the player observes. Always derived from the hand, never stored.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct State {
    pub player_sum: u8,
    pub dealer_upcard: u8,
    pub usable_ace: bool,
    pub is_pair: bool,
}

impl State {
    #[must_use]
    pub fn observe(hand: &Hand, dealer_upcard: u8) -> Self {
        let value = hand.value();
        Self {
            player_sum: value.total,
            dealer_upcard,
            usable_ace: value.soft,
            is_pair: hand.is_pair(),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.player_sum,
            self.dealer_upcard,
            if self.usable_ace { "soft" } else { "hard" },
            if self.is_pair { "pair" } else { "-" },
        )
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};

    use super::{Hand, State, ACE};

    #[test]
    fn aces_demote_one_at_a_time() {
        let value = Hand::new(&[ACE, ACE]).value();
        assert_eq!(value.total, 12);
        assert!(value.soft);

        let value = Hand::new(&[ACE, ACE, 10]).value();
        assert_eq!(value.total, 12);
        assert!(!value.soft);

        let value = Hand::new(&[ACE, 6, 9]).value();
        assert_eq!(value.total, 16);
        assert!(!value.soft);

        let value = Hand::new(&[ACE, 10]).value();
        assert_eq!(value.total, 21);
        assert!(value.soft);
    }

    #[test]
    fn raw_soft_means_no_ace_was_demoted() {
        assert!(Hand::new(&[ACE, 6]).is_raw_soft());
        assert!(Hand::new(&[ACE, 4, 6]).is_raw_soft());
        // Still soft after demoting one of the aces, but not raw soft.
        assert!(Hand::new(&[ACE, ACE]).value().soft);
        assert!(!Hand::new(&[ACE, ACE]).is_raw_soft());
        assert!(!Hand::new(&[ACE, 5, ACE]).is_raw_soft());
        assert!(!Hand::new(&[9, 8]).is_raw_soft());
    }

    #[test]
    fn demotion_keeps_total_at_most_21() {
        const SEED: u64 = 123;
        let mut rng = rand::rngs::StdRng::seed_from_u64(SEED);
        for _ in 0..10_000 {
            let len = rng.gen_range(1..8);
            let cards: Vec<u8> = (0..len).map(|_| rng.gen_range(2..=ACE)).collect();
            let hand = Hand::new(&cards);
            let value = hand.value();

            let raw: u32 = cards.iter().map(|&c| u32::from(c)).sum();
            let aces = cards.iter().filter(|&&c| c == ACE).count() as u32;
            // Each ace is demoted at most once.
            assert!(u32::from(value.total) >= raw - 10 * aces);
            if raw - 10 * aces <= 21 {
                assert!(value.total <= 21, "{cards:?} valued at {}", value.total);
            }
            // Only demote while busting.
            if raw <= 21 {
                assert_eq!(u32::from(value.total), raw);
            }
        }
    }

    #[test]
    fn state_is_derived_from_hand() {
        let state = State::observe(&Hand::new(&[8, 8]), 6);
        assert_eq!(state.player_sum, 16);
        assert!(state.is_pair);
        assert!(!state.usable_ace);

        let state = State::observe(&Hand::new(&[8, 8, 2]), 6);
        assert!(!state.is_pair);
        assert_eq!(state.player_sum, 18);
    }
}
