use rand::{seq::SliceRandom, Rng};

use super::hand::ACE;

pub const DECKS: usize = 6;
/// The shoe is refilled before a draw whenever fewer cards than this remain.
pub const RESHUFFLE_THRESHOLD: usize = 15;

const RANKS: [u8; 13] = [2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10, ACE];
const SUITS: usize = 4;

/// Several standard decks shuffled together. Cards are drawn from the back.
#[derive(Clone, Debug)]
pub struct Shoe {
    cards: Vec<u8>,
}

impl Shoe {
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut shoe = Self {
            cards: Vec::with_capacity(RANKS.len() * SUITS * DECKS),
        };
        shoe.refill(rng);
        shoe
    }

    fn refill(&mut self, rng: &mut impl Rng) {
        self.cards.clear();
        for _ in 0..SUITS * DECKS {
            self.cards.extend_from_slice(&RANKS);
        }
        self.cards.shuffle(rng);
    }

    /// Draw a card, refilling the shoe first if it is running low.
    pub fn draw(&mut self, rng: &mut impl Rng) -> u8 {
        if self.cards.len() < RESHUFFLE_THRESHOLD {
            self.refill(rng);
        }
        // The shoe holds at least RESHUFFLE_THRESHOLD cards here.
        self.cards.pop().unwrap_or(ACE)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}
