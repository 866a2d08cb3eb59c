use rand::Rng;

use super::{
    hand::{Hand, HandValue, ACE},
    shoe::Shoe,
};

/// The dealer draws while below this total, soft or hard.
pub const DEALER_STANDS_ON: u8 = 17;

#[must_use]
pub const fn dealer_hits(value: HandValue) -> bool {
    value.total < DEALER_STANDS_ON
}

/// Draw for the dealer until the hand reaches 17 or more.
pub fn play(hand: &mut Hand, shoe: &mut Shoe, rng: &mut impl Rng) -> HandValue {
    while dealer_hits(hand.value()) {
        hand.push(shoe.draw(rng));
    }
    hand.value()
}

/// Settle a player total that did not bust against a finished dealer hand.
#[must_use]
pub const fn settle(player: u8, dealer: HandValue) -> i32 {
    if dealer.is_bust() || player > dealer.total {
        1
    } else if player < dealer.total {
        -1
    } else {
        0
    }
}

/// Fixed hit/stand rule used to finish split hands. It does not consult
/// the learned values.
///
/// A hand only plays as soft while no ace has been demoted (see
/// [`Hand::is_raw_soft`]); a pair of aces is played as a hard 12.
/// Soft totals hit up to 17 and hit 18 against a 9, 10 or ace.
/// Hard totals stand on 17+, stand on 12 to 16 against a 2 to 6, and hit
/// otherwise.
#[must_use]
pub fn split_hand_hits(hand: &Hand, dealer_upcard: u8) -> bool {
    let value = hand.value();
    if value.is_bust() {
        return false;
    }
    if hand.is_raw_soft() {
        return value.total <= 17 || (value.total == 18 && matches!(dealer_upcard, 9 | 10 | ACE));
    }
    if value.total >= 17 {
        return false;
    }
    !((12..=16).contains(&value.total) && (2..=6).contains(&dealer_upcard))
}
