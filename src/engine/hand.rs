//! Hand-evaluation games: blackjack-style totals and dealer resolution
//!
//! Hand value sums card ranks with face cards worth 10 and aces worth 11,
//! demoting aces to 1 one at a time while the total busts. A two-card 21
//! is a natural and pays a premium; a 21 built from three or more cards is
//! an ordinary win. The dealer draws to a fixed stand threshold with no
//! further player input.

use serde::{Deserialize, Serialize};

use crate::engine::DrawSource;

/// Dealer stands at or above this total
pub const DEALER_STAND: u32 = 17;
/// Premium multiplier for a natural (3:2 plus stake)
pub const NATURAL_MULTIPLIER: f64 = 2.5;
/// Ordinary win multiplier (even money)
pub const WIN_MULTIPLIER: f64 = 2.0;

pub const BLACKJACK: u32 = 21;

/// A card by rank only; suits never matter for value.
/// Rank 1 is the ace, 11..13 are the face cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub rank: u8,
}

impl Card {
    pub fn new(rank: u8) -> Self {
        debug_assert!((1..=13).contains(&rank));
        Self { rank }
    }

    /// Base value before ace demotion: faces count 10, aces 11.
    pub fn base_value(&self) -> u32 {
        match self.rank {
            1 => 11,
            11..=13 => 10,
            r => r as u32,
        }
    }

    pub fn is_ace(&self) -> bool {
        self.rank == 1
    }
}

/// Best hand value: aces start at 11 and demote to 1 while the total
/// exceeds 21 and a demotable ace remains.
pub fn hand_value(cards: &[Card]) -> u32 {
    let mut total: u32 = cards.iter().map(|c| c.base_value()).sum();
    let mut soft_aces = cards.iter().filter(|c| c.is_ace()).count();
    while total > BLACKJACK && soft_aces > 0 {
        total -= 10;
        soft_aces -= 1;
    }
    total
}

/// A two-card 21 exactly; more cards reaching 21 is not a natural.
pub fn is_natural(cards: &[Card]) -> bool {
    cards.len() == 2 && hand_value(cards) == BLACKJACK
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandOutcome {
    pub win: bool,
    pub push: bool,
    pub natural: bool,
    pub multiplier: f64,
    pub player: Vec<Card>,
    pub dealer: Vec<Card>,
}

fn deal(draws: &mut dyn DrawSource) -> Card {
    Card::new(draws.draw_index(13) as u8 + 1)
}

/// Deal two cards each from an unbounded shoe, stand the player, run the
/// dealer to the stand threshold, and compare.
pub fn resolve(draws: &mut dyn DrawSource) -> HandOutcome {
    let player = vec![deal(draws), deal(draws)];
    let mut dealer = vec![deal(draws), deal(draws)];

    let player_value = hand_value(&player);
    let player_natural = is_natural(&player);
    let dealer_natural = is_natural(&dealer);

    // Naturals short-circuit the dealer's draw.
    if player_natural || dealer_natural {
        let (win, push, multiplier) = match (player_natural, dealer_natural) {
            (true, true) => (false, true, 1.0),
            (true, false) => (true, false, NATURAL_MULTIPLIER),
            _ => (false, false, 0.0),
        };
        return HandOutcome {
            win,
            push,
            natural: player_natural,
            multiplier,
            player,
            dealer,
        };
    }

    while hand_value(&dealer) < DEALER_STAND {
        dealer.push(deal(draws));
    }
    let dealer_value = hand_value(&dealer);

    let (win, push, multiplier) = if dealer_value > BLACKJACK || player_value > dealer_value {
        (true, false, WIN_MULTIPLIER)
    } else if player_value == dealer_value {
        (false, true, 1.0)
    } else {
        (false, false, 0.0)
    };

    HandOutcome {
        win,
        push,
        natural: false,
        multiplier,
        player,
        dealer,
    }
}
