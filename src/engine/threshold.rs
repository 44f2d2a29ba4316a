//! Threshold games: one draw against a bias-shifted cutoff
//!
//! Over/under style wagers pay even money. The cutoff is `0.5 + edge`, so a
//! positive house edge shrinks the winning region below a fair coin.

use serde::{Deserialize, Serialize};

/// Even-money payout on a win
pub const EVEN_MONEY: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOutcome {
    pub win: bool,
    /// Gross payout multiplier on the wager (0 on a loss)
    pub multiplier: f64,
    /// The raw draw, kept for display
    pub draw: f64,
}

/// Win iff `draw > 0.5 + edge`. Equality at the cutoff is a loss, not a
/// push: strict comparison is where the edge lives.
pub fn resolve(draw: f64, edge: f64) -> ThresholdOutcome {
    let win = draw > 0.5 + edge;
    ThresholdOutcome {
        win,
        multiplier: if win { EVEN_MONEY } else { 0.0 },
        draw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_at_cutoff_loses() {
        let outcome = resolve(0.55, 0.05);
        assert!(!outcome.win);
        assert_eq!(outcome.multiplier, 0.0);
    }

    #[test]
    fn test_above_cutoff_wins_even_money() {
        let outcome = resolve(0.550001, 0.05);
        assert!(outcome.win);
        assert_eq!(outcome.multiplier, EVEN_MONEY);
    }

    #[test]
    fn test_zero_edge_is_fair_coin_cutoff() {
        assert!(!resolve(0.5, 0.0).win);
        assert!(resolve(0.500001, 0.0).win);
    }
}
