//! Weighted discrete-table games: keno-style match-count payouts
//!
//! The player picks up to `MAX_PICKS` distinct markers from a shared pool;
//! the engine draws `DRAW_COUNT` markers without replacement and pays from
//! a 2-D table indexed by `[picks][matches]`. Absent entries pay zero.

use serde::{Deserialize, Serialize};

use crate::engine::DrawSource;
use crate::error::{Error, Result};

/// Markers are numbered `1..=POOL_SIZE`
pub const POOL_SIZE: u8 = 40;
/// Markers drawn each round, without replacement
pub const DRAW_COUNT: usize = 10;
/// Maximum selections per wager
pub const MAX_PICKS: usize = 10;

/// Payout multipliers indexed by `[picks][matches]`; zero means no payout.
/// Rows beyond a pick count's reachable match counts stay zero.
const PAYTABLE: [[f64; DRAW_COUNT + 1]; MAX_PICKS + 1] = [
    // 0 picks: invalid, never consulted
    [0.0; 11],
    // 1 pick
    [0.0, 3.6, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    // 2 picks
    [0.0, 0.0, 9.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    // 3 picks
    [0.0, 0.0, 2.0, 24.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    // 4 picks
    [0.0, 0.0, 1.0, 5.0, 60.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    // 5 picks
    [0.0, 0.0, 0.0, 2.0, 12.0, 150.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    // 6 picks
    [0.0, 0.0, 0.0, 1.0, 5.0, 40.0, 400.0, 0.0, 0.0, 0.0, 0.0],
    // 7 picks
    [0.0, 0.0, 0.0, 0.5, 2.0, 15.0, 100.0, 800.0, 0.0, 0.0, 0.0],
    // 8 picks
    [0.0, 0.0, 0.0, 0.0, 1.5, 8.0, 50.0, 250.0, 1500.0, 0.0, 0.0],
    // 9 picks
    [0.0, 0.0, 0.0, 0.0, 1.0, 4.0, 20.0, 120.0, 600.0, 2500.0, 0.0],
    // 10 picks
    [0.0, 0.0, 0.0, 0.0, 0.5, 2.0, 10.0, 60.0, 300.0, 1000.0, 5000.0],
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableOutcome {
    pub win: bool,
    pub multiplier: f64,
    pub matches: usize,
    pub drawn: Vec<u8>,
}

/// Validate picks, draw the house markers, count matches, look up payout.
pub fn resolve(draws: &mut dyn DrawSource, picks: &[u8]) -> Result<TableOutcome> {
    if picks.is_empty() || picks.len() > MAX_PICKS {
        return Err(Error::InvalidInput(format!(
            "must pick between 1 and {} markers",
            MAX_PICKS
        )));
    }
    for (i, &pick) in picks.iter().enumerate() {
        if pick < 1 || pick > POOL_SIZE {
            return Err(Error::InvalidInput(format!(
                "marker {} outside pool 1..={}",
                pick, POOL_SIZE
            )));
        }
        if picks[..i].contains(&pick) {
            return Err(Error::InvalidInput(format!("duplicate marker {}", pick)));
        }
    }

    let drawn = draw_without_replacement(draws, DRAW_COUNT);
    let matches = picks.iter().filter(|p| drawn.contains(p)).count();
    let multiplier = PAYTABLE[picks.len()][matches];

    Ok(TableOutcome {
        win: multiplier > 0.0,
        multiplier,
        matches,
        drawn,
    })
}

/// Rejection-sample `count` distinct markers from the pool.
fn draw_without_replacement(draws: &mut dyn DrawSource, count: usize) -> Vec<u8> {
    let mut drawn: Vec<u8> = Vec::with_capacity(count);
    while drawn.len() < count {
        let candidate = draws.draw_index(POOL_SIZE as usize) as u8 + 1;
        if !drawn.contains(&candidate) {
            drawn.push(candidate);
        }
    }
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SeededDraws;

    #[test]
    fn test_rejects_bad_picks() {
        let mut draws = SeededDraws::new(1);
        assert!(resolve(&mut draws, &[]).is_err());
        assert!(resolve(&mut draws, &[0]).is_err());
        assert!(resolve(&mut draws, &[41]).is_err());
        assert!(resolve(&mut draws, &[3, 3]).is_err());
        assert!(resolve(&mut draws, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]).is_err());
    }

    #[test]
    fn test_draws_are_distinct_and_in_pool() {
        let mut draws = SeededDraws::new(42);
        let outcome = resolve(&mut draws, &[1, 2, 3]).unwrap();
        assert_eq!(outcome.drawn.len(), DRAW_COUNT);
        for &d in &outcome.drawn {
            assert!((1..=POOL_SIZE).contains(&d));
        }
        let mut sorted = outcome.drawn.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), DRAW_COUNT);
    }

    #[test]
    fn test_zero_if_absent() {
        // One pick, zero matches: table has no entry, pays nothing.
        for seed in 0..64 {
            let mut draws = SeededDraws::new(seed);
            let outcome = resolve(&mut draws, &[7]).unwrap();
            if outcome.matches == 0 {
                assert_eq!(outcome.multiplier, 0.0);
                assert!(!outcome.win);
                return;
            }
        }
        panic!("no seed produced a zero-match round");
    }

    #[test]
    fn test_match_count_indexes_table() {
        let mut draws = SeededDraws::new(9);
        let picks = [1, 2, 3, 4, 5];
        let outcome = resolve(&mut draws, &picks).unwrap();
        assert_eq!(outcome.multiplier, PAYTABLE[picks.len()][outcome.matches]);
    }
}
