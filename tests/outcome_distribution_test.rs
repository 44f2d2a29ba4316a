//! Statistical properties of the outcome resolvers
//!
//! Seeded draw streams keep these reproducible; the tolerances are wide
//! enough that they are not flaky under reseeding.

use housebot::engine::target::{resolve as resolve_target, skew, validate_target};
use housebot::engine::threshold::resolve as resolve_threshold;
use housebot::engine::{DrawSource, SeededDraws};

#[test]
fn threshold_cutoff_is_strict() {
    let edge = 0.05;
    assert!(!resolve_threshold(0.5 + edge, edge).win);
    assert!(resolve_threshold(0.5 + edge + 1e-9, edge).win);
}

#[test]
fn target_rejects_before_any_draw() {
    assert!(validate_target(1.0, 0.04).is_err());
    assert!(validate_target(0.99, 0.04).is_err());
    assert!(validate_target(1.000001, 0.04).is_ok());
}

#[test]
fn target_long_run_win_rate_tracks_skew() {
    let target = 2.0;
    for edge in [0.0, 0.04] {
        let expected = skew(target, edge);
        let mut draws = SeededDraws::new(0xC0FFEE);
        let trials = 100_000;
        let mut wins = 0u32;
        for _ in 0..trials {
            if resolve_target(draws.draw(), target, edge).win {
                wins += 1;
            }
        }
        let rate = wins as f64 / trials as f64;
        // Binomial std dev at p≈0.5 over 100k trials is ~0.0016; allow 4σ.
        assert!(
            (rate - expected).abs() < 0.0065,
            "edge {}: rate {} vs expected {}",
            edge,
            rate,
            expected
        );
    }
}

#[test]
fn target_crash_points_stay_in_band() {
    let mut draws = SeededDraws::new(99);
    for _ in 0..10_000 {
        let outcome = resolve_target(draws.draw(), 3.0, 0.04);
        assert!(outcome.crash >= 1.0);
        assert!(outcome.crash <= 9.0 + 1e-9);
    }
}

#[test]
fn threshold_long_run_favors_the_house() {
    let edge = 0.05;
    let mut draws = SeededDraws::new(0xBEEF);
    let trials = 100_000;
    let mut wins = 0u32;
    for _ in 0..trials {
        if resolve_threshold(draws.draw(), edge).win {
            wins += 1;
        }
    }
    let rate = wins as f64 / trials as f64;
    assert!((rate - 0.45).abs() < 0.0065, "win rate {}", rate);
}
