//! Target-multiplier games over a right-skewed crash distribution
//!
//! The player names a multiplier `m > 1`; the engine draws a crash point
//! from a distribution built so that `P(crash >= m) = 1 / (m * (1 + edge))`.
//! A uniform draw is pushed through an inverse power-law CDF whose shape
//! comes from `ln(0.5) / ln(skew)`, then rescaled logarithmically into
//! `[1, m^2]` with a floor correction below the theoretical minimum.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Crash points below this snap to the distribution floor of 1.0
pub const CRASH_FLOOR: f64 = 1.01;

/// Skew values this close to 1 would zero the logarithm in the shape term
const SKEW_DEGENERACY_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub win: bool,
    /// Gross payout multiplier: the chosen target on a win, 0 on a loss
    pub multiplier: f64,
    /// Where the run crashed, for display
    pub crash: f64,
    pub target: f64,
}

/// Winning probability for a target under an edge
pub fn skew(target: f64, edge: f64) -> f64 {
    1.0 / (target * (1.0 + edge))
}

/// Reject targets before any math runs: `m <= 1` is not a wager, and any
/// `m` that lands `skew` on exactly 1 would make `ln(skew)` zero inside
/// the shape computation. The guard lives here at the validation boundary,
/// never inside the transform.
pub fn validate_target(target: f64, edge: f64) -> Result<()> {
    if !target.is_finite() || target <= 1.0 {
        return Err(Error::InvalidWager(format!(
            "target multiplier must exceed 1, got {}",
            target
        )));
    }
    let s = skew(target, edge);
    if !s.is_finite() || s <= 0.0 || s >= 1.0 - SKEW_DEGENERACY_EPS {
        return Err(Error::InvalidWager(format!(
            "target {} yields degenerate odds under edge {}",
            target, edge
        )));
    }
    Ok(())
}

/// Resolve one run. `draw` must be uniform in `[0, 1)`; callers guarantee
/// the target passed `validate_target` first.
pub fn resolve(draw: f64, target: f64, edge: f64) -> TargetOutcome {
    let s = skew(target, edge);
    let shape = (0.5f64).ln() / s.ln();

    // Inverse power-law CDF: exponent measured in half-lives of the draw,
    // scaled by the shape, then mapped logarithmically onto powers of the
    // target. At draw == skew the exponent is exactly 1, i.e. crash == m.
    let u = draw.max(f64::MIN_POSITIVE);
    let exponent = shape * (u.ln() / (0.5f64).ln());
    let mut crash = target.powf(exponent);

    let ceiling = target * target;
    if crash > ceiling {
        crash = ceiling;
    }
    if crash < CRASH_FLOOR {
        crash = 1.0;
    }

    let win = crash >= target;
    TargetOutcome {
        win,
        multiplier: if win { target } else { 0.0 },
        crash,
        target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_target_at_or_below_one() {
        assert!(validate_target(1.0, 0.05).is_err());
        assert!(validate_target(0.5, 0.05).is_err());
        assert!(validate_target(f64::NAN, 0.05).is_err());
        assert!(validate_target(2.0, 0.05).is_ok());
    }

    #[test]
    fn test_rejects_degenerate_skew() {
        // With a negative edge, a small target can land skew exactly on 1.
        let edge = -0.5;
        let target = 1.0 / (1.0 + edge); // m * (1 + edge) == 1
        assert!(validate_target(target, edge).is_err());
    }

    #[test]
    fn test_win_boundary_at_skew() {
        let target = 2.0;
        let edge = 0.05;
        let s = skew(target, edge);
        // Draw exactly at the skew produces crash == target: a win.
        let at = resolve(s, target, edge);
        assert!(at.win);
        assert!((at.crash - target).abs() < 1e-9);
        // A hair above the skew crashes short of the target.
        let above = resolve(s + 1e-6, target, edge);
        assert!(!above.win);
        assert_eq!(above.multiplier, 0.0);
    }

    #[test]
    fn test_crash_is_capped_at_target_squared() {
        let outcome = resolve(1e-12, 10.0, 0.05);
        assert!(outcome.crash <= 100.0 + 1e-9);
        assert!(outcome.win);
    }

    #[test]
    fn test_floor_correction_snaps_to_one() {
        // Draws near 1 produce crash points just above 1; below the floor
        // they report a flat 1.0.
        let outcome = resolve(0.999999, 2.0, 0.05);
        assert_eq!(outcome.crash, 1.0);
        assert!(!outcome.win);
    }
}
