//! VIP level schedule and tier progression
//!
//! Levels are coarse milestones ordered by lifetime wagered; tiers are the
//! fine-grained markers evenly spaced between one level's base requirement
//! and the next level's. The terminal level has a single degenerate tier.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::token::Chips;

/// One VIP level in the ascending schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VipLevel {
    pub name: String,
    /// Lifetime wagered needed to enter this level
    pub base_requirement: Chips,
    /// Number of tiers between this level and the next (must be > 1)
    pub tier_count: u32,
    /// Bonus paid as tiers are crossed
    pub bonus_payout: Chips,
}

/// Validated, strictly ascending VIP schedule.
///
/// Only constructible through `new`, so deserialized configuration cannot
/// smuggle an unvalidated schedule in.
#[derive(Debug, Clone, Serialize)]
pub struct VipSchedule {
    levels: Vec<VipLevel>,
}

/// Where a player sits in the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierProgress {
    Progress {
        /// Index into the schedule
        level: usize,
        /// 1-based tier within the level
        tier: u32,
        /// Next unreached wager threshold
        next_threshold: Chips,
    },
    /// Terminal level reached; no further tiers exist
    MaxLevel,
}

impl VipSchedule {
    /// Build a schedule, enforcing the configuration invariants:
    /// strictly ascending base requirements, `tier_count > 1`, positive bonus.
    ///
    /// `tier_count > 1` is load-time law rather than a call-time guard: the
    /// tier-bonus formula divides by `tier_count - 1`, so a schedule entry
    /// with a single tier would be a division by zero waiting downstream.
    pub fn new(levels: Vec<VipLevel>) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::Config("VIP schedule must not be empty".to_string()));
        }
        for (i, level) in levels.iter().enumerate() {
            if level.tier_count <= 1 {
                return Err(Error::Config(format!(
                    "VIP level '{}' has tier_count {} (must be > 1)",
                    level.name, level.tier_count
                )));
            }
            if !level.bonus_payout.is_positive() {
                return Err(Error::Config(format!(
                    "VIP level '{}' has non-positive bonus payout",
                    level.name
                )));
            }
            if i > 0 && levels[i - 1].base_requirement >= level.base_requirement {
                return Err(Error::Config(format!(
                    "VIP schedule not strictly ascending at '{}'",
                    level.name
                )));
            }
        }
        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[VipLevel] {
        &self.levels
    }

    /// Stock schedule used when no configuration is supplied
    pub fn default_schedule() -> Self {
        Self::new(vec![
            VipLevel {
                name: "Bronze".to_string(),
                base_requirement: Chips::from_chips(1_000),
                tier_count: 4,
                bonus_payout: Chips::from_chips(50),
            },
            VipLevel {
                name: "Silver".to_string(),
                base_requirement: Chips::from_chips(5_000),
                tier_count: 4,
                bonus_payout: Chips::from_chips(200),
            },
            VipLevel {
                name: "Gold".to_string(),
                base_requirement: Chips::from_chips(25_000),
                tier_count: 5,
                bonus_payout: Chips::from_chips(1_000),
            },
            VipLevel {
                name: "Diamond".to_string(),
                base_requirement: Chips::from_chips(100_000),
                tier_count: 2,
                bonus_payout: Chips::from_chips(5_000),
            },
        ])
        .expect("stock VIP schedule is valid")
    }

    /// Tier thresholds within a level: `base + k * step` for
    /// `k = 0..tier_count-1`, where `step` spans to the next level's base.
    fn tier_step(&self, level: usize) -> Option<i64> {
        let next = self.levels.get(level + 1)?;
        let span = next.base_requirement.amount() - self.levels[level].base_requirement.amount();
        Some(span / self.levels[level].tier_count as i64)
    }

    /// Locate the highest level whose base requirement is strictly below
    /// `total_wagered`, then find the next unreached tier threshold inside it.
    pub fn tier_progress(&self, total_wagered: Chips) -> TierProgress {
        let current = self
            .levels
            .iter()
            .rposition(|l| l.base_requirement < total_wagered);

        let level = match current {
            // Below the first level: tier 1 of the first level, working
            // toward its base requirement.
            None => {
                return TierProgress::Progress {
                    level: 0,
                    tier: 1,
                    next_threshold: self.levels[0].base_requirement,
                }
            }
            Some(i) => i,
        };

        let step = match self.tier_step(level) {
            // Terminal level: one degenerate tier, nothing left to reach.
            None => return TierProgress::MaxLevel,
            Some(s) => s,
        };

        // k = 0 is the base requirement itself, already strictly below
        // total_wagered by the level selection above.
        let base = self.levels[level].base_requirement.amount();
        for k in 1..self.levels[level].tier_count {
            let threshold = Chips::new(base + k as i64 * step);
            if threshold > total_wagered {
                return TierProgress::Progress {
                    level,
                    tier: k,
                    next_threshold: threshold,
                };
            }
        }

        // Every tier of the current level is behind us; progress rolls to
        // tier 1 of the next level.
        debug!(level, "tier progress rolled over to next level");
        TierProgress::Progress {
            level: level + 1,
            tier: 1,
            next_threshold: self.levels[level + 1].base_requirement,
        }
    }

    /// Bonus owed for standing at `current_tier` of `level`.
    ///
    /// NOTE: the guard checks `current_tier > 1` while the divisor is
    /// `tier_count - 1` — the guard does not protect the field that can
    /// actually zero the denominator. Kept as-is; the schedule validation
    /// in `new()` (`tier_count > 1`) is what really keeps this sound.
    pub fn tier_bonus(&self, level: usize, current_tier: u32) -> Chips {
        let Some(l) = self.levels.get(level) else {
            return Chips::ZERO;
        };
        if current_tier > 1 {
            let fraction = (current_tier - 1) as f64 / (l.tier_count - 1) as f64;
            l.bonus_payout.scaled(fraction)
        } else {
            Chips::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> VipSchedule {
        VipSchedule::new(vec![
            VipLevel {
                name: "Bronze".to_string(),
                base_requirement: Chips::from_chips(1_000),
                tier_count: 4,
                bonus_payout: Chips::from_chips(50),
            },
            VipLevel {
                name: "Silver".to_string(),
                base_requirement: Chips::from_chips(5_000),
                tier_count: 4,
                bonus_payout: Chips::from_chips(200),
            },
            VipLevel {
                name: "Gold".to_string(),
                base_requirement: Chips::from_chips(25_000),
                tier_count: 2,
                bonus_payout: Chips::from_chips(1_000),
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_below_first_level() {
        let s = schedule();
        assert_eq!(
            s.tier_progress(Chips::from_chips(10)),
            TierProgress::Progress {
                level: 0,
                tier: 1,
                next_threshold: Chips::from_chips(1_000),
            }
        );
    }

    #[test]
    fn test_mid_level_tiers() {
        let s = schedule();
        // Bronze spans 1,000..5,000 in 4 tiers => step 1,000
        match s.tier_progress(Chips::from_chips(2_500)) {
            TierProgress::Progress {
                level,
                tier,
                next_threshold,
            } => {
                assert_eq!(level, 0);
                assert_eq!(tier, 2);
                assert_eq!(next_threshold, Chips::from_chips(3_000));
            }
            other => panic!("unexpected progress: {:?}", other),
        }
    }

    #[test]
    fn test_rollover_to_next_level() {
        let s = schedule();
        // Past every Bronze tier threshold (last is 4,000) but below Silver base
        match s.tier_progress(Chips::from_chips(4_500)) {
            TierProgress::Progress {
                level,
                tier,
                next_threshold,
            } => {
                assert_eq!(level, 1);
                assert_eq!(tier, 1);
                assert_eq!(next_threshold, Chips::from_chips(5_000));
            }
            other => panic!("unexpected progress: {:?}", other),
        }
    }

    #[test]
    fn test_max_level_sentinel() {
        let s = schedule();
        assert_eq!(
            s.tier_progress(Chips::from_chips(100_000)),
            TierProgress::MaxLevel
        );
    }

    #[test]
    fn test_rejects_single_tier_level() {
        let result = VipSchedule::new(vec![VipLevel {
            name: "Broken".to_string(),
            base_requirement: Chips::from_chips(100),
            tier_count: 1,
            bonus_payout: Chips::from_chips(10),
        }]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_non_ascending() {
        let result = VipSchedule::new(vec![
            VipLevel {
                name: "A".to_string(),
                base_requirement: Chips::from_chips(1_000),
                tier_count: 2,
                bonus_payout: Chips::from_chips(10),
            },
            VipLevel {
                name: "B".to_string(),
                base_requirement: Chips::from_chips(500),
                tier_count: 2,
                bonus_payout: Chips::from_chips(10),
            },
        ]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_monotonic_progress() {
        // Thresholds must never decrease as lifetime wagered increases.
        let s = schedule();
        let mut last = Chips::ZERO;
        let mut maxed = false;
        for w in (0..60_000).step_by(250) {
            match s.tier_progress(Chips::from_chips(w)) {
                TierProgress::Progress { next_threshold, .. } => {
                    assert!(!maxed, "left MaxLevel after reaching it");
                    assert!(next_threshold >= last);
                    last = next_threshold;
                }
                TierProgress::MaxLevel => maxed = true,
            }
        }
        assert!(maxed);
    }

    #[test]
    fn test_tier_bonus_guard() {
        let s = schedule();
        assert_eq!(s.tier_bonus(0, 1), Chips::ZERO);
        assert_eq!(s.tier_bonus(0, 4), Chips::from_chips(50));
    }
}
