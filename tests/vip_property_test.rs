//! Property tests for the VIP schedule

use housebot::{Chips, TierProgress, VipLevel, VipSchedule};
use proptest::prelude::*;

/// Random valid schedules: strictly ascending bases, tier counts above 1.
fn schedules() -> impl Strategy<Value = VipSchedule> {
    (2usize..6, 2u32..8, 1i64..500)
        .prop_flat_map(|(level_count, tier_count, step)| {
            prop::collection::vec(1i64..1_000, level_count).prop_map(move |gaps| {
                let mut base = 0i64;
                let levels = gaps
                    .into_iter()
                    .enumerate()
                    .map(|(i, gap)| {
                        base += gap * step;
                        VipLevel {
                            name: format!("L{}", i),
                            base_requirement: Chips::from_chips(base),
                            tier_count,
                            bonus_payout: Chips::from_chips(10),
                        }
                    })
                    .collect();
                VipSchedule::new(levels).expect("generated schedule is valid")
            })
        })
}

proptest! {
    #[test]
    fn tier_progress_is_monotonic(schedule in schedules(), samples in prop::collection::vec(0i64..2_000_000, 1..64)) {
        let mut sorted = samples;
        sorted.sort_unstable();

        let mut last_threshold = Chips::ZERO;
        let mut last_level = 0usize;
        let mut maxed = false;
        for wagered in sorted {
            match schedule.tier_progress(Chips::from_chips(wagered)) {
                TierProgress::Progress { level, next_threshold, .. } => {
                    prop_assert!(!maxed, "progress reappeared after MaxLevel");
                    prop_assert!(level >= last_level);
                    prop_assert!(next_threshold >= last_threshold);
                    last_level = level;
                    last_threshold = next_threshold;
                }
                TierProgress::MaxLevel => maxed = true,
            }
        }
    }

    #[test]
    fn next_threshold_is_always_ahead(schedule in schedules(), wagered in 0i64..2_000_000) {
        if let TierProgress::Progress { next_threshold, .. } =
            schedule.tier_progress(Chips::from_chips(wagered))
        {
            prop_assert!(next_threshold >= Chips::from_chips(wagered));
        }
    }
}
