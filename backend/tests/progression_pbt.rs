//! Property-Based Tests for the Progression Math
//!
//! Tests the following invariants:
//! - Level Round-Trip: level(xp_for_level(L)) == L for any level
//! - Monotonicity: level and progress never decrease as XP grows
//! - Progress Bounds: level progress is always within 0..=100
//! - Bonus Soundness: streak bonus never exceeds the base reward
//! - Streak Ordering: longest streak is never below the current streak

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use solquest_algo::streak::derive_streak;
use solquest_algo::xp;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_xp() -> impl Strategy<Value = u64> {
    0u64..=10_000_000u64
}

fn arb_history() -> impl Strategy<Value = BTreeMap<i64, u64>> {
    proptest::collection::btree_map(20_000i64..=20_400i64, 0u64..=500u64, 0..60)
}

fn arb_frozen_days() -> impl Strategy<Value = BTreeSet<i64>> {
    proptest::collection::btree_set(20_000i64..=20_400i64, 0..20)
}

// ============================================================================
// Leveling Curve
// ============================================================================

proptest! {
    #[test]
    fn prop_level_round_trip(level in 0u32..=3_000u32) {
        let threshold = xp::xp_for_level(level);
        prop_assert_eq!(xp::level(threshold), level);
        // One XP short of the threshold still belongs to the level below.
        if level > 0 {
            prop_assert_eq!(xp::level(threshold - 1), level - 1);
        }
    }

    #[test]
    fn prop_level_is_monotonic(xp_amount in arb_xp(), delta in 0u64..=100_000u64) {
        prop_assert!(xp::level(xp_amount + delta) >= xp::level(xp_amount));
    }

    #[test]
    fn prop_progress_is_bounded(xp_amount in arb_xp()) {
        let percent = xp::level_progress_percent(xp_amount);
        prop_assert!(percent <= 100);
    }

    #[test]
    fn prop_xp_to_next_level_crosses_the_boundary(xp_amount in arb_xp()) {
        let needed = xp::xp_to_next_level(xp_amount);
        prop_assert!(needed > 0);
        prop_assert_eq!(xp::level(xp_amount + needed), xp::level(xp_amount) + 1);
        if needed > 1 {
            prop_assert_eq!(xp::level(xp_amount + needed - 1), xp::level(xp_amount));
        }
    }

    #[test]
    fn prop_title_is_always_defined(level in 0u32..=100_000u32) {
        prop_assert!(!xp::level_title(level).is_empty());
    }
}

// ============================================================================
// Streak Bonus
// ============================================================================

proptest! {
    #[test]
    fn prop_bonus_never_exceeds_base(base in 0u64..=100_000u64, streak in 0u32..=1_000u32) {
        let bonus = xp::streak_bonus(base, streak);
        prop_assert!(bonus <= base);
    }

    #[test]
    fn prop_bonus_is_zero_below_a_week(base in 0u64..=100_000u64, streak in 0u32..=6u32) {
        prop_assert_eq!(xp::streak_bonus(base, streak), 0);
    }

    #[test]
    fn prop_multiplier_is_monotonic(streak in 0u32..=1_000u32) {
        prop_assert!(xp::streak_multiplier(streak + 1) >= xp::streak_multiplier(streak));
    }
}

// ============================================================================
// Streak Derivation
// ============================================================================

proptest! {
    #[test]
    fn prop_longest_is_at_least_current(
        history in arb_history(),
        frozen in arb_frozen_days(),
        today in 20_000i64..=20_400i64,
    ) {
        let summary = derive_streak(&history, &frozen, today);
        prop_assert!(summary.longest >= summary.current);
    }

    #[test]
    fn prop_active_today_matches_history(
        history in arb_history(),
        frozen in arb_frozen_days(),
        today in 20_000i64..=20_400i64,
    ) {
        let summary = derive_streak(&history, &frozen, today);
        let expected = history.get(&today).copied().unwrap_or(0) > 0;
        prop_assert_eq!(summary.active_today, expected);
        if summary.active_today {
            prop_assert!(summary.current >= 1);
        }
    }

    #[test]
    fn prop_frozen_days_never_extend_the_count_alone(
        frozen in arb_frozen_days(),
        today in 20_000i64..=20_400i64,
    ) {
        // With no activity at all, freezes cannot manufacture a streak.
        let summary = derive_streak(&BTreeMap::new(), &frozen, today);
        prop_assert_eq!(summary.current, 0);
        prop_assert_eq!(summary.longest, 0);
    }
}
