//! Streak derivation
//!
//! A streak is never stored; it is derived from the day-keyed activity
//! history (epoch days in UTC, value = XP earned that day). A day counts as
//! active iff its XP is greater than zero. A consumed freeze bridges a
//! missed day: the walk continues across it but the frozen day itself does
//! not add to the count.
//!
//! The current day gets a grace period - a streak is only considered broken
//! once yesterday is neither active nor frozen, so "no activity yet today"
//! does not zero the counter mid-day.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Derived streak figures for one learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    /// Consecutive active days ending today (or yesterday, pre-grace).
    pub current: u32,
    /// Longest freeze-bridged run of active days anywhere in the history.
    pub longest: u32,
    /// Whether activity has been recorded for today.
    pub active_today: bool,
}

/// Derives current/longest streak from an activity history.
///
/// `history` maps epoch day (days since 1970-01-01 UTC) to XP earned that
/// day; `frozen_days` holds days covered by a consumed streak freeze;
/// `today` is the caller's current epoch day (no clock access here).
pub fn derive_streak(
    history: &BTreeMap<i64, u64>,
    frozen_days: &BTreeSet<i64>,
    today: i64,
) -> StreakSummary {
    let is_active = |day: i64| history.get(&day).is_some_and(|&xp| xp > 0);

    let active_today = is_active(today);
    let mut current = 0u32;
    let mut day = if active_today { today } else { today - 1 };
    loop {
        if is_active(day) {
            current += 1;
            day -= 1;
        } else if frozen_days.contains(&day) {
            // Frozen day: the run continues but the day is not counted.
            day -= 1;
        } else {
            break;
        }
    }

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<i64> = None;
    for (&active_day, _) in history.iter().filter(|(_, &xp)| xp > 0) {
        run = match prev {
            Some(p) if ((p + 1)..active_day).all(|d| frozen_days.contains(&d)) => run + 1,
            _ => 1,
        };
        prev = Some(active_day);
        longest = longest.max(run);
    }

    StreakSummary {
        current,
        longest,
        active_today,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(days: &[(i64, u64)]) -> BTreeMap<i64, u64> {
        days.iter().copied().collect()
    }

    #[test]
    fn test_empty_history() {
        let s = derive_streak(&BTreeMap::new(), &BTreeSet::new(), 100);
        assert_eq!(s.current, 0);
        assert_eq!(s.longest, 0);
        assert!(!s.active_today);
    }

    #[test]
    fn test_consecutive_days() {
        let h = history(&[(98, 50), (99, 30), (100, 75)]);
        let s = derive_streak(&h, &BTreeSet::new(), 100);
        assert_eq!(s.current, 3);
        assert_eq!(s.longest, 3);
        assert!(s.active_today);
    }

    #[test]
    fn test_today_grace_period() {
        // Nothing yet today: streak counts from yesterday, not zeroed.
        let h = history(&[(98, 50), (99, 30)]);
        let s = derive_streak(&h, &BTreeSet::new(), 100);
        assert_eq!(s.current, 2);
        assert!(!s.active_today);
    }

    #[test]
    fn test_broken_streak() {
        let h = history(&[(95, 50), (96, 20), (99, 30), (100, 10)]);
        let s = derive_streak(&h, &BTreeSet::new(), 100);
        assert_eq!(s.current, 2);
        assert_eq!(s.longest, 2);
    }

    #[test]
    fn test_freeze_bridges_gap() {
        let h = history(&[(97, 50), (99, 30), (100, 10)]);
        let frozen: BTreeSet<i64> = [98].into_iter().collect();
        let s = derive_streak(&h, &frozen, 100);
        // Frozen day 98 keeps the run alive without counting itself.
        assert_eq!(s.current, 3);
        assert_eq!(s.longest, 3);
    }

    #[test]
    fn test_freeze_does_not_count_as_active() {
        let h = history(&[(99, 30), (100, 10)]);
        let frozen: BTreeSet<i64> = [98].into_iter().collect();
        let s = derive_streak(&h, &frozen, 100);
        assert_eq!(s.current, 2);
    }

    #[test]
    fn test_unbridged_two_day_gap_breaks() {
        let h = history(&[(96, 50), (99, 30), (100, 10)]);
        let frozen: BTreeSet<i64> = [97].into_iter().collect();
        let s = derive_streak(&h, &frozen, 100);
        // Day 98 is neither active nor frozen, so the run stops there.
        assert_eq!(s.current, 2);
    }

    #[test]
    fn test_frozen_today_without_activity() {
        let h = history(&[(98, 50), (99, 30)]);
        let frozen: BTreeSet<i64> = [100].into_iter().collect();
        let s = derive_streak(&h, &frozen, 100);
        assert_eq!(s.current, 2);
        assert!(!s.active_today);
    }

    #[test]
    fn test_zero_xp_day_is_inactive() {
        let h = history(&[(99, 0), (100, 10)]);
        let s = derive_streak(&h, &BTreeSet::new(), 100);
        assert_eq!(s.current, 1);
        assert_eq!(s.longest, 1);
    }

    #[test]
    fn test_longest_exceeds_current_after_break() {
        let h = history(&[(90, 10), (91, 10), (92, 10), (93, 10), (99, 10), (100, 10)]);
        let s = derive_streak(&h, &BTreeSet::new(), 100);
        assert_eq!(s.current, 2);
        assert_eq!(s.longest, 4);
    }

    #[test]
    fn test_longest_never_below_current() {
        let h = history(&[(97, 5), (98, 5), (99, 5), (100, 5)]);
        let s = derive_streak(&h, &BTreeSet::new(), 100);
        assert!(s.longest >= s.current);
    }
}
