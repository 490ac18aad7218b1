//! XP/Level Calculator
//!
//! Level is always a pure function of lifetime XP so it can never drift from
//! the stored total. The curve is quadratic: reaching level L costs
//! `L^2 * 100` XP (0-99 -> level 0, 100-399 -> level 1, 400-899 -> level 2).

/// Named tiers, indexed by level. Levels past the last entry clamp to it.
pub const LEVEL_TITLES: [&str; 11] = [
    "Newcomer",
    "Apprentice",
    "Developer",
    "Builder",
    "Architect",
    "Expert",
    "Master",
    "Grandmaster",
    "Legend",
    "Mythic",
    "Transcendent",
];

const XP_PER_LEVEL_UNIT: u64 = 100;

/// Streak length at which the 1.5x multiplier kicks in.
pub const MULTIPLIER_WEEK_THRESHOLD: u32 = 7;
/// Streak length at which the 2x multiplier kicks in.
pub const MULTIPLIER_FORTNIGHT_THRESHOLD: u32 = 14;

/// Level for a lifetime XP total: `floor(sqrt(xp / 100))`.
pub fn level(xp: u64) -> u32 {
    isqrt(xp / XP_PER_LEVEL_UNIT) as u32
}

/// Total XP required to reach `level`. Exact inverse of [`level`]:
/// `level(xp_for_level(l)) == l` wherever the product fits in u64;
/// saturates past that.
pub fn xp_for_level(level: u32) -> u64 {
    let l = level as u64;
    (l * l).saturating_mul(XP_PER_LEVEL_UNIT)
}

/// Progress through the current level, rounded to a whole percent in [0, 100].
pub fn level_progress_percent(xp: u64) -> u8 {
    let current = level(xp);
    let base = xp_for_level(current);
    let next = xp_for_level(current + 1);

    // Unreachable for a quadratic curve (next - base = (2L+1)*100), but a
    // zero-width level must not divide by zero.
    if next == base {
        return 100;
    }

    let span = next - base;
    let into = xp.saturating_sub(base);
    let percent = (into * 100 + span / 2) / span;
    percent.min(100) as u8
}

/// XP still needed to reach the next level. Positive everywhere the curve
/// has a next threshold; zero only once the threshold saturates.
pub fn xp_to_next_level(xp: u64) -> u64 {
    xp_for_level(level(xp) + 1).saturating_sub(xp)
}

/// Display title for a level, clamped to the final tier.
pub fn level_title(level: u32) -> &'static str {
    let idx = (level as usize).min(LEVEL_TITLES.len() - 1);
    LEVEL_TITLES[idx]
}

/// Reward multiplier for a streak length: 2x from 14 days, 1.5x from 7.
pub fn streak_multiplier(streak_days: u32) -> f64 {
    if streak_days >= MULTIPLIER_FORTNIGHT_THRESHOLD {
        2.0
    } else if streak_days >= MULTIPLIER_WEEK_THRESHOLD {
        1.5
    } else {
        1.0
    }
}

/// Bonus XP on top of a base award: `floor(base * multiplier) - base`.
pub fn streak_bonus(base_xp: u64, streak_days: u32) -> u64 {
    let boosted = (base_xp as f64 * streak_multiplier(streak_days)).floor() as u64;
    boosted.saturating_sub(base_xp)
}

fn isqrt(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    // f64 sqrt as a starting guess, then fix up so the result is exact for
    // every u64 the leveling curve can produce.
    let mut root = (n as f64).sqrt() as u64;
    while (root + 1).checked_mul(root + 1).is_some_and(|sq| sq <= n) {
        root += 1;
    }
    while root * root > n {
        root -= 1;
    }
    root
}
