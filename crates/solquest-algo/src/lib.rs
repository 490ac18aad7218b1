//! # solquest-algo - progression algorithms for SolQuest
//!
//! Pure-Rust implementations of the gamification math used by the SolQuest
//! learning backend:
//!
//! - **XP/Level Calculator** - square-root leveling curve, level titles,
//!   progress-to-next-level, streak reward multipliers
//! - **Streak Derivation** - current/longest streak from a day-keyed
//!   activity history, including freeze-bridged gaps
//!
//! ## Design goals
//!
//! - **Pure** - no I/O, no clocks, no hidden state; callers pass "today" in
//! - **Deterministic** - level and streak are always projections of stored
//!   facts (lifetime XP, per-day activity), never stored independently
//! - **Fully tested** - every formula and edge case has unit tests
//!
//! ## Modules
//!
//! - [`xp`] - leveling formula, titles, multipliers
//! - [`streak`] - streak derivation over epoch-day keys

pub mod streak;
pub mod xp;

pub use streak::{derive_streak, StreakSummary};
pub use xp::{
    level, level_progress_percent, level_title, streak_bonus, streak_multiplier, xp_for_level,
    xp_to_next_level,
};
