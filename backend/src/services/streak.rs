//! Streak tracking
//!
//! Stores the per-day activity history (UTC day -> XP) and consumed
//! freezes; current/longest streak and the active-today flag are derived on
//! every read via `solquest_algo::streak`, never persisted. All day keys
//! are UTC calendar days - callers resolve "now" and pass dates in.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use solquest_algo::streak::derive_streak;
use solquest_algo::xp::streak_multiplier;

use crate::store::{StoreError, StreakStore};

/// Freezes granted to a brand-new learner.
const INITIAL_FREEZES: u32 = 2;

const FREEZE_DURATION_HOURS: i64 = 24;

/// Default calendar window: five full weeks.
pub const DEFAULT_WINDOW_DAYS: u32 = 35;
const MAX_WINDOW_DAYS: u32 = 366;

/// Persisted streak facts. Derived figures are never written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    pub freezes_available: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freeze_expires_at: Option<DateTime<Utc>>,
    /// Days bridged by a consumed freeze.
    pub frozen_days: BTreeSet<NaiveDate>,
    /// XP earned per UTC day. Append-only per key; a day's value only grows.
    pub activity: BTreeMap<NaiveDate, u64>,
}

impl Default for StreakRecord {
    fn default() -> Self {
        Self {
            freezes_available: INITIAL_FREEZES,
            freeze_expires_at: None,
            frozen_days: BTreeSet::new(),
            activity: BTreeMap::new(),
        }
    }
}

/// Wire representation of a learner's streak.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub active_today: bool,
    pub multiplier: f64,
    pub freezes_available: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freeze_expires_at: Option<DateTime<Utc>>,
    pub activity_history: BTreeMap<NaiveDate, u64>,
}

/// One cell of the activity calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub xp: u64,
    pub is_today: bool,
    pub is_future: bool,
}

/// Outcome of a freeze request. Exhaustion is an expected result the UI
/// handles, not an error.
#[derive(Debug, Clone)]
pub enum FreezeOutcome {
    Applied(StreakState),
    Exhausted,
}

pub struct StreakService {
    store: Arc<dyn StreakStore>,
}

impl StreakService {
    pub fn new(store: Arc<dyn StreakStore>) -> Self {
        Self { store }
    }

    pub async fn state(&self, learner: &str, today: NaiveDate) -> Result<StreakState, StoreError> {
        let record = self.load(learner).await?;
        Ok(project(&record, today))
    }

    /// Accumulates XP into `day` and returns the recomputed streak. A day's
    /// total only ever grows.
    pub async fn record_activity(
        &self,
        learner: &str,
        day: NaiveDate,
        xp: u64,
    ) -> Result<StreakState, StoreError> {
        let mut record = self.load(learner).await?;
        *record.activity.entry(day).or_insert(0) += xp;
        self.store.put_streak(learner, &record).await?;
        Ok(project(&record, day))
    }

    /// Consumes a freeze covering the current UTC day. This is a same-day
    /// safety net: once a day has lapsed unprotected, the streak is gone
    /// and a freeze cannot repair it retroactively.
    pub async fn use_freeze(
        &self,
        learner: &str,
        now: DateTime<Utc>,
    ) -> Result<FreezeOutcome, StoreError> {
        let mut record = self.load(learner).await?;
        let today = now.date_naive();

        // Today is already covered; a repeat request must not burn a
        // second freeze on the same day.
        if record.frozen_days.contains(&today) {
            return Ok(FreezeOutcome::Applied(project(&record, today)));
        }
        if record.freezes_available == 0 {
            return Ok(FreezeOutcome::Exhausted);
        }

        record.freezes_available -= 1;
        record.freeze_expires_at = Some(now + Duration::hours(FREEZE_DURATION_HOURS));
        record.frozen_days.insert(today);
        self.store.put_streak(learner, &record).await?;

        tracing::info!(learner, remaining = record.freezes_available, "streak freeze consumed");
        Ok(FreezeOutcome::Applied(project(&record, today)))
    }

    /// Fixed window `[today - (days-1), today]` for the heatmap. Days past
    /// today are flagged and always rendered as zero, whatever the stored
    /// data says.
    pub async fn calendar(
        &self,
        learner: &str,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<CalendarDay>, StoreError> {
        let days = days.clamp(1, MAX_WINDOW_DAYS);
        let record = self.load(learner).await?;

        let mut window = Vec::with_capacity(days as usize);
        for offset in (0..days as i64).rev() {
            let date = today - Duration::days(offset);
            let is_future = date > today;
            window.push(CalendarDay {
                date,
                xp: if is_future {
                    0
                } else {
                    record.activity.get(&date).copied().unwrap_or(0)
                },
                is_today: date == today,
                is_future,
            });
        }
        Ok(window)
    }

    async fn load(&self, learner: &str) -> Result<StreakRecord, StoreError> {
        Ok(self.store.streak(learner).await?.unwrap_or_default())
    }
}

/// Epoch-day key for the pure derivation (days since 1970-01-01 UTC).
fn epoch_day(date: NaiveDate) -> i64 {
    const UNIX_EPOCH_CE_DAYS: i64 = 719_163;
    i64::from(date.num_days_from_ce()) - UNIX_EPOCH_CE_DAYS
}

fn project(record: &StreakRecord, today: NaiveDate) -> StreakState {
    let history: BTreeMap<i64, u64> = record
        .activity
        .iter()
        .map(|(&date, &xp)| (epoch_day(date), xp))
        .collect();
    let frozen: BTreeSet<i64> = record.frozen_days.iter().map(|&d| epoch_day(d)).collect();
    let summary = derive_streak(&history, &frozen, epoch_day(today));

    StreakState {
        current_streak: summary.current,
        longest_streak: summary.longest,
        active_today: summary.active_today,
        multiplier: streak_multiplier(summary.current),
        freezes_available: record.freezes_available,
        freeze_expires_at: record.freeze_expires_at,
        activity_history: record.activity.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> StreakService {
        StreakService::new(Arc::new(MemoryStore::new()))
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_epoch_day_matches_unix_epoch() {
        assert_eq!(epoch_day(date("1970-01-01")), 0);
        assert_eq!(epoch_day(date("1970-01-02")), 1);
        assert_eq!(epoch_day(date("2026-01-01")), 20_454);
    }

    #[tokio::test]
    async fn test_new_learner_defaults() {
        let svc = service();
        let state = svc.state("learner-1", date("2026-08-29")).await.unwrap();
        assert_eq!(state.current_streak, 0);
        assert_eq!(state.longest_streak, 0);
        assert_eq!(state.freezes_available, 2);
        assert!(!state.active_today);
    }

    #[tokio::test]
    async fn test_record_activity_accumulates() {
        let svc = service();
        let today = date("2026-08-29");
        svc.record_activity("l", today, 50).await.unwrap();
        let state = svc.record_activity("l", today, 25).await.unwrap();
        assert_eq!(state.activity_history.get(&today), Some(&75));
        assert!(state.active_today);
        assert_eq!(state.current_streak, 1);
    }

    #[tokio::test]
    async fn test_longest_never_below_current() {
        let svc = service();
        let mut day = date("2026-08-01");
        for _ in 0..10 {
            let state = svc.record_activity("l", day, 10).await.unwrap();
            assert!(state.longest_streak >= state.current_streak);
            day += Duration::days(1);
        }
        let state = svc.state("l", day - Duration::days(1)).await.unwrap();
        assert_eq!(state.current_streak, 10);
        assert_eq!(state.longest_streak, 10);
    }

    fn noon(s: &str) -> DateTime<Utc> {
        date(s).and_hms_opt(12, 0, 0).unwrap().and_utc()
    }

    #[tokio::test]
    async fn test_freeze_consumption_and_exhaustion() {
        let svc = service();

        let outcome = svc.use_freeze("l", noon("2026-08-25")).await.unwrap();
        assert!(matches!(outcome, FreezeOutcome::Applied(_)));
        let outcome = svc.use_freeze("l", noon("2026-08-26")).await.unwrap();
        let FreezeOutcome::Applied(state) = outcome else {
            panic!("second freeze should apply");
        };
        assert_eq!(state.freezes_available, 0);
        assert!(state.freeze_expires_at.is_some());

        let outcome = svc.use_freeze("l", noon("2026-08-27")).await.unwrap();
        assert!(matches!(outcome, FreezeOutcome::Exhausted));
    }

    #[tokio::test]
    async fn test_repeat_freeze_same_day_is_a_no_op() {
        let svc = service();
        let now = noon("2026-08-25");

        let FreezeOutcome::Applied(first) = svc.use_freeze("l", now).await.unwrap() else {
            panic!("first freeze should apply");
        };
        assert_eq!(first.freezes_available, 1);

        // Same day again: today is already covered, nothing is consumed.
        let FreezeOutcome::Applied(repeat) = svc.use_freeze("l", now).await.unwrap() else {
            panic!("repeat freeze should still report the covered day");
        };
        assert_eq!(repeat.freezes_available, 1);

        // Even a learner out of freezes keeps coverage for a day already
        // frozen.
        let later = svc.use_freeze("l", noon("2026-08-26")).await.unwrap();
        assert!(matches!(later, FreezeOutcome::Applied(_)));
        let again = svc.use_freeze("l", noon("2026-08-25")).await.unwrap();
        assert!(matches!(again, FreezeOutcome::Applied(_)));
    }

    #[tokio::test]
    async fn test_freeze_bridges_missed_day() {
        let svc = service();
        let d1 = date("2026-08-25");
        svc.record_activity("l", d1, 10).await.unwrap();
        svc.record_activity("l", d1 + Duration::days(1), 10).await.unwrap();

        // Freeze consumed on the 27th, no activity that day.
        let frozen_noon = DateTime::parse_from_rfc3339("2026-08-27T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        svc.use_freeze("l", frozen_noon).await.unwrap();

        let state = svc
            .record_activity("l", date("2026-08-28"), 10)
            .await
            .unwrap();
        assert_eq!(state.current_streak, 3);
    }

    #[tokio::test]
    async fn test_calendar_window_shape() {
        let svc = service();
        let today = date("2026-08-29");
        svc.record_activity("l", today, 120).await.unwrap();

        let window = svc.calendar("l", today, DEFAULT_WINDOW_DAYS).await.unwrap();
        assert_eq!(window.len(), 35);
        assert_eq!(window.first().unwrap().date, today - Duration::days(34));

        let last = window.last().unwrap();
        assert_eq!(last.date, today);
        assert!(last.is_today);
        assert!(!last.is_future);
        assert_eq!(last.xp, 120);
        assert!(window.iter().all(|d| !d.is_future));
    }
}
