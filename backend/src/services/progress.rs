//! Lesson/course progress state machine
//!
//! Per-(course, lesson) records move not-started -> in-progress ->
//! completed, with completed terminal. The transition into completed is the
//! only place XP is awarded, and it happens exactly once per lesson however
//! often the UI retries the call. Course aggregates are always rebuilt in
//! full from the lesson records, never patched incrementally, so they
//! cannot drift from the per-lesson source of truth.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use solquest_algo::xp::streak_bonus;

use crate::content::{ContentProvider, LessonMeta};
use crate::services::judge::TestJudge;
use crate::services::streak::{StreakService, StreakState};
use crate::store::{AccountStore, ProgressStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LessonStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl LessonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => Self::Completed,
            "in-progress" => Self::InProgress,
            _ => Self::NotStarted,
        }
    }
}

/// Verdict for one challenge test case, as reported by the judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub test_id: String,
    pub name: String,
    pub passed: bool,
    /// Milliseconds.
    pub execution_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub lesson_id: String,
    pub course_slug: String,
    pub status: LessonStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Set exactly once, on the transition into completed.
    pub xp_awarded: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_results: Option<Vec<TestResult>>,
    /// Seconds, set by the caller.
    pub time_spent: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub course_slug: String,
    pub enrolled_at: DateTime<Utc>,
    pub lessons_completed: u32,
    pub total_lessons: u32,
    pub progress_percent: u8,
    pub total_xp_earned: u64,
    pub last_accessed_at: DateTime<Utc>,
    /// Set once when every lesson completes; never cleared afterwards, even
    /// if the course later gains lessons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// What a completion call produced. Repeat completions report zero XP.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub progress: LessonProgress,
    pub xp_awarded: u64,
    pub bonus_xp: u64,
    pub lifetime_xp: u64,
    pub streak: StreakState,
}

pub struct ProgressEngine {
    store: Arc<dyn ProgressStore>,
    content: Arc<dyn ContentProvider>,
    judge: Arc<dyn TestJudge>,
    streaks: Arc<StreakService>,
    accounts: Arc<dyn AccountStore>,
}

impl ProgressEngine {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        content: Arc<dyn ContentProvider>,
        judge: Arc<dyn TestJudge>,
        streaks: Arc<StreakService>,
        accounts: Arc<dyn AccountStore>,
    ) -> Self {
        Self {
            store,
            content,
            judge,
            streaks,
            accounts,
        }
    }

    pub fn streaks(&self) -> Arc<StreakService> {
        Arc::clone(&self.streaks)
    }

    pub async fn lesson(&self, course: &str, lesson: &str) -> Result<LessonMeta, EngineError> {
        self.content
            .lesson(course, lesson)
            .await
            .ok_or_else(|| EngineError::NotFound(format!("lesson {course}/{lesson}")))
    }

    pub async fn lesson_progress(
        &self,
        learner: &str,
        course: &str,
        lesson: &str,
    ) -> Result<Option<LessonProgress>, EngineError> {
        Ok(self.store.lesson_progress(learner, course, lesson).await?)
    }

    pub async fn course_progress(
        &self,
        learner: &str,
        course: &str,
    ) -> Result<Option<CourseProgress>, EngineError> {
        if self.content.course_lessons(course).await.is_none() {
            return Err(EngineError::NotFound(format!("course {course}")));
        }
        Ok(self.store.course_progress(learner, course).await?)
    }

    pub async fn all_course_progress(
        &self,
        learner: &str,
    ) -> Result<Vec<CourseProgress>, EngineError> {
        Ok(self.store.all_course_progress(learner).await?)
    }

    pub async fn lifetime_xp(&self, learner: &str) -> Result<u64, EngineError> {
        Ok(self.accounts.lifetime_xp(learner).await?)
    }

    /// Idempotent: an existing record (any status) comes back unchanged -
    /// `started_at` is never reset and a completed lesson never regresses.
    pub async fn start_lesson(
        &self,
        learner: &str,
        course: &str,
        lesson: &str,
        now: DateTime<Utc>,
    ) -> Result<LessonProgress, EngineError> {
        self.lesson(course, lesson).await?;

        if let Some(existing) = self.store.lesson_progress(learner, course, lesson).await? {
            return Ok(existing);
        }

        let record = LessonProgress {
            lesson_id: lesson.to_string(),
            course_slug: course.to_string(),
            status: LessonStatus::InProgress,
            started_at: Some(now),
            completed_at: None,
            xp_awarded: 0,
            saved_code: None,
            test_results: None,
            time_spent: 0,
        };
        self.store.put_lesson_progress(learner, &record).await?;
        self.recompute_course_progress(learner, course, now).await?;
        Ok(record)
    }

    /// Awards the lesson's XP exactly once. A repeat call is a defined
    /// no-op returning zero XP - the expected path when a client retries
    /// after a network hiccup, so it is not an error.
    pub async fn complete_lesson(
        &self,
        learner: &str,
        course: &str,
        lesson: &str,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, EngineError> {
        let meta = self.lesson(course, lesson).await?;
        let today = now.date_naive();

        let existing = self.store.lesson_progress(learner, course, lesson).await?;
        if let Some(existing) = existing.as_ref().filter(|p| p.status == LessonStatus::Completed) {
            return Ok(CompletionOutcome {
                progress: existing.clone(),
                xp_awarded: 0,
                bonus_xp: 0,
                lifetime_xp: self.accounts.lifetime_xp(learner).await?,
                streak: self.streaks.state(learner, today).await?,
            });
        }

        let reward = meta.xp_reward;
        let record = LessonProgress {
            lesson_id: lesson.to_string(),
            course_slug: course.to_string(),
            status: LessonStatus::Completed,
            // A skipped start_lesson gets an implicit start at completion.
            started_at: existing.as_ref().and_then(|p| p.started_at).or(Some(now)),
            completed_at: Some(now),
            xp_awarded: reward,
            saved_code: existing.as_ref().and_then(|p| p.saved_code.clone()),
            test_results: existing.as_ref().and_then(|p| p.test_results.clone()),
            time_spent: existing.as_ref().map(|p| p.time_spent).unwrap_or(0),
        };
        self.store.put_lesson_progress(learner, &record).await?;
        self.recompute_course_progress(learner, course, now).await?;

        // Base reward counts toward today's streak first; the multiplier
        // then applies to the streak that activity produced.
        let mut streak = self.streaks.record_activity(learner, today, reward).await?;
        let bonus = streak_bonus(reward, streak.current_streak);
        if bonus > 0 {
            streak = self.streaks.record_activity(learner, today, bonus).await?;
        }
        let lifetime_xp = self.accounts.add_xp(learner, reward + bonus).await?;

        tracing::info!(learner, course, lesson, reward, bonus, "lesson completed");

        Ok(CompletionOutcome {
            progress: record,
            xp_awarded: reward,
            bonus_xp: bonus,
            lifetime_xp,
            streak,
        })
    }

    /// Last-write-wins overwrite of the saved code. The progress record
    /// must already exist via start_lesson; auto-save never creates one.
    pub async fn auto_save_code(
        &self,
        learner: &str,
        course: &str,
        lesson: &str,
        code: String,
    ) -> Result<(), EngineError> {
        let mut record = self
            .store
            .lesson_progress(learner, course, lesson)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!("progress for {course}/{lesson} (start it first)"))
            })?;
        record.saved_code = Some(code);
        Ok(self.store.put_lesson_progress(learner, &record).await?)
    }

    pub async fn saved_code(
        &self,
        learner: &str,
        course: &str,
        lesson: &str,
    ) -> Result<Option<String>, EngineError> {
        Ok(self
            .store
            .lesson_progress(learner, course, lesson)
            .await?
            .and_then(|p| p.saved_code))
    }

    /// Runs the lesson's test cases through the judge and stores the
    /// verdicts on the progress record (overwriting any previous run). The
    /// engine records results; it never grades code itself.
    pub async fn run_tests(
        &self,
        learner: &str,
        course: &str,
        lesson: &str,
        code: &str,
    ) -> Result<Vec<TestResult>, EngineError> {
        let meta = self.lesson(course, lesson).await?;
        if meta.test_cases.is_empty() {
            return Ok(Vec::new());
        }

        let results = self.judge.judge(code, &meta.test_cases).await;

        if let Some(mut record) = self.store.lesson_progress(learner, course, lesson).await? {
            record.test_results = Some(results.clone());
            self.store.put_lesson_progress(learner, &record).await?;
        }
        Ok(results)
    }

    /// Caller-reported seconds; the engine does not accumulate time itself.
    pub async fn update_time_spent(
        &self,
        learner: &str,
        course: &str,
        lesson: &str,
        seconds: u64,
    ) -> Result<(), EngineError> {
        let mut record = self
            .store
            .lesson_progress(learner, course, lesson)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("progress for {course}/{lesson}")))?;
        record.time_spent = seconds;
        Ok(self.store.put_lesson_progress(learner, &record).await?)
    }

    /// Full rebuild of the course aggregate from the lesson records.
    pub async fn recompute_course_progress(
        &self,
        learner: &str,
        course: &str,
        now: DateTime<Utc>,
    ) -> Result<CourseProgress, EngineError> {
        let lessons = self
            .content
            .course_lessons(course)
            .await
            .ok_or_else(|| EngineError::NotFound(format!("course {course}")))?;
        let existing = self.store.course_progress(learner, course).await?;

        if lessons.is_empty() {
            // Nothing to aggregate over; leave any stored record untouched.
            return Ok(existing.unwrap_or(CourseProgress {
                course_slug: course.to_string(),
                enrolled_at: now,
                lessons_completed: 0,
                total_lessons: 0,
                progress_percent: 0,
                total_xp_earned: 0,
                last_accessed_at: now,
                completed_at: None,
            }));
        }

        let records = self.store.lesson_progress_for_course(learner, course).await?;

        let mut completed = 0u32;
        let mut total_xp = 0u64;
        let mut last_accessed: Option<DateTime<Utc>> = None;
        for lesson in &lessons {
            let Some(record) = records.iter().find(|r| r.lesson_id == lesson.id) else {
                continue;
            };
            if record.status == LessonStatus::Completed {
                completed += 1;
                total_xp += record.xp_awarded;
            }
            for ts in [record.started_at, record.completed_at].into_iter().flatten() {
                last_accessed = Some(last_accessed.map_or(ts, |prev| prev.max(ts)));
            }
        }

        let total = lessons.len() as u32;
        let percent = ((u64::from(completed) * 100 + u64::from(total) / 2) / u64::from(total)) as u8;
        let all_done = completed == total;

        let aggregate = CourseProgress {
            course_slug: course.to_string(),
            enrolled_at: existing.as_ref().map(|c| c.enrolled_at).unwrap_or(now),
            lessons_completed: completed,
            total_lessons: total,
            progress_percent: percent,
            total_xp_earned: total_xp,
            last_accessed_at: last_accessed.unwrap_or(now),
            completed_at: existing
                .as_ref()
                .and_then(|c| c.completed_at)
                .or(all_done.then_some(now)),
        };
        self.store.put_course_progress(learner, &aggregate).await?;
        Ok(aggregate)
    }
}
