//! Postgres store
//!
//! Plain sqlx queries with explicit upserts; one row per lesson record,
//! course aggregate, streak record, and learner account. The `no
//! double-award` guarantee assumes per-learner calls are serialized, which
//! holds because the engine is driven per session - the store itself does
//! not take advisory locks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::services::progress::{CourseProgress, LessonProgress, LessonStatus, TestResult};
use crate::services::streak::StreakRecord;
use crate::store::{AccountStore, ProgressStore, StoreError, StreakStore};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS lesson_progress (
        learner_id   TEXT NOT NULL,
        course_slug  TEXT NOT NULL,
        lesson_id    TEXT NOT NULL,
        status       TEXT NOT NULL,
        started_at   TIMESTAMPTZ,
        completed_at TIMESTAMPTZ,
        xp_awarded   BIGINT NOT NULL DEFAULT 0,
        saved_code   TEXT,
        test_results JSONB,
        time_spent   BIGINT NOT NULL DEFAULT 0,
        PRIMARY KEY (learner_id, course_slug, lesson_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS course_progress (
        learner_id        TEXT NOT NULL,
        course_slug       TEXT NOT NULL,
        enrolled_at       TIMESTAMPTZ NOT NULL,
        lessons_completed INT NOT NULL,
        total_lessons     INT NOT NULL,
        progress_percent  INT NOT NULL,
        total_xp_earned   BIGINT NOT NULL,
        last_accessed_at  TIMESTAMPTZ NOT NULL,
        completed_at      TIMESTAMPTZ,
        PRIMARY KEY (learner_id, course_slug)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS streak_state (
        learner_id        TEXT PRIMARY KEY,
        freezes_available INT NOT NULL,
        freeze_expires_at TIMESTAMPTZ,
        frozen_days       JSONB NOT NULL DEFAULT '[]',
        activity          JSONB NOT NULL DEFAULT '{}'
    )"#,
    r#"CREATE TABLE IF NOT EXISTS learner_accounts (
        learner_id  TEXT PRIMARY KEY,
        lifetime_xp BIGINT NOT NULL DEFAULT 0
    )"#,
];

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for PgStore {
    async fn lesson_progress(
        &self,
        learner: &str,
        course: &str,
        lesson: &str,
    ) -> Result<Option<LessonProgress>, StoreError> {
        let row = sqlx::query(
            r#"SELECT lesson_id, course_slug, status, started_at, completed_at,
                      xp_awarded, saved_code, test_results, time_spent
               FROM lesson_progress
               WHERE learner_id = $1 AND course_slug = $2 AND lesson_id = $3"#,
        )
        .bind(learner)
        .bind(course)
        .bind(lesson)
        .fetch_optional(&self.pool)
        .await?;

        row.map(lesson_row).transpose()
    }

    async fn put_lesson_progress(
        &self,
        learner: &str,
        record: &LessonProgress,
    ) -> Result<(), StoreError> {
        let test_results = record
            .test_results
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO lesson_progress
                   (learner_id, course_slug, lesson_id, status, started_at,
                    completed_at, xp_awarded, saved_code, test_results, time_spent)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               ON CONFLICT (learner_id, course_slug, lesson_id) DO UPDATE SET
                   status = EXCLUDED.status,
                   started_at = EXCLUDED.started_at,
                   completed_at = EXCLUDED.completed_at,
                   xp_awarded = EXCLUDED.xp_awarded,
                   saved_code = EXCLUDED.saved_code,
                   test_results = EXCLUDED.test_results,
                   time_spent = EXCLUDED.time_spent"#,
        )
        .bind(learner)
        .bind(&record.course_slug)
        .bind(&record.lesson_id)
        .bind(record.status.as_str())
        .bind(record.started_at)
        .bind(record.completed_at)
        .bind(record.xp_awarded as i64)
        .bind(&record.saved_code)
        .bind(test_results)
        .bind(record.time_spent as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn lesson_progress_for_course(
        &self,
        learner: &str,
        course: &str,
    ) -> Result<Vec<LessonProgress>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT lesson_id, course_slug, status, started_at, completed_at,
                      xp_awarded, saved_code, test_results, time_spent
               FROM lesson_progress
               WHERE learner_id = $1 AND course_slug = $2"#,
        )
        .bind(learner)
        .bind(course)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(lesson_row).collect()
    }

    async fn course_progress(
        &self,
        learner: &str,
        course: &str,
    ) -> Result<Option<CourseProgress>, StoreError> {
        let row = sqlx::query(
            r#"SELECT course_slug, enrolled_at, lessons_completed, total_lessons,
                      progress_percent, total_xp_earned, last_accessed_at, completed_at
               FROM course_progress
               WHERE learner_id = $1 AND course_slug = $2"#,
        )
        .bind(learner)
        .bind(course)
        .fetch_optional(&self.pool)
        .await?;

        row.map(course_row).transpose()
    }

    async fn put_course_progress(
        &self,
        learner: &str,
        record: &CourseProgress,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO course_progress
                   (learner_id, course_slug, enrolled_at, lessons_completed,
                    total_lessons, progress_percent, total_xp_earned,
                    last_accessed_at, completed_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               ON CONFLICT (learner_id, course_slug) DO UPDATE SET
                   lessons_completed = EXCLUDED.lessons_completed,
                   total_lessons = EXCLUDED.total_lessons,
                   progress_percent = EXCLUDED.progress_percent,
                   total_xp_earned = EXCLUDED.total_xp_earned,
                   last_accessed_at = EXCLUDED.last_accessed_at,
                   completed_at = EXCLUDED.completed_at"#,
        )
        .bind(learner)
        .bind(&record.course_slug)
        .bind(record.enrolled_at)
        .bind(record.lessons_completed as i32)
        .bind(record.total_lessons as i32)
        .bind(i32::from(record.progress_percent))
        .bind(record.total_xp_earned as i64)
        .bind(record.last_accessed_at)
        .bind(record.completed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn all_course_progress(&self, learner: &str) -> Result<Vec<CourseProgress>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT course_slug, enrolled_at, lessons_completed, total_lessons,
                      progress_percent, total_xp_earned, last_accessed_at, completed_at
               FROM course_progress
               WHERE learner_id = $1
               ORDER BY course_slug"#,
        )
        .bind(learner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(course_row).collect()
    }
}

#[async_trait]
impl StreakStore for PgStore {
    async fn streak(&self, learner: &str) -> Result<Option<StreakRecord>, StoreError> {
        let row = sqlx::query(
            r#"SELECT freezes_available, freeze_expires_at, frozen_days, activity
               FROM streak_state WHERE learner_id = $1"#,
        )
        .bind(learner)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let freezes: i32 = row.try_get("freezes_available")?;
        let freeze_expires_at: Option<DateTime<Utc>> = row.try_get("freeze_expires_at")?;
        let frozen_days: serde_json::Value = row.try_get("frozen_days")?;
        let activity: serde_json::Value = row.try_get("activity")?;

        Ok(Some(StreakRecord {
            freezes_available: freezes.max(0) as u32,
            freeze_expires_at,
            frozen_days: serde_json::from_value(frozen_days)
                .map_err(|e| StoreError(e.to_string()))?,
            activity: serde_json::from_value(activity).map_err(|e| StoreError(e.to_string()))?,
        }))
    }

    async fn put_streak(&self, learner: &str, record: &StreakRecord) -> Result<(), StoreError> {
        let frozen_days =
            serde_json::to_value(&record.frozen_days).map_err(|e| StoreError(e.to_string()))?;
        let activity =
            serde_json::to_value(&record.activity).map_err(|e| StoreError(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO streak_state
                   (learner_id, freezes_available, freeze_expires_at, frozen_days, activity)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (learner_id) DO UPDATE SET
                   freezes_available = EXCLUDED.freezes_available,
                   freeze_expires_at = EXCLUDED.freeze_expires_at,
                   frozen_days = EXCLUDED.frozen_days,
                   activity = EXCLUDED.activity"#,
        )
        .bind(learner)
        .bind(record.freezes_available as i32)
        .bind(record.freeze_expires_at)
        .bind(frozen_days)
        .bind(activity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn lifetime_xp(&self, learner: &str) -> Result<u64, StoreError> {
        let total: Option<i64> =
            sqlx::query_scalar(r#"SELECT lifetime_xp FROM learner_accounts WHERE learner_id = $1"#)
                .bind(learner)
                .fetch_optional(&self.pool)
                .await?;
        Ok(total.unwrap_or(0).max(0) as u64)
    }

    async fn add_xp(&self, learner: &str, amount: u64) -> Result<u64, StoreError> {
        let total: i64 = sqlx::query_scalar(
            r#"INSERT INTO learner_accounts (learner_id, lifetime_xp)
               VALUES ($1, $2)
               ON CONFLICT (learner_id) DO UPDATE SET
                   lifetime_xp = learner_accounts.lifetime_xp + EXCLUDED.lifetime_xp
               RETURNING lifetime_xp"#,
        )
        .bind(learner)
        .bind(amount as i64)
        .fetch_one(&self.pool)
        .await?;
        Ok(total.max(0) as u64)
    }
}

fn lesson_row(row: sqlx::postgres::PgRow) -> Result<LessonProgress, StoreError> {
    let status: String = row.try_get("status")?;
    let xp_awarded: i64 = row.try_get("xp_awarded")?;
    let time_spent: i64 = row.try_get("time_spent")?;
    let test_results: Option<serde_json::Value> = row.try_get("test_results")?;
    let test_results: Option<Vec<TestResult>> = test_results
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| StoreError(e.to_string()))?;

    Ok(LessonProgress {
        lesson_id: row.try_get("lesson_id")?,
        course_slug: row.try_get("course_slug")?,
        status: LessonStatus::parse(&status),
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        xp_awarded: xp_awarded.max(0) as u64,
        saved_code: row.try_get("saved_code")?,
        test_results,
        time_spent: time_spent.max(0) as u64,
    })
}

fn course_row(row: sqlx::postgres::PgRow) -> Result<CourseProgress, StoreError> {
    let lessons_completed: i32 = row.try_get("lessons_completed")?;
    let total_lessons: i32 = row.try_get("total_lessons")?;
    let progress_percent: i32 = row.try_get("progress_percent")?;
    let total_xp_earned: i64 = row.try_get("total_xp_earned")?;

    Ok(CourseProgress {
        course_slug: row.try_get("course_slug")?,
        enrolled_at: row.try_get("enrolled_at")?,
        lessons_completed: lessons_completed.max(0) as u32,
        total_lessons: total_lessons.max(0) as u32,
        progress_percent: progress_percent.clamp(0, 100) as u8,
        total_xp_earned: total_xp_earned.max(0) as u64,
        last_accessed_at: row.try_get("last_accessed_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}
