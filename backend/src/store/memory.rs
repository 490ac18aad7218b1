//! In-memory store
//!
//! Per-learner state behind a single RwLock, which also serializes mutations
//! for a learner the way a per-learner transaction would in Postgres.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::services::progress::{CourseProgress, LessonProgress};
use crate::services::streak::StreakRecord;
use crate::store::{AccountStore, ProgressStore, StoreError, StreakStore};

type LessonKey = (String, String, String);
type CourseKey = (String, String);

#[derive(Default)]
pub struct MemoryStore {
    lessons: RwLock<HashMap<LessonKey, LessonProgress>>,
    courses: RwLock<HashMap<CourseKey, CourseProgress>>,
    streaks: RwLock<HashMap<String, StreakRecord>>,
    accounts: RwLock<HashMap<String, u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn lesson_progress(
        &self,
        learner: &str,
        course: &str,
        lesson: &str,
    ) -> Result<Option<LessonProgress>, StoreError> {
        let key = (learner.to_string(), course.to_string(), lesson.to_string());
        Ok(self.lessons.read().get(&key).cloned())
    }

    async fn put_lesson_progress(
        &self,
        learner: &str,
        record: &LessonProgress,
    ) -> Result<(), StoreError> {
        let key = (
            learner.to_string(),
            record.course_slug.clone(),
            record.lesson_id.clone(),
        );
        self.lessons.write().insert(key, record.clone());
        Ok(())
    }

    async fn lesson_progress_for_course(
        &self,
        learner: &str,
        course: &str,
    ) -> Result<Vec<LessonProgress>, StoreError> {
        Ok(self
            .lessons
            .read()
            .iter()
            .filter(|((l, c, _), _)| l == learner && c == course)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn course_progress(
        &self,
        learner: &str,
        course: &str,
    ) -> Result<Option<CourseProgress>, StoreError> {
        let key = (learner.to_string(), course.to_string());
        Ok(self.courses.read().get(&key).cloned())
    }

    async fn put_course_progress(
        &self,
        learner: &str,
        record: &CourseProgress,
    ) -> Result<(), StoreError> {
        let key = (learner.to_string(), record.course_slug.clone());
        self.courses.write().insert(key, record.clone());
        Ok(())
    }

    async fn all_course_progress(&self, learner: &str) -> Result<Vec<CourseProgress>, StoreError> {
        let mut records: Vec<CourseProgress> = self
            .courses
            .read()
            .iter()
            .filter(|((l, _), _)| l == learner)
            .map(|(_, record)| record.clone())
            .collect();
        records.sort_by(|a, b| a.course_slug.cmp(&b.course_slug));
        Ok(records)
    }
}

#[async_trait]
impl StreakStore for MemoryStore {
    async fn streak(&self, learner: &str) -> Result<Option<StreakRecord>, StoreError> {
        Ok(self.streaks.read().get(learner).cloned())
    }

    async fn put_streak(&self, learner: &str, record: &StreakRecord) -> Result<(), StoreError> {
        self.streaks.write().insert(learner.to_string(), record.clone());
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn lifetime_xp(&self, learner: &str) -> Result<u64, StoreError> {
        Ok(self.accounts.read().get(learner).copied().unwrap_or(0))
    }

    async fn add_xp(&self, learner: &str, amount: u64) -> Result<u64, StoreError> {
        let mut accounts = self.accounts.write();
        let total = accounts.entry(learner.to_string()).or_insert(0);
        *total += amount;
        Ok(*total)
    }
}
