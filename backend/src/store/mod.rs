//! Persistence boundary
//!
//! The engine never touches storage directly; it goes through these traits
//! so a request-scoped fake can stand in during tests. All records are
//! scoped to a single learner. `MemoryStore` backs tests and database-less
//! deployments, `PgStore` is the durable Postgres implementation.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::services::progress::{CourseProgress, LessonProgress};
use crate::services::streak::StreakRecord;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Opaque failure from the persistence collaborator. Propagated to the
/// caller without retries; retry policy lives below this layer.
#[derive(Debug, Clone, thiserror::Error)]
#[error("storage error: {0}")]
pub struct StoreError(pub String);

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError(err.to_string())
    }
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn lesson_progress(
        &self,
        learner: &str,
        course: &str,
        lesson: &str,
    ) -> Result<Option<LessonProgress>, StoreError>;

    async fn put_lesson_progress(
        &self,
        learner: &str,
        record: &LessonProgress,
    ) -> Result<(), StoreError>;

    /// Every lesson record the learner has for one course.
    async fn lesson_progress_for_course(
        &self,
        learner: &str,
        course: &str,
    ) -> Result<Vec<LessonProgress>, StoreError>;

    async fn course_progress(
        &self,
        learner: &str,
        course: &str,
    ) -> Result<Option<CourseProgress>, StoreError>;

    async fn put_course_progress(
        &self,
        learner: &str,
        record: &CourseProgress,
    ) -> Result<(), StoreError>;

    async fn all_course_progress(&self, learner: &str) -> Result<Vec<CourseProgress>, StoreError>;
}

#[async_trait]
pub trait StreakStore: Send + Sync {
    async fn streak(&self, learner: &str) -> Result<Option<StreakRecord>, StoreError>;

    async fn put_streak(&self, learner: &str, record: &StreakRecord) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Lifetime XP total; zero for an unknown learner.
    async fn lifetime_xp(&self, learner: &str) -> Result<u64, StoreError>;

    /// Credits XP and returns the new lifetime total.
    async fn add_xp(&self, learner: &str, amount: u64) -> Result<u64, StoreError>;
}
