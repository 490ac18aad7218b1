//! Dashboard aggregation
//!
//! Read-only projection for the home screen: lifetime XP with every derived
//! leveling figure, the streak state, and all course aggregates. Level and
//! title are computed here on read - the account stores XP as the sole
//! fact.

use chrono::{DateTime, Utc};
use serde::Serialize;

use solquest_algo::xp;

use crate::services::progress::{CourseProgress, EngineError, ProgressEngine};
use crate::services::streak::StreakState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_xp: u64,
    pub level: u32,
    pub level_title: &'static str,
    pub level_progress: u8,
    pub xp_to_next_level: u64,
    pub streak: StreakState,
    pub courses: Vec<CourseProgress>,
}

pub async fn summary(
    engine: &ProgressEngine,
    learner: &str,
    now: DateTime<Utc>,
) -> Result<DashboardSummary, EngineError> {
    let total_xp = engine.lifetime_xp(learner).await?;
    let level = xp::level(total_xp);
    let streak = engine.streaks().state(learner, now.date_naive()).await?;
    let courses = engine.all_course_progress(learner).await?;

    Ok(DashboardSummary {
        total_xp,
        level,
        level_title: xp::level_title(level),
        level_progress: xp::level_progress_percent(total_xp),
        xp_to_next_level: xp::xp_to_next_level(total_xp),
        streak,
        courses,
    })
}
