use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use chrono::Utc;
use serde::Deserialize;

use crate::response::{json_ok, AppError};
use crate::routes::learner_id;
use crate::services::streak::{FreezeOutcome, DEFAULT_WINDOW_DAYS};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    #[serde(default)]
    pub days: Option<u32>,
}

pub async fn get_state(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let learner = learner_id(&headers)?;
    let streak = state
        .streaks()
        .state(&learner, Utc::now().date_naive())
        .await?;
    Ok(json_ok(streak))
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let learner = learner_id(&headers)?;
    let days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS);
    let window = state
        .streaks()
        .calendar(&learner, Utc::now().date_naive(), days)
        .await?;
    Ok(json_ok(window))
}

pub async fn use_freeze(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let learner = learner_id(&headers)?;
    match state.streaks().use_freeze(&learner, Utc::now()).await? {
        FreezeOutcome::Applied(streak) => Ok(json_ok(streak)),
        FreezeOutcome::Exhausted => Err(AppError::insufficient("no streak freezes available")),
    }
}
