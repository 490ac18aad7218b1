use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::response::{json_ok, AppError};
use crate::routes::learner_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSaveRequest {
    pub code: String,
    /// Client-side save time; informational only. Persistence order is
    /// last-write-wins by arrival.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTestsRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSpentRequest {
    pub seconds: u64,
}

pub async fn get_lesson(
    State(state): State<AppState>,
    Path((course, lesson)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let meta = state.engine().lesson(&course, &lesson).await?;
    Ok(json_ok(meta))
}

pub async fn get_lesson_progress(
    State(state): State<AppState>,
    Path((course, lesson)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let learner = learner_id(&headers)?;
    let progress = state
        .engine()
        .lesson_progress(&learner, &course, &lesson)
        .await?;
    Ok(json_ok(progress))
}

pub async fn get_course_progress(
    State(state): State<AppState>,
    Path(course): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let learner = learner_id(&headers)?;
    let progress = state.engine().course_progress(&learner, &course).await?;
    Ok(json_ok(progress))
}

pub async fn start_lesson(
    State(state): State<AppState>,
    Path((course, lesson)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let learner = learner_id(&headers)?;
    let record = state
        .engine()
        .start_lesson(&learner, &course, &lesson, Utc::now())
        .await?;
    Ok(json_ok(record))
}

pub async fn complete_lesson(
    State(state): State<AppState>,
    Path((course, lesson)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let learner = learner_id(&headers)?;
    let outcome = state
        .engine()
        .complete_lesson(&learner, &course, &lesson, Utc::now())
        .await?;
    Ok(json_ok(outcome))
}

pub async fn auto_save_code(
    State(state): State<AppState>,
    Path((course, lesson)): Path<(String, String)>,
    headers: HeaderMap,
    Json(request): Json<AutoSaveRequest>,
) -> Result<Response, AppError> {
    let learner = learner_id(&headers)?;
    if let Some(saved_at) = request.timestamp {
        tracing::debug!(%saved_at, course, lesson, "auto-save received");
    }
    state
        .engine()
        .auto_save_code(&learner, &course, &lesson, request.code)
        .await?;
    Ok(json_ok(serde_json::json!({ "saved": true })))
}

pub async fn get_saved_code(
    State(state): State<AppState>,
    Path((course, lesson)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let learner = learner_id(&headers)?;
    let code = state.engine().saved_code(&learner, &course, &lesson).await?;
    Ok(json_ok(serde_json::json!({ "code": code })))
}

pub async fn run_tests(
    State(state): State<AppState>,
    Path((course, lesson)): Path<(String, String)>,
    headers: HeaderMap,
    Json(request): Json<RunTestsRequest>,
) -> Result<Response, AppError> {
    let learner = learner_id(&headers)?;
    let results = state
        .engine()
        .run_tests(&learner, &course, &lesson, &request.code)
        .await?;
    Ok(json_ok(results))
}

pub async fn update_time_spent(
    State(state): State<AppState>,
    Path((course, lesson)): Path<(String, String)>,
    headers: HeaderMap,
    Json(request): Json<TimeSpentRequest>,
) -> Result<Response, AppError> {
    let learner = learner_id(&headers)?;
    state
        .engine()
        .update_time_spent(&learner, &course, &lesson, request.seconds)
        .await?;
    Ok(json_ok(serde_json::json!({ "updated": true })))
}
