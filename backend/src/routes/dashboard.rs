use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use chrono::Utc;

use crate::response::{json_ok, AppError};
use crate::routes::learner_id;
use crate::services::dashboard;
use crate::state::AppState;

pub async fn get_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let learner = learner_id(&headers)?;
    let summary = dashboard::summary(&state.engine(), &learner, Utc::now()).await?;
    Ok(json_ok(summary))
}
