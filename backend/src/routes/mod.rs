mod dashboard;
mod health;
mod learning;
mod streaks;

use axum::http::HeaderMap;
use axum::routing::{get, post, put};
use axum::Router;

use crate::response::AppError;
use crate::state::AppState;

/// Header carrying the learner identity. Session handling is out of scope
/// here; the API layer in front of this service resolves the session and
/// forwards the learner id.
pub const LEARNER_HEADER: &str = "x-learner-id";

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest("/api", api_router())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/courses/:course/lessons/:lesson",
            get(learning::get_lesson),
        )
        .route(
            "/courses/:course/lessons/:lesson/progress",
            get(learning::get_lesson_progress),
        )
        .route(
            "/courses/:course/lessons/:lesson/start",
            post(learning::start_lesson),
        )
        .route(
            "/courses/:course/lessons/:lesson/complete",
            post(learning::complete_lesson),
        )
        .route(
            "/courses/:course/lessons/:lesson/code",
            get(learning::get_saved_code).put(learning::auto_save_code),
        )
        .route(
            "/courses/:course/lessons/:lesson/tests",
            post(learning::run_tests),
        )
        .route(
            "/courses/:course/lessons/:lesson/time",
            put(learning::update_time_spent),
        )
        .route("/courses/:course/progress", get(learning::get_course_progress))
        .route("/streak", get(streaks::get_state))
        .route("/streak/calendar", get(streaks::get_calendar))
        .route("/streak/freeze", post(streaks::use_freeze))
        .route("/dashboard", get(dashboard::get_summary))
}

pub fn learner_id(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(LEARNER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::unauthorized("missing learner identity"))
}
