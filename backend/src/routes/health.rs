use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/info", get(info))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    store: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthInfoResponse {
    service: &'static str,
    version: String,
    start_time: String,
    uptime: u64,
}

async fn root(State(state): State<AppState>) -> Response {
    Json(HealthResponse {
        status: "ok",
        store: if state.database_connected() {
            "postgres"
        } else {
            "memory"
        },
        timestamp: Utc::now().to_rfc3339(),
    })
    .into_response()
}

async fn live() -> Response {
    "ok".into_response()
}

async fn info(State(state): State<AppState>) -> Response {
    let start_time = DateTime::<Utc>::from(state.started_at_system()).to_rfc3339();
    Json(HealthInfoResponse {
        service: "solquest-backend",
        version: env!("CARGO_PKG_VERSION").to_string(),
        start_time,
        uptime: state.uptime_seconds(),
    })
    .into_response()
}
