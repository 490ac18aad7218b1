pub mod config;
pub mod content;
pub mod logging;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// In-memory application for tests and database-less runs.
pub fn create_app() -> axum::Router {
    routes::router(AppState::in_memory())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
