use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use solquest_backend::config::Config;
use solquest_backend::logging;
use solquest_backend::routes;
use solquest_backend::state::AppState;
use solquest_backend::store::PgStore;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config.log_level);

    let state = match config.database_url.as_deref() {
        Some(url) => match PgStore::connect(url).await {
            Ok(store) => AppState::with_postgres(Arc::new(store)),
            Err(err) => {
                tracing::warn!(error = %err, "database unavailable, falling back to memory store");
                AppState::in_memory()
            }
        },
        None => {
            tracing::info!("no DATABASE_URL configured, using memory store");
            AppState::in_memory()
        }
    };

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr();
    tracing::info!(%addr, "solquest-backend listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind listener failed");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        tracing::error!(error = %err, "server error");
    }

    tracing::info!("shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
