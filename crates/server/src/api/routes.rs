use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{cleanup, downloads, handlers, sessions, usage};
use crate::state::AppState;

/// Largest accepted upload. Uncompressed WAV runs about 10 MB per minute,
/// so this covers a full-length track with headroom.
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Separation sessions
        .route("/process", post(sessions::process))
        .route("/session/{session_id}/preview", get(sessions::preview))
        .route(
            "/session/{session_id}/stem/{stem_name}",
            get(sessions::get_stem),
        )
        .route("/session/{session_id}", delete(sessions::delete_session))
        // Downloads (converted stems / mixdown)
        .route("/download/stems/{session_id}", post(downloads::download_stems))
        .route(
            "/download/mixdown/{session_id}",
            post(downloads::download_mixdown),
        )
        // Quota and retention
        .route("/usage", get(usage::get_usage))
        .route("/cleanup", post(cleanup::trigger_cleanup))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(Arc::clone(&state));

    // Prometheus scrape endpoint stays outside the authenticated API surface
    let metrics_route = Router::new()
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(metrics_route)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
