use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::debug;

use super::{handlers, jobs, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config().server.max_upload_mb as usize * 1024 * 1024;
    let storage = state.storage().clone();

    let app = Router::new()
        // Service
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/status", get(handlers::get_status))
        .route("/metrics", get(handlers::metrics))
        // Jobs
        .route("/process-podcast", post(jobs::process_podcast))
        .route("/process-video", post(jobs::process_video))
        .route("/job/{id}", get(jobs::get_job))
        .route("/jobs", get(jobs::list_jobs))
        .with_state(state);

    // Clips are only served locally when the prefix is a path on this server.
    let app = if storage.public_url_prefix.starts_with('/') {
        let prefix = storage.public_url_prefix.trim_end_matches('/');
        let clips = ServeDir::new(&storage.output_dir);
        debug!(prefix = %prefix, dir = %storage.output_dir.display(), "Serving clips");
        if prefix.is_empty() {
            app.fallback_service(clips)
        } else {
            app.nest_service(prefix, clips)
        }
    } else {
        app
    };

    app.layer(middleware::from_fn(metrics_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
