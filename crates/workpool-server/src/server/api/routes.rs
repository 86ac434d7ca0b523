use crate::server::api::handler::{
    add_workers, get_stats, health, remove_workers, send_messages, stop_all,
};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use core::time::Duration;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use workpool::WorkerPool;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<WorkerPool>,
}

/// Builds the control API router over `pool`.
pub fn router(pool: Arc<WorkerPool>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/workers/add/{count}", post(add_workers))
        .route("/workers/remove/{count}", post(remove_workers))
        .route("/send", post(send_messages))
        .route("/stats", get(get_stats))
        .route("/stop", post(stop_all))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { pool })
}

/// CORS policy for the browser dashboard served from `origin`.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(Duration::from_secs(12 * 60 * 60))
}
