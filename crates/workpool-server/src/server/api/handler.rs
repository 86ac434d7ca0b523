//! Route handlers.
//!
//! Each handler is a thin translation between HTTP and one or more
//! synchronous [`WorkerPool`](workpool::WorkerPool) calls; none of them
//! awaits on the pool.

use crate::server::{
    api::{error::ApiError, routes::AppState},
    telemetry::{
        increment_messages_accepted, increment_messages_rejected, increment_workers_added,
        increment_workers_removed,
    },
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use workpool::{PoolStats, WorkerId};

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub messages: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AddWorkersResponse {
    pub message: &'static str,
    pub count: usize,
    pub ids: Vec<WorkerId>,
}

#[derive(Debug, Serialize)]
pub struct RemoveWorkersResponse {
    pub message: &'static str,
    pub requested_to_remove: usize,
    pub actually_removed: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Alias of `active_workers`; the dashboard reads this key.
    pub workers: usize,
    #[serde(flatten)]
    pub stats: PoolStats,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub sent: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub message: &'static str,
    pub stopped: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Parses a `{count}` path segment, which must be a positive integer.
fn parse_count(raw: &str) -> Result<usize, ApiError> {
    match raw.parse::<usize>() {
        Ok(count) if count >= 1 => Ok(count),
        _ => Err(ApiError::InvalidCount {
            raw: raw.to_string(),
        }),
    }
}

/// `POST /workers/add/{count}`
pub async fn add_workers(
    State(state): State<AppState>,
    Path(count): Path<String>,
) -> Result<Json<AddWorkersResponse>, ApiError> {
    let count = parse_count(&count)?;
    let ids = state.pool.add_workers(count);
    increment_workers_added(ids.len() as u64);

    tracing::info!(requested = count, added = ids.len(), "added workers via API");
    Ok(Json(AddWorkersResponse {
        message: "workers added",
        count: ids.len(),
        ids,
    }))
}

/// `POST /workers/remove/{count}`
///
/// Removes up to `count` workers; asking for more than are running is not an
/// error.
pub async fn remove_workers(
    State(state): State<AppState>,
    Path(count): Path<String>,
) -> Result<Json<RemoveWorkersResponse>, ApiError> {
    let count = parse_count(&count)?;
    let removed = state.pool.remove_workers(count);
    increment_workers_removed(removed as u64);

    tracing::info!(requested = count, removed, "removed workers via API");
    Ok(Json(RemoveWorkersResponse {
        message: "workers removed",
        requested_to_remove: count,
        actually_removed: removed,
    }))
}

/// `POST /send`
///
/// The body is decoded as JSON regardless of `Content-Type`. Messages the
/// queue refuses are dropped and left out of `sent`.
pub async fn send_messages(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SendResponse>, ApiError> {
    let request: SendRequest =
        serde_json::from_slice(&body).map_err(|err| ApiError::InvalidJson {
            reason: err.to_string(),
        })?;

    let total = request.messages.len();
    let sent = request
        .messages
        .into_iter()
        .map(|msg| state.pool.send(msg))
        .filter(|accepted| *accepted)
        .count();

    increment_messages_accepted(sent as u64);
    increment_messages_rejected((total - sent) as u64);

    tracing::info!(sent, total, "sent messages via API");
    Ok(Json(SendResponse { sent, total }))
}

/// `GET /stats`
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.pool.stats();
    Json(StatsResponse {
        workers: stats.active_workers,
        stats,
    })
}

/// `POST /stop`
pub async fn stop_all(State(state): State<AppState>) -> Json<StopResponse> {
    let stopped = state.pool.stop_all();
    increment_workers_removed(stopped as u64);

    tracing::info!(stopped, "stopped all workers via API");
    Json(StopResponse {
        message: "all workers stopped",
        stopped,
    })
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
