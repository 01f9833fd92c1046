use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use hashcracker_common::{CrackRequest, CrackResponse, StatusResponse, TaskProgress};
use serde::Deserialize;
use tower_http::catch_panic::CatchPanicLayer;
use uuid::Uuid;

use crate::{error::Error, panic_handler::handle_panic, service::ManagerService};

pub fn router(service: Arc<ManagerService>) -> Router {
    Router::new()
        .route("/api/hash/crack", post(crack))
        .route("/api/hash/status", get(status))
        .route("/api/tasks/progress", post(push_progress))
        .route("/api/hash/register-worker", get(register_worker))
        .route("/health", get(health))
        .with_state(service)
        .layer(CatchPanicLayer::custom(handle_panic))
}

async fn health() -> &'static str {
    "OK"
}

async fn crack(
    State(service): State<Arc<ManagerService>>,
    Json(req): Json<CrackRequest>,
) -> Result<Json<CrackResponse>, Error> {
    let request_id = service.submit(req.hash, req.max_length).await?;
    Ok(Json(CrackResponse { request_id }))
}

#[derive(Deserialize)]
struct StatusQuery {
    #[serde(rename = "requestId")]
    request_id: Uuid,
}

async fn status(
    State(service): State<Arc<ManagerService>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, Error> {
    let response = service.task_progress(query.request_id)?;
    Ok(Json(response))
}

async fn push_progress(
    State(service): State<Arc<ManagerService>>,
    Json(progress): Json<TaskProgress>,
) -> Result<(), Error> {
    service.update_progress(progress)
}

/// A worker's own `Host` header is never trusted (a worker could be
/// behind a proxy); the observed TCP peer address combined with the
/// `X-Worker-Port` header is the only authoritative source for the
/// address the manager will dial back.
async fn register_worker(
    State(service): State<Arc<ManagerService>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, Error> {
    let port: u16 = headers
        .get("X-Worker-Port")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::InvalidInput("missing or invalid X-Worker-Port header".to_string()))?;

    let address = format!("{}:{port}", remote.ip());
    let worker_id = service.register_worker(address);
    Ok(Json(serde_json::json!({ "id": worker_id })))
}
