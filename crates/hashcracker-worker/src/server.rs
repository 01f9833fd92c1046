use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use hashcracker_common::{Task, TaskProgress};
use tower_http::catch_panic::CatchPanicLayer;
use uuid::Uuid;

use crate::{error::Error, panic_handler::handle_panic, task_store::TaskStore};

pub fn router(task_store: Arc<TaskStore>) -> Router {
    Router::new()
        .route("/api/v1/tasks/", post(create_task))
        .route("/api/v1/tasks/:task_id/do", put(do_task))
        .route("/api/v1/tasks/:task_id", delete(delete_task))
        .route("/api/v1/tasks/:task_id/progress", get(task_progress))
        .route("/health", get(health))
        .with_state(task_store)
        .layer(CatchPanicLayer::custom(handle_panic))
}

async fn health() -> &'static str {
    "OK"
}

async fn create_task(State(store): State<Arc<TaskStore>>, Json(task): Json<Task>) -> Result<(), Error> {
    store.create_task(task)
}

async fn do_task(State(store): State<Arc<TaskStore>>, Path(task_id): Path<Uuid>) -> Result<(), Error> {
    store.do_task(task_id)
}

async fn delete_task(State(store): State<Arc<TaskStore>>, Path(task_id): Path<Uuid>) -> Result<(), Error> {
    store.delete_task(task_id);
    Ok(())
}

/// Operator diagnostic only (§6, §9 open questions): the manager's
/// aggregation is push-based and never calls this route.
async fn task_progress(
    State(store): State<Arc<TaskStore>>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskProgress>, Error> {
    Ok(Json(store.progress(task_id)?))
}
