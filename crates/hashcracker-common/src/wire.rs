use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a single shard, or of a merged task-level aggregate. The
/// tokens are uppercase on the wire to match the reference protocol.
///
/// Declaration order doubles as the merge lattice ordering (derived
/// `Ord`): `Error > InProgress > Ready > NotStarted`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    NotStarted,
    Ready,
    InProgress,
    Error,
}

/// A shard assigned to one worker for one task. Immutable once created.
/// Field names and casing match the manager/worker protocol.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub task_id: Uuid,
    pub target_hash: String,
    pub alphabet: String,
    pub max_length: usize,
    pub start_index: u64,
    pub end_index: u64,
}

/// Progress of a single shard, pushed by a worker to the manager and also
/// returned by the worker's own diagnostic progress route.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TaskProgress {
    pub task_id: Uuid,
    pub worker_id: Uuid,
    pub status: Status,
    pub iterations_done: u64,
    pub total_iterations: u64,
    pub result: Vec<String>,
}

/// Client-facing request to `POST /api/hash/crack`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CrackRequest {
    pub hash: String,
    pub max_length: usize,
}

/// Client-facing response to `POST /api/hash/crack`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CrackResponse {
    pub request_id: Uuid,
}

/// Client-facing response to `GET /api/hash/status`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: Status,
    pub progress: u32,
    pub data: Vec<String>,
}
