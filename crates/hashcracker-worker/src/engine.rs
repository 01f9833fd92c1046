use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use hashcracker_common::{SearchSpace, Status, Task, TaskProgress};
use md5::{Digest, Md5};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

/// Candidates enumerated between atomic stores of `iterations_done`
/// (§9, engine progress batching): the hot loop shouldn't serialize on
/// an atomic store for every candidate. The final count stored when a
/// shard finishes is always exact, regardless of stride.
const PROGRESS_STRIDE: u64 = 256;

fn status_to_u8(status: Status) -> u8 {
    match status {
        Status::NotStarted => 0,
        Status::InProgress => 1,
        Status::Ready => 2,
        Status::Error => 3,
    }
}

fn u8_to_status(value: u8) -> Status {
    match value {
        0 => Status::NotStarted,
        1 => Status::InProgress,
        2 => Status::Ready,
        _ => Status::Error,
    }
}

/// Runs one shard's indexed enumeration (§4.6). `iterations_done` and
/// `status` are lock-free atomics; `matches` is guarded by a dedicated
/// mutex for append and snapshot, per §5's shared-resource model. Built
/// once per activated task and shared between the blocking enumeration
/// thread, the periodic notifier, and any diagnostic reader.
pub struct Engine {
    task_id: Uuid,
    worker_id: Uuid,
    start_index: u64,
    end_index: u64,
    iterations_done: AtomicU64,
    status: AtomicU8,
    matches: Mutex<Vec<String>>,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(worker_id: Uuid, task: &Task, cancel: CancellationToken) -> Self {
        Self {
            task_id: task.task_id,
            worker_id,
            start_index: task.start_index,
            end_index: task.end_index,
            iterations_done: AtomicU64::new(0),
            status: AtomicU8::new(status_to_u8(Status::NotStarted)),
            matches: Mutex::new(Vec::new()),
            cancel,
        }
    }

    pub fn total_iterations(&self) -> u64 {
        self.end_index - self.start_index
    }

    pub fn status(&self) -> Status {
        u8_to_status(self.status.load(Ordering::Relaxed))
    }

    /// A consistent-enough snapshot for the notifier to push: ordering
    /// across the three fields is not required (§5), only that each
    /// field individually reflects a recent observation.
    pub fn snapshot(&self) -> TaskProgress {
        TaskProgress {
            task_id: self.task_id,
            worker_id: self.worker_id,
            status: self.status(),
            iterations_done: self.iterations_done.load(Ordering::Relaxed),
            total_iterations: self.total_iterations(),
            result: self.matches.lock().clone(),
        }
    }

    /// Enumerates `[start_index, end_index)`, comparing each candidate's
    /// MD5 digest against `target_hash`. Never suspends on I/O; only
    /// checks the cancellation token between candidates (§5). Does not
    /// push progress itself — the caller owns the notifier lifecycle and
    /// the final synchronous push (§4.6 steps 5).
    pub fn run(&self, space: &SearchSpace, target_hash: &str) {
        self.status.store(status_to_u8(Status::InProgress), Ordering::Relaxed);
        let target_hash = target_hash.to_lowercase();

        let mut done = 0u64;
        for index in self.start_index..self.end_index {
            if self.cancel.is_cancelled() {
                // A cancelled shard reports ERROR, not READY, even if it
                // had finished iterating: simplicity over precision (§4.6).
                self.iterations_done.store(done, Ordering::Relaxed);
                self.status.store(status_to_u8(Status::Error), Ordering::Relaxed);
                return;
            }

            let Some(word) = space.decode(index) else {
                warn!(index, "index out of range for its own shard's search space");
                continue;
            };

            let digest = Md5::digest(word.as_bytes());
            let encoded = hex::encode(digest);
            if encoded == target_hash {
                self.matches.lock().push(word);
            }

            done += 1;
            if done % PROGRESS_STRIDE == 0 {
                self.iterations_done.store(done, Ordering::Relaxed);
            }
        }

        self.iterations_done.store(done, Ordering::Relaxed);
        self.status.store(status_to_u8(Status::Ready), Ordering::Relaxed);
    }
}
