use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use hashcracker_common::{SearchSpace, Status, Task, TaskProgress};
use lru::LruCache;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{engine::Engine, error::Error, notifier::Notifier};

enum TaskState {
    Accepted,
    Running {
        cancel: CancellationToken,
        engine: Arc<Engine>,
    },
}

struct TaskRecord {
    task: Task,
    state: TaskState,
    touched_at: Instant,
}

/// Holds accepted-but-inactive and active tasks, bounded by
/// `max_parallel` (§4.5). An `lru::LruCache` tracks recency so the TTL
/// reaper evicts the least-recently-touched abandoned tasks first; this
/// is the optional cache policy the spec recommends, not part of the
/// core create/do/delete semantics.
pub struct TaskStore {
    worker_id: Uuid,
    max_parallel: usize,
    ttl: Duration,
    notifier: Arc<Notifier>,
    tasks: Mutex<LruCache<Uuid, TaskRecord>>,
}

impl TaskStore {
    pub fn new(worker_id: Uuid, max_parallel: usize, ttl: Duration, notifier: Arc<Notifier>) -> Arc<Self> {
        let store = Arc::new(Self {
            worker_id,
            max_parallel,
            ttl,
            notifier,
            tasks: Mutex::new(LruCache::unbounded()),
        });
        Arc::clone(&store).spawn_reaper();
        store
    }

    fn spawn_reaper(self: Arc<Self>) {
        let period = self.ttl.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                self.reap_expired();
            }
        });
    }

    /// Drops accepted-but-never-activated tasks, and running tasks whose
    /// shard has already reached a terminal status, once they have sat
    /// untouched for longer than `ttl`.
    fn reap_expired(&self) {
        let mut tasks = self.tasks.lock();
        let expired: Vec<Uuid> = tasks
            .iter()
            .filter(|(_, record)| record.touched_at.elapsed() >= self.ttl && Self::is_reapable(record))
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            tasks.pop(id);
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "task store reaped expired tasks");
        }
    }

    fn is_reapable(record: &TaskRecord) -> bool {
        match &record.state {
            TaskState::Accepted => true,
            TaskState::Running { engine, .. } => matches!(engine.status(), Status::Ready | Status::Error),
        }
    }

    /// Validates and inserts an accepted-but-inactive task (§4.5).
    pub fn create_task(&self, task: Task) -> Result<(), Error> {
        if task.target_hash.is_empty() || task.alphabet.is_empty() {
            return Err(Error::InvalidInput(
                "target_hash and alphabet must be non-empty".to_string(),
            ));
        }
        if task.max_length == 0 {
            return Err(Error::InvalidInput("max_length must be at least 1".to_string()));
        }
        if task.end_index <= task.start_index {
            return Err(Error::InvalidInput(
                "end_index must be greater than start_index".to_string(),
            ));
        }

        let mut tasks = self.tasks.lock();
        if tasks.contains(&task.task_id) {
            return Err(Error::Conflict(task.task_id.to_string()));
        }
        if tasks.len() >= self.max_parallel {
            return Err(Error::CapacityExceeded);
        }
        tasks.put(
            task.task_id,
            TaskRecord {
                task,
                state: TaskState::Accepted,
                touched_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Idempotent activation (§4.5): a no-op if the shard is already
    /// running. Launches the Engine and its Notifier on a detached
    /// scheduling context that outlives this call's HTTP request.
    pub fn do_task(self: &Arc<Self>, task_id: Uuid) -> Result<(), Error> {
        let task = {
            let mut tasks = self.tasks.lock();
            let record = tasks
                .get_mut(&task_id)
                .ok_or_else(|| Error::NotFound(task_id.to_string()))?;
            if matches!(record.state, TaskState::Running { .. }) {
                return Ok(());
            }
            record.task.clone()
        };

        let space = SearchSpace::new(&task.alphabet, task.max_length)?;
        let cancel = CancellationToken::new();
        let engine = Arc::new(Engine::new(self.worker_id, &task, cancel.clone()));

        {
            let mut tasks = self.tasks.lock();
            if let Some(record) = tasks.get_mut(&task_id) {
                record.state = TaskState::Running {
                    cancel,
                    engine: Arc::clone(&engine),
                };
                record.touched_at = Instant::now();
            }
        }

        self.spawn_shard(task_id, task, space, engine);
        Ok(())
    }

    fn spawn_shard(&self, task_id: Uuid, task: Task, space: SearchSpace, engine: Arc<Engine>) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            // A child cancellation scope owned by this shard's notifier
            // loop, separate from the shard's own cancellation token: the
            // notifier must stop once the engine finishes even when the
            // shard was never externally cancelled (§4.6 step 5).
            let notifier_scope = CancellationToken::new();
            let notifier_handle = tokio::spawn({
                let notifier = Arc::clone(&notifier);
                let engine = Arc::clone(&engine);
                let scope = notifier_scope.clone();
                async move { notifier.run_periodic(engine, scope).await }
            });

            let blocking_engine = Arc::clone(&engine);
            let target_hash = task.target_hash.clone();
            if let Err(err) = tokio::task::spawn_blocking(move || {
                blocking_engine.run(&space, &target_hash);
            })
            .await
            {
                warn!(task_id = %task_id, error = %err, "engine task panicked");
            }

            notifier_scope.cancel();
            let _ = notifier_handle.await;
            notifier.push(&engine.snapshot()).await;
        });
    }

    /// Cancels a running shard and removes the record unconditionally.
    /// Never fails on a missing task id; the manager's best-effort
    /// rollback and eviction paths rely on this tolerance (§4.5, §7).
    pub fn delete_task(&self, task_id: Uuid) {
        if let Some(record) = self.tasks.lock().pop(&task_id) {
            if let TaskState::Running { cancel, .. } = record.state {
                cancel.cancel();
            }
        }
    }

    /// Cancels every currently running shard without removing their
    /// records, for process shutdown (§5, §9): Ctrl-C/SIGTERM stop
    /// enumeration promptly instead of leaving it running past the
    /// listener's own graceful-shutdown wait.
    pub fn cancel_all(&self) {
        for (_, record) in self.tasks.lock().iter() {
            if let TaskState::Running { cancel, .. } = &record.state {
                cancel.cancel();
            }
        }
    }

    /// Operator diagnostic only (§6's optional pull endpoint); the
    /// manager's own aggregation never calls this.
    pub fn progress(&self, task_id: Uuid) -> Result<TaskProgress, Error> {
        let mut tasks = self.tasks.lock();
        let record = tasks.get(&task_id).ok_or_else(|| Error::NotFound(task_id.to_string()))?;
        match &record.state {
            TaskState::Running { engine, .. } => Ok(engine.snapshot()),
            TaskState::Accepted => Ok(TaskProgress {
                task_id,
                worker_id: self.worker_id,
                status: Status::NotStarted,
                iterations_done: 0,
                total_iterations: record.task.end_index - record.task.start_index,
                result: Vec::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }
}
