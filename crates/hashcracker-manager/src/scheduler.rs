use std::{collections::HashSet, sync::Arc};

use hashcracker_common::{SearchSpace, Task};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{aggregator::Aggregator, error::Error, registry::Registry};

/// Partitions `n` into `k` contiguous, disjoint ranges covering
/// `[0, n)`, with the first `n % k` ranges one larger than the rest
/// (§4.3, P2). Returns at most `k` ranges; `k == 0` yields none.
pub fn split_range(n: u64, k: u64) -> Vec<(u64, u64)> {
    if k == 0 {
        return Vec::new();
    }
    let base = n / k;
    let remainder = n % k;
    let mut ranges = Vec::with_capacity(k as usize);
    let mut start = 0u64;
    for i in 0..k {
        let size = base + if i < remainder { 1 } else { 0 };
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Fans a new task out across the currently registered workers (§4.3).
pub struct Scheduler {
    registry: Arc<Registry>,
    aggregator: Arc<Aggregator>,
    alphabet: String,
}

impl Scheduler {
    pub fn new(registry: Arc<Registry>, aggregator: Arc<Aggregator>, alphabet: String) -> Self {
        Self {
            registry,
            aggregator,
            alphabet,
        }
    }

    pub async fn submit(&self, target_hash: String, max_length: usize) -> Result<Uuid, Error> {
        let workers = self.registry.snapshot();
        if workers.is_empty() {
            return Err(Error::NoAvailableWorkers);
        }

        let space = SearchSpace::new(&self.alphabet, max_length)?;
        let n = space.total_size();
        let k = (workers.len() as u64).min(n.max(1));
        let ranges = split_range(n, k);

        let task_id = Uuid::new_v4();
        let mut created: Vec<Uuid> = Vec::new();

        // Create phase: every worker must accept the shard before any
        // of them is activated.
        for ((worker_id, client), (start, end)) in workers.iter().zip(ranges.iter()) {
            let task = Task {
                task_id,
                target_hash: target_hash.clone(),
                alphabet: self.alphabet.clone(),
                max_length,
                start_index: *start,
                end_index: *end,
            };
            match client.create_task(&task).await {
                Ok(()) => created.push(*worker_id),
                Err(err) => {
                    error!(worker = %client.address(), error = %err, "create_task failed, rolling back");
                    self.rollback(&workers, &created, task_id).await;
                    return Err(Error::Upstream(format!(
                        "worker {} rejected create_task: {err}",
                        client.address()
                    )));
                }
            }
        }

        // Activate phase.
        let mut activated: Vec<Uuid> = Vec::new();
        for (worker_id, client) in workers.iter().filter(|(id, _)| created.contains(id)) {
            match client.do_task(task_id).await {
                Ok(()) => activated.push(*worker_id),
                Err(err) => {
                    error!(worker = %client.address(), error = %err, "do_task failed, rolling back");
                    self.rollback(&workers, &created, task_id).await;
                    return Err(Error::Upstream(format!(
                        "worker {} rejected do_task: {err}",
                        client.address()
                    )));
                }
            }
        }

        self.aggregator
            .record_assignment(task_id, activated.into_iter().collect::<HashSet<_>>());
        Ok(task_id)
    }

    /// Best-effort delete across every worker that accepted the create,
    /// regardless of whether activation was reached. The manager never
    /// surfaces a rollback-deletion failure; it only logs it.
    async fn rollback(&self, workers: &[(Uuid, crate::worker_client::WorkerClient)], created: &[Uuid], task_id: Uuid) {
        self.aggregator.forget_assignment(task_id);
        for (worker_id, client) in workers.iter().filter(|(id, _)| created.contains(id)) {
            if let Err(err) = client.delete_task(task_id).await {
                warn!(worker_id = %worker_id, error = %err, "rollback delete_task failed");
            }
        }
    }
}
