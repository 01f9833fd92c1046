use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{aggregator::Aggregator, health_checker::HealthChecker, worker_client::WorkerClient};

struct WorkerHandle {
    address: String,
    client: WorkerClient,
    supervisor: CancellationToken,
}

#[derive(Default)]
struct RegistryState {
    workers: HashMap<Uuid, WorkerHandle>,
    addr_to_id: HashMap<String, Uuid>,
}

/// Tracks live workers and supervises each with a health-check loop
/// (§4.2). `add_worker`/`evict` maintain invariant I1 (address<->id is
/// 1:1) and I5 (re-registration evicts the old record first).
pub struct Registry {
    aggregator: Arc<Aggregator>,
    health_check_period: Duration,
    health_check_max_tries: u32,
    state: RwLock<RegistryState>,
}

impl Registry {
    pub fn new(aggregator: Arc<Aggregator>, health_check_period: Duration, health_check_max_tries: u32) -> Arc<Self> {
        Arc::new(Self {
            aggregator,
            health_check_period,
            health_check_max_tries,
            state: RwLock::new(RegistryState::default()),
        })
    }

    /// Registers `address`, evicting any prior registration at the same
    /// address first, and spawns a supervisor task that evicts this
    /// worker once its health checker reports terminal failure.
    pub fn add_worker(self: &Arc<Self>, address: String) -> Uuid {
        if let Some(old_id) = self.state.read().addr_to_id.get(&address).copied() {
            self.evict(old_id, "superseded by re-registration");
        }

        let worker_id = Uuid::new_v4();
        let client = WorkerClient::new(&address);
        let supervisor = CancellationToken::new();

        {
            let mut state = self.state.write();
            state.workers.insert(
                worker_id,
                WorkerHandle {
                    address: address.clone(),
                    client,
                    supervisor: supervisor.clone(),
                },
            );
            state.addr_to_id.insert(address.clone(), worker_id);
        }

        let health_checker = HealthChecker::new(&address, self.health_check_period, self.health_check_max_tries);
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = health_checker.notify_failure() => {
                    warn!(worker_id = %worker_id, address = %address, "worker failed health checks, evicting");
                    registry.evict(worker_id, "health check failure");
                }
                _ = supervisor.cancelled() => {}
            }
        });

        info!(worker_id = %worker_id, address = %address, "worker registered");
        worker_id
    }

    pub fn evict(&self, worker_id: Uuid, reason: &str) {
        let removed = {
            let mut state = self.state.write();
            let handle = state.workers.remove(&worker_id);
            if handle.is_some() {
                state.addr_to_id.retain(|_, id| *id != worker_id);
            }
            handle
        };

        if let Some(handle) = removed {
            handle.supervisor.cancel();
            info!(worker_id = %worker_id, address = %handle.address, reason, "worker evicted");
            self.aggregator.mark_worker_shards_error(worker_id);
        }
    }

    pub fn contains(&self, worker_id: Uuid) -> bool {
        self.state.read().workers.contains_key(&worker_id)
    }

    pub fn len(&self) -> usize {
        self.state.read().workers.len()
    }

    /// A point-in-time snapshot used by the scheduler to fan out a new
    /// task. `WorkerClient` is cheap to clone (it wraps a `reqwest::Client`).
    pub fn snapshot(&self) -> Vec<(Uuid, WorkerClient)> {
        self.state
            .read()
            .workers
            .iter()
            .map(|(id, handle)| (*id, handle.client.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<Registry> {
        Registry::new(Arc::new(Aggregator::new()), Duration::from_millis(10), 3)
    }

    #[tokio::test]
    async fn add_worker_assigns_a_fresh_id() {
        let registry = registry();
        let id = registry.add_worker("127.0.0.1:9001".to_string());
        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn re_registration_from_same_address_evicts_the_old_id() {
        let registry = registry();
        let first = registry.add_worker("127.0.0.1:9001".to_string());
        let second = registry.add_worker("127.0.0.1:9001".to_string());
        assert_ne!(first, second);
        assert!(!registry.contains(first));
        assert!(registry.contains(second));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn evict_marks_in_flight_shards_as_error() {
        let aggregator = Arc::new(Aggregator::new());
        let registry = Registry::new(Arc::clone(&aggregator), Duration::from_millis(10), 3);
        let worker_id = registry.add_worker("127.0.0.1:9001".to_string());

        let task_id = Uuid::new_v4();
        aggregator.record_assignment(task_id, std::collections::HashSet::from([worker_id]));

        registry.evict(worker_id, "test");

        let status = aggregator.task_progress(task_id).unwrap();
        assert_eq!(status.status, hashcracker_common::Status::Error);
    }
}
