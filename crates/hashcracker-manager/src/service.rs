use std::{sync::Arc, time::Duration};

use hashcracker_common::{StatusResponse, TaskProgress};
use uuid::Uuid;

use crate::{aggregator::Aggregator, error::Error, registry::Registry, scheduler::Scheduler};

/// Top-level manager service composing the registry, scheduler and
/// aggregator behind the handlers in `server.rs`.
pub struct ManagerService {
    registry: Arc<Registry>,
    aggregator: Arc<Aggregator>,
    scheduler: Scheduler,
}

impl ManagerService {
    pub fn new(alphabet: String, health_check_period: Duration, health_check_max_tries: u32) -> Self {
        let aggregator = Arc::new(Aggregator::new());
        let registry = Registry::new(Arc::clone(&aggregator), health_check_period, health_check_max_tries);
        let scheduler = Scheduler::new(Arc::clone(&registry), Arc::clone(&aggregator), alphabet);
        Self {
            registry,
            aggregator,
            scheduler,
        }
    }

    pub fn register_worker(&self, address: String) -> Uuid {
        self.registry.add_worker(address)
    }

    pub async fn submit(&self, target_hash: String, max_length: usize) -> Result<Uuid, Error> {
        if max_length == 0 {
            return Err(Error::InvalidInput("maxLength must be at least 1".to_string()));
        }
        self.scheduler.submit(target_hash, max_length).await
    }

    pub fn task_progress(&self, task_id: Uuid) -> Result<StatusResponse, Error> {
        self.aggregator.task_progress(task_id)
    }

    pub fn update_progress(&self, progress: TaskProgress) -> Result<(), Error> {
        let worker_known = self.registry.contains(progress.worker_id);
        self.aggregator.update_progress(worker_known, progress)
    }
}
