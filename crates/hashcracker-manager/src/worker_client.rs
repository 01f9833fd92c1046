use std::time::Duration;

use hashcracker_common::Task;
use uuid::Uuid;

use crate::error::Error;

/// Thin HTTP client for one worker, mirroring its `/api/v1/tasks` route
/// table. All calls share a fixed 5-second deadline; none are retried —
/// a single failure is surfaced to the caller, who decides whether to
/// roll back (see `scheduler::Scheduler::submit`).
#[derive(Clone, Debug)]
pub struct WorkerClient {
    client: reqwest::Client,
    base_url: String,
}

impl WorkerClient {
    pub fn new(address: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("reqwest client builds with a fixed timeout"),
            base_url: format!("http://{address}"),
        }
    }

    pub async fn create_task(&self, task: &Task) -> Result<(), Error> {
        let resp = self
            .client
            .post(format!("{}/api/v1/tasks/", self.base_url))
            .json(task)
            .send()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Error::Upstream(format!(
                "create_task on {} returned {}",
                self.base_url,
                resp.status()
            )))
        }
    }

    pub async fn do_task(&self, task_id: Uuid) -> Result<(), Error> {
        let resp = self
            .client
            .put(format!("{}/api/v1/tasks/{task_id}/do", self.base_url))
            .send()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Error::Upstream(format!(
                "do_task on {} returned {}",
                self.base_url,
                resp.status()
            )))
        }
    }

    /// Best-effort: callers (rollback, eviction) log failures and move on
    /// rather than propagate them.
    pub async fn delete_task(&self, task_id: Uuid) -> Result<(), Error> {
        let resp = self
            .client
            .delete(format!("{}/api/v1/tasks/{task_id}", self.base_url))
            .send()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Error::Upstream(format!(
                "delete_task on {} returned {}",
                self.base_url,
                resp.status()
            )))
        }
    }

    pub fn address(&self) -> &str {
        self.base_url.trim_start_matches("http://")
    }
}
