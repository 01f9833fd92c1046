use std::collections::{HashMap, HashSet};

use hashcracker_common::{Status, StatusResponse, TaskProgress};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::Error;

#[derive(Default)]
struct AggregatorState {
    /// task_id -> the set of workers it was assigned to.
    assignments: HashMap<Uuid, HashSet<Uuid>>,
    /// task_id -> worker_id -> latest pushed progress for that shard.
    shard_results: HashMap<Uuid, HashMap<Uuid, TaskProgress>>,
}

/// Holds Assignment and ShardResults (§3) and implements the push
/// ingestion and merge rule (§4.4).
#[derive(Default)]
pub struct Aggregator {
    state: RwLock<AggregatorState>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fresh Assignment. Called once, after every shard of a
    /// task has been created and activated.
    pub fn record_assignment(&self, task_id: Uuid, worker_ids: HashSet<Uuid>) {
        let mut state = self.state.write();
        state.assignments.insert(task_id, worker_ids);
        state.shard_results.insert(task_id, HashMap::new());
    }

    /// Drops an Assignment that never completed activation (scheduler
    /// rollback path). No-op if the assignment was never recorded.
    pub fn forget_assignment(&self, task_id: Uuid) {
        let mut state = self.state.write();
        state.assignments.remove(&task_id);
        state.shard_results.remove(&task_id);
    }

    /// Number of tasks currently holding an Assignment. Used by the
    /// scheduler's rollback tests to confirm a failed `submit` leaves no
    /// Assignment entry behind (§4.3 step 4).
    pub fn assignment_count(&self) -> usize {
        self.state.read().assignments.len()
    }

    /// Ingests a pushed shard progress. `worker_known` must be supplied
    /// by the caller (the registry is the source of truth for worker
    /// identity; the aggregator only knows about Assignments).
    pub fn update_progress(&self, worker_known: bool, progress: TaskProgress) -> Result<(), Error> {
        if !worker_known {
            return Err(Error::NotFound(format!(
                "worker {} is not registered",
                progress.worker_id
            )));
        }

        let mut state = self.state.write();
        let assigned = state
            .assignments
            .get(&progress.task_id)
            .ok_or_else(|| Error::NotFound(format!("task {} not found", progress.task_id)))?;
        if !assigned.contains(&progress.worker_id) {
            return Err(Error::InvalidInput(format!(
                "worker {} is not assigned to task {}",
                progress.worker_id, progress.task_id
            )));
        }

        state
            .shard_results
            .entry(progress.task_id)
            .or_default()
            .insert(progress.worker_id, progress);
        Ok(())
    }

    pub fn task_progress(&self, task_id: Uuid) -> Result<StatusResponse, Error> {
        let state = self.state.read();
        let assignment = state
            .assignments
            .get(&task_id)
            .ok_or_else(|| Error::NotFound(format!("task {task_id} not found")))?;
        let results = state
            .shard_results
            .get(&task_id)
            .map(|m| m.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(merge(&results, assignment.len()))
    }

    /// Eviction hook: marks every shard of `worker_id` that is not
    /// already READY as ERROR, synthesising an entry if none exists yet.
    /// Never overwrites a READY shard.
    pub fn mark_worker_shards_error(&self, worker_id: Uuid) {
        let mut state = self.state.write();
        let task_ids: Vec<Uuid> = state
            .assignments
            .iter()
            .filter(|(_, workers)| workers.contains(&worker_id))
            .map(|(task_id, _)| *task_id)
            .collect();

        for task_id in task_ids {
            let results = state.shard_results.entry(task_id).or_default();
            match results.get(&worker_id) {
                Some(existing) if existing.status == Status::Ready => {}
                Some(existing) => {
                    let mut errored = existing.clone();
                    errored.status = Status::Error;
                    results.insert(worker_id, errored);
                }
                None => {
                    results.insert(
                        worker_id,
                        TaskProgress {
                            task_id,
                            worker_id,
                            status: Status::Error,
                            iterations_done: 0,
                            total_iterations: 0,
                            result: Vec::new(),
                        },
                    );
                }
            }
        }
    }
}

/// Pure merge rule (§4.4), split out for direct unit testing.
fn merge(results: &[TaskProgress], assignment_size: usize) -> StatusResponse {
    if results.is_empty() {
        return StatusResponse {
            status: Status::NotStarted,
            progress: 0,
            data: Vec::new(),
        };
    }

    let total: u64 = results.iter().map(|p| p.total_iterations).sum();
    let done: u64 = results.iter().map(|p| p.iterations_done).sum();

    let any_error = results.iter().any(|p| p.status == Status::Error);
    let all_ready = results.len() == assignment_size && results.iter().all(|p| p.status == Status::Ready);

    let status = if any_error {
        Status::Error
    } else if all_ready {
        Status::Ready
    } else {
        Status::InProgress
    };

    let progress = if total > 0 {
        ((done as f64 / total as f64) * 100.0).floor() as u32
    } else {
        0
    };

    let mut data: Vec<String> = results.iter().flat_map(|p| p.result.iter().cloned()).collect();
    data.sort();
    data.dedup();

    StatusResponse {
        status,
        progress,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(status: Status, done: u64, total: u64, result: &[&str]) -> TaskProgress {
        TaskProgress {
            task_id: Uuid::nil(),
            worker_id: Uuid::new_v4(),
            status,
            iterations_done: done,
            total_iterations: total,
            result: result.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn no_shards_is_not_started() {
        let merged = merge(&[], 0);
        assert_eq!(merged.status, Status::NotStarted);
        assert_eq!(merged.progress, 0);
    }

    #[test]
    fn any_error_dominates() {
        let shards = vec![
            progress(Status::Ready, 10, 10, &[]),
            progress(Status::Error, 3, 10, &[]),
        ];
        let merged = merge(&shards, 2);
        assert_eq!(merged.status, Status::Error);
    }

    #[test]
    fn ready_requires_full_coverage() {
        let shards = vec![progress(Status::Ready, 10, 10, &["abba"])];
        // assignment_size is 2 but only one shard has reported.
        let merged = merge(&shards, 2);
        assert_eq!(merged.status, Status::InProgress);
    }

    #[test]
    fn ready_when_all_present_and_ready() {
        let shards = vec![
            progress(Status::Ready, 5, 5, &["abba"]),
            progress(Status::Ready, 5, 5, &[]),
        ];
        let merged = merge(&shards, 2);
        assert_eq!(merged.status, Status::Ready);
        assert_eq!(merged.progress, 100);
        assert_eq!(merged.data, vec!["abba".to_string()]);
    }

    #[test]
    fn progress_percent_floors() {
        let shards = vec![progress(Status::InProgress, 1, 3, &[])];
        let merged = merge(&shards, 1);
        assert_eq!(merged.progress, 33);
    }

    #[test]
    fn result_union_is_deduplicated() {
        let shards = vec![
            progress(Status::Ready, 1, 1, &["abba"]),
            progress(Status::Ready, 1, 1, &["abba"]),
        ];
        let merged = merge(&shards, 2);
        assert_eq!(merged.data, vec!["abba".to_string()]);
    }

    #[test]
    fn eviction_never_overwrites_ready() {
        let agg = Aggregator::new();
        let task_id = Uuid::new_v4();
        let worker_id = Uuid::new_v4();
        agg.record_assignment(task_id, HashSet::from([worker_id]));
        agg.update_progress(
            true,
            TaskProgress {
                task_id,
                worker_id,
                status: Status::Ready,
                iterations_done: 5,
                total_iterations: 5,
                result: vec!["abba".to_string()],
            },
        )
        .unwrap();

        agg.mark_worker_shards_error(worker_id);

        let merged = agg.task_progress(task_id).unwrap();
        assert_eq!(merged.status, Status::Ready);
    }

    #[test]
    fn eviction_synthesises_error_when_no_report_yet() {
        let agg = Aggregator::new();
        let task_id = Uuid::new_v4();
        let worker_id = Uuid::new_v4();
        agg.record_assignment(task_id, HashSet::from([worker_id]));

        agg.mark_worker_shards_error(worker_id);

        let merged = agg.task_progress(task_id).unwrap();
        assert_eq!(merged.status, Status::Error);
    }

    #[test]
    fn update_progress_rejects_unknown_worker() {
        let agg = Aggregator::new();
        let err = agg
            .update_progress(
                false,
                progress(Status::InProgress, 0, 10, &[]),
            )
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn update_progress_rejects_worker_not_in_assignment() {
        let agg = Aggregator::new();
        let task_id = Uuid::new_v4();
        agg.record_assignment(task_id, HashSet::new());
        let mut p = progress(Status::InProgress, 0, 10, &[]);
        p.task_id = task_id;
        let err = agg.update_progress(true, p).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn task_progress_unknown_task_not_found() {
        let agg = Aggregator::new();
        let err = agg.task_progress(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    /// §8 scenario 5: two sequential pushes for the same (task, worker)
    /// with `iterations_done` 5 then 3 — the later, lower value wins.
    /// This is deliberate simplicity (last-write-wins per shard, no
    /// sequence number), documented in spec §4.7/§9, not a bug: a
    /// stale push can momentarily regress the reported count, and the
    /// next push (or the shard's final synchronous push) corrects it.
    #[test]
    fn later_push_overwrites_earlier_push_even_with_a_lower_iterations_done() {
        let agg = Aggregator::new();
        let task_id = Uuid::new_v4();
        let worker_id = Uuid::new_v4();
        agg.record_assignment(task_id, HashSet::from([worker_id]));

        let mut first = progress(Status::InProgress, 5, 10, &[]);
        first.task_id = task_id;
        first.worker_id = worker_id;
        agg.update_progress(true, first).unwrap();

        let mut second = progress(Status::InProgress, 3, 10, &[]);
        second.task_id = task_id;
        second.worker_id = worker_id;
        agg.update_progress(true, second).unwrap();

        let merged = agg.task_progress(task_id).unwrap();
        assert_eq!(merged.progress, 30);
    }
}
