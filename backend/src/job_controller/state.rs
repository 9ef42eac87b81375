//! Tracks the state of long-running background jobs.
//!
//! Import jobs (see `services/imports/pipeline.rs`) run outside the
//! request/response cycle. Their live progress is kept here so that
//! `GET /api/imports/status/{job_id}` can answer a running job without
//! touching the database.
//!
//! - `JobsState`: clonable, shared map of job id → `JobStatus`, stored in
//!   `AppState`.
//! - `JobUpdate`: message a worker sends to report a status change.
//! - `start_job_updater`: single task draining the update channel into the map.
//!
//! A finished job whose outcome is already stored in `import_jobs` is dropped
//! from the map; the status endpoint then answers from the database.

use common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Capacity of the update channel between workers and the updater task.
const UPDATE_BUFFER: usize = 100;

#[derive(Clone)]
pub struct JobsState {
    /// Live status of every job that is still running, or whose outcome could
    /// not be stored.
    ///
    /// Readers (status endpoint) take the read lock; only `start_job_updater`
    /// and job registration write.
    pub jobs: Arc<RwLock<HashMap<Uuid, JobStatus>>>,

    /// Workers push `JobUpdate`s here instead of locking `jobs` themselves,
    /// which lets blocking workers report with `blocking_send`.
    pub tx: mpsc::Sender<JobUpdate>,
}

/// A status change for one job.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: Uuid,
    pub(crate) status: JobStatus,
    /// The status is already recorded in `import_jobs`.
    pub(crate) stored: bool,
}

impl JobUpdate {
    pub fn progress(job_id: Uuid, status: JobStatus) -> Self {
        Self {
            job_id,
            status,
            stored: false,
        }
    }
}

impl JobsState {
    /// Creates the shared state and the receiving end the updater task must drain.
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
        let state = JobsState {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Registers a freshly scheduled job as `Pending`.
    pub async fn register(&self, job_id: Uuid) {
        self.jobs.write().await.insert(job_id, JobStatus::Pending);
    }

    pub async fn status(&self, job_id: &Uuid) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

/// Applies every `JobUpdate` received on `rx` to the shared map.
///
/// Spawned once from `main`. Returns when every sender has been dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        if update.stored && update.status.is_finished() {
            jobs.remove(&update.job_id);
        } else {
            jobs.insert(update.job_id, update.status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn updates_reach_the_map() {
        let (state, rx) = JobsState::new();
        let id = Uuid::new_v4();
        state.register(id).await;
        assert_eq!(state.status(&id).await, Some(JobStatus::Pending));

        actix_web::rt::spawn(start_job_updater(state.clone(), rx));
        state
            .tx
            .send(JobUpdate::progress(id, JobStatus::InProgress(10)))
            .await
            .unwrap();

        for _ in 0..100 {
            if state.status(&id).await == Some(JobStatus::InProgress(10)) {
                return;
            }
            actix_web::rt::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("update was never applied");
    }

    async fn wait_for<F: Fn(Option<JobStatus>) -> bool>(state: &JobsState, id: Uuid, done: F) {
        for _ in 0..100 {
            if done(state.status(&id).await) {
                return;
            }
            actix_web::rt::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("update was never applied");
    }

    #[actix_web::test]
    async fn stored_outcomes_leave_the_map() {
        let (state, rx) = JobsState::new();
        actix_web::rt::spawn(start_job_updater(state.clone(), rx));

        let stored = Uuid::new_v4();
        let unstored = Uuid::new_v4();
        state.register(stored).await;
        state.register(unstored).await;

        state
            .tx
            .send(JobUpdate {
                job_id: stored,
                status: JobStatus::Failed("boom".into()),
                stored: true,
            })
            .await
            .unwrap();
        wait_for(&state, stored, |s| s.is_none()).await;

        // without a stored copy the outcome stays available in memory
        state
            .tx
            .send(JobUpdate {
                job_id: unstored,
                status: JobStatus::Failed("boom".into()),
                stored: false,
            })
            .await
            .unwrap();
        wait_for(&state, unstored, |s| s == Some(JobStatus::Failed("boom".into()))).await;

        // progress is never evicted, even when flagged as stored
        state
            .tx
            .send(JobUpdate {
                job_id: stored,
                status: JobStatus::InProgress(1),
                stored: true,
            })
            .await
            .unwrap();
        wait_for(&state, stored, |s| s == Some(JobStatus::InProgress(1))).await;
        assert_eq!(state.jobs.read().await.len(), 2);
    }
}
