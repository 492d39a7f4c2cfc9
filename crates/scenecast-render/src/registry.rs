//! Render job registry — single source of truth for per-scene state.
//!
//! The orchestrator loop is the only writer. Observers never see the live
//! records; every mutation publishes an immutable snapshot through a watch
//! channel, so readers cannot tear mid-update.

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::debug;

use scenecast_core::{RenderJob, RenderStatus, Scene};

pub struct RenderRegistry {
    jobs: RwLock<Vec<RenderJob>>,
    snapshot_tx: watch::Sender<Vec<RenderJob>>,
}

impl RenderRegistry {
    /// Seed one `Pending` job per scene, ordered ascending by scene_id.
    pub fn new(scenes: &[Scene]) -> Self {
        let mut jobs: Vec<RenderJob> = scenes
            .iter()
            .map(|s| RenderJob::pending(s.scene_id))
            .collect();
        jobs.sort_by_key(|j| j.scene_id);

        let (snapshot_tx, _) = watch::channel(jobs.clone());
        debug!("Registry seeded with {} jobs", jobs.len());

        Self {
            jobs: RwLock::new(jobs),
            snapshot_tx,
        }
    }

    /// Immutable copy of the current job list.
    pub fn snapshot(&self) -> Vec<RenderJob> {
        self.jobs.read().clone()
    }

    /// Subscribe to snapshots; one is published after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<RenderJob>> {
        self.snapshot_tx.subscribe()
    }

    /// Scene ids in processing order.
    pub fn scene_ids(&self) -> Vec<u32> {
        self.jobs.read().iter().map(|j| j.scene_id).collect()
    }

    pub fn get(&self, scene_id: u32) -> Option<RenderJob> {
        self.jobs
            .read()
            .iter()
            .find(|j| j.scene_id == scene_id)
            .cloned()
    }

    /// Mutate one job record and publish a snapshot. Returns false if the
    /// scene_id is unknown.
    pub fn update<F>(&self, scene_id: u32, f: F) -> bool
    where
        F: FnOnce(&mut RenderJob),
    {
        let mut jobs = self.jobs.write();
        let Some(job) = jobs.iter_mut().find(|j| j.scene_id == scene_id) else {
            return false;
        };
        f(job);
        let snapshot = jobs.clone();
        drop(jobs);

        self.snapshot_tx.send_replace(snapshot);
        true
    }

    /// Manual retry: reset a `Failed` job to `Pending`. The only backward
    /// edge in the job state machine.
    pub fn reset_to_pending(&self, scene_id: u32) -> bool {
        let mut jobs = self.jobs.write();
        let Some(job) = jobs
            .iter_mut()
            .find(|j| j.scene_id == scene_id && j.status == RenderStatus::Failed)
        else {
            return false;
        };
        job.status = RenderStatus::Pending;
        job.diagnostic = None;
        let snapshot = jobs.clone();
        drop(jobs);

        self.snapshot_tx.send_replace(snapshot);
        true
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.jobs
            .read()
            .iter()
            .filter(|j| j.status == RenderStatus::Completed)
            .count()
    }

    pub fn all_completed(&self) -> bool {
        let jobs = self.jobs.read();
        !jobs.is_empty() && jobs.iter().all(|j| j.status == RenderStatus::Completed)
    }
}
