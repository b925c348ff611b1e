//! Process-wide job registry.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::types::{Job, JobCounts, JobSnapshot};

/// Shared handle to one job's state.
pub(crate) type JobEntry = Arc<RwLock<Job>>;

/// Maps job ids to job state.
///
/// Readers only ever get [`JobSnapshot`]s. Mutable entries are handed out
/// inside the crate, to the job's aggregator.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a job and returns its entry.
    pub(crate) async fn insert(&self, job: Job) -> JobEntry {
        let id = job.id().to_string();
        let entry = Arc::new(RwLock::new(job));
        self.jobs.write().await.insert(id, Arc::clone(&entry));
        entry
    }

    /// Snapshot of one job.
    pub async fn get(&self, id: &str) -> Option<JobSnapshot> {
        let entry = self.jobs.read().await.get(id).cloned()?;
        let job = entry.read().await;
        Some(job.snapshot())
    }

    /// Snapshots of every job, newest first.
    pub async fn list(&self) -> Vec<JobSnapshot> {
        let entries: Vec<JobEntry> = self.jobs.read().await.values().cloned().collect();

        let mut snapshots = Vec::with_capacity(entries.len());
        for entry in entries {
            snapshots.push(entry.read().await.snapshot());
        }
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        snapshots
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Number of jobs per status.
    pub async fn counts(&self) -> JobCounts {
        let entries: Vec<JobEntry> = self.jobs.read().await.values().cloned().collect();

        let mut counts = JobCounts::default();
        for entry in entries {
            counts.add(entry.read().await.status());
        }
        counts
    }
}
