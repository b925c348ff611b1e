//! Types for the job orchestrator.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::job::{JobCounts, JobStatus};
use crate::media::ClipOutput;

/// Result of one clip task, sent to the job's aggregator.
#[derive(Debug, Clone)]
pub enum ClipEvent {
    /// The clip was written.
    Completed(ClipOutput),
    /// The transcoder failed for this clip.
    Failed { index: usize, error: String },
    /// The clip never ran because its job had already failed.
    Skipped { index: usize },
}

/// Called once for every status change of a job (job id, new status).
pub type JobUpdateCallback = Arc<dyn Fn(&str, JobStatus) + Send + Sync>;

/// Status of the clip worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Clips currently transcoding.
    pub active_clips: usize,
    /// Maximum concurrent clips.
    pub max_concurrent: usize,
    /// Clips waiting for a slot.
    pub queued_clips: usize,
    /// Clips produced since startup.
    pub total_processed: u64,
    /// Clips failed since startup.
    pub total_failed: u64,
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    pub pool: PoolStatus,
    pub jobs: JobCounts,
}
