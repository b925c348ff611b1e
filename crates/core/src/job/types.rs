//! Core job data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::media::ClipOutput;
use crate::planner::SourceKind;

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, source not yet probed.
    Queued,
    /// Clips are being rendered.
    Processing,
    /// Every planned clip was produced.
    Completed,
    /// Probing or one of the clips failed.
    Failed,
}

impl JobStatus {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of applying an event to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobTransition {
    /// The event did not apply (job already terminal or in the wrong state).
    Ignored,
    /// Fields changed, status is still non-terminal.
    Updated,
    /// The job just reached this terminal status.
    Terminal(JobStatus),
}

/// A clip-generation job.
///
/// Fields are only changed through the transition methods, which refuse to
/// touch a job once it is terminal.
#[derive(Debug, Clone)]
pub struct Job {
    id: String,
    kind: SourceKind,
    status: JobStatus,
    total_clips: usize,
    completed_clips: usize,
    outputs: Vec<ClipOutput>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Creates a queued job with a fresh id.
    pub fn new(kind: SourceKind) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            status: JobStatus::Queued,
            total_clips: 0,
            completed_clips: 0,
            outputs: Vec::new(),
            error_message: None,
            created_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn total_clips(&self) -> usize {
        self.total_clips
    }

    pub fn completed_clips(&self) -> usize {
        self.completed_clips
    }

    pub fn outputs(&self) -> &[ClipOutput] {
        &self.outputs
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// `round(100 * completed / total)`, or 0 while nothing is planned.
    pub fn progress_percent(&self) -> u8 {
        if self.total_clips == 0 {
            return 0;
        }
        let ratio = self.completed_clips as f64 / self.total_clips as f64;
        (ratio * 100.0).round() as u8
    }

    /// Moves a queued job to processing with `total_clips` planned.
    ///
    /// A plan with zero clips completes the job immediately.
    pub fn start_processing(&mut self, total_clips: usize) -> JobTransition {
        if self.status != JobStatus::Queued {
            return JobTransition::Ignored;
        }

        self.total_clips = total_clips;
        if total_clips == 0 {
            return self.finish(JobStatus::Completed);
        }

        self.status = JobStatus::Processing;
        self.updated_at = Utc::now();
        JobTransition::Updated
    }

    /// Records one produced clip, completing the job on the last one.
    pub fn record_clip_completed(&mut self, output: ClipOutput) -> JobTransition {
        if self.status != JobStatus::Processing || self.completed_clips >= self.total_clips {
            return JobTransition::Ignored;
        }

        self.completed_clips += 1;
        self.outputs.push(output);

        if self.completed_clips == self.total_clips {
            return self.finish(JobStatus::Completed);
        }

        self.updated_at = Utc::now();
        JobTransition::Updated
    }

    /// Fails the job with `message`. Ignored once terminal.
    pub fn fail(&mut self, message: impl Into<String>) -> JobTransition {
        if self.status.is_terminal() {
            return JobTransition::Ignored;
        }

        self.error_message = Some(message.into());
        self.finish(JobStatus::Failed)
    }

    fn finish(&mut self, status: JobStatus) -> JobTransition {
        let now = Utc::now();
        self.status = status;
        self.updated_at = now;
        self.finished_at = Some(now);
        JobTransition::Terminal(status)
    }

    /// Immutable copy of the public fields.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id.clone(),
            kind: self.kind,
            status: self.status,
            total_clips: self.total_clips,
            completed_clips: self.completed_clips,
            progress_percent: self.progress_percent(),
            outputs: self.outputs.clone(),
            error_message: self.error_message.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            finished_at: self.finished_at,
        }
    }
}

/// Point-in-time view of a job handed to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: String,
    pub kind: SourceKind,
    pub status: JobStatus,
    pub total_clips: usize,
    pub completed_clips: usize,
    pub progress_percent: u8,
    /// Produced clips in completion order.
    pub outputs: Vec<ClipOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Number of jobs in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    pub queued: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

impl JobCounts {
    pub(crate) fn add(&mut self, status: JobStatus) {
        match status {
            JobStatus::Queued => self.queued += 1,
            JobStatus::Processing => self.processing += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.queued + self.processing + self.completed + self.failed
    }
}

/// Request to create a job from already-saved uploads.
#[derive(Debug, Clone)]
pub struct CreateJobRequest {
    /// Source kind.
    pub kind: SourceKind,
    /// Saved audio or video file. `None` when the upload was missing.
    pub source_path: Option<PathBuf>,
    /// Saved still images, in upload order. Ignored for video sources.
    pub image_paths: Vec<PathBuf>,
    /// Requested clip length in seconds.
    pub clip_length_secs: u32,
}

impl CreateJobRequest {
    /// Audio source with optional still images.
    pub fn audio(source_path: PathBuf, image_paths: Vec<PathBuf>, clip_length_secs: u32) -> Self {
        Self {
            kind: SourceKind::Audio,
            source_path: Some(source_path),
            image_paths,
            clip_length_secs,
        }
    }

    /// Video source sliced directly.
    pub fn video(source_path: PathBuf, clip_length_secs: u32) -> Self {
        Self {
            kind: SourceKind::Video,
            source_path: Some(source_path),
            image_paths: Vec::new(),
            clip_length_secs,
        }
    }
}

/// Parses a submitted clip length the way the upload form sends it.
///
/// Takes the leading integer of the value (`"45s"` is 45, `"1.5"` is 1).
/// Absent, unparseable and non-positive values fall back to `default`, as do
/// values too large for a `u32`.
pub fn resolve_clip_length(raw: Option<&str>, default: u32) -> u32 {
    let Some(raw) = raw else {
        return default;
    };

    let trimmed = raw.trim_start();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    match digits[..end].parse::<u32>() {
        Ok(value) if value > 0 => value,
        _ => default,
    }
}
