//! Job orchestrator implementation.
//!
//! Drives a job through its lifecycle:
//! - Probe: inline, before `create_job` returns
//! - Plan: pure, see [`crate::planner::plan`]
//! - Clips: one task per clip, bounded by a process-wide worker pool
//! - Aggregation: one task per job, the only writer while clips run

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::job::{
    CreateJobRequest, Job, JobEntry, JobError, JobRegistry, JobSnapshot, JobStatus, JobTransition,
};
use crate::media::{ClipRequest, ClipTranscoder, MediaProber};
use crate::metrics;
use crate::planner::{self, ClipSpec, SourceKind};

use super::aggregator::{report_terminal, run_aggregator};
use super::config::JobsConfig;
use super::types::{ClipEvent, JobUpdateCallback, OrchestratorStatus, PoolStatus};

/// Tracks statistics for the clip worker pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    total_processed: AtomicU64,
    total_failed: AtomicU64,
}

impl PoolStats {
    fn to_status(&self, max_concurrent: usize) -> PoolStatus {
        PoolStatus {
            active_clips: self.active.load(Ordering::Relaxed) as usize,
            max_concurrent,
            queued_clips: self.queued.load(Ordering::Relaxed) as usize,
            total_processed: self.total_processed.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
        }
    }
}

/// Shared pieces every clip task needs.
#[derive(Clone)]
struct ClipWorker {
    transcoder: Arc<dyn ClipTranscoder>,
    semaphore: Arc<Semaphore>,
    stats: Arc<PoolStats>,
}

/// The job orchestrator: creates jobs and runs their clips.
pub struct JobOrchestrator {
    config: JobsConfig,
    output_dir: PathBuf,
    prober: Arc<dyn MediaProber>,
    worker: ClipWorker,
    registry: Arc<JobRegistry>,
    on_update: Option<JobUpdateCallback>,
}

impl JobOrchestrator {
    /// Creates a new orchestrator writing clips into `output_dir`.
    pub fn new(
        config: JobsConfig,
        output_dir: PathBuf,
        prober: Arc<dyn MediaProber>,
        transcoder: Arc<dyn ClipTranscoder>,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_parallel_clips.max(1)));

        Self {
            config,
            output_dir,
            prober,
            worker: ClipWorker {
                transcoder,
                semaphore,
                stats: Arc::new(PoolStats::default()),
            },
            registry: Arc::new(JobRegistry::new()),
            on_update: None,
        }
    }

    /// Sets a callback invoked on every job status change.
    pub fn with_update_callback(mut self, callback: JobUpdateCallback) -> Self {
        self.on_update = Some(callback);
        self
    }

    pub fn config(&self) -> &JobsConfig {
        &self.config
    }

    /// Read access to the job registry.
    pub fn registry(&self) -> Arc<JobRegistry> {
        Arc::clone(&self.registry)
    }

    /// Creates a job and starts rendering its clips.
    ///
    /// Returns once the source is probed and every clip is dispatched, before
    /// any clip finishes. Probe failures are recorded on the job, which is
    /// returned already failed.
    pub async fn create_job(&self, request: CreateJobRequest) -> Result<String, JobError> {
        let kind = request.kind;
        let source_path = request
            .source_path
            .ok_or(JobError::InputMissing { kind })?;
        if request.clip_length_secs == 0 {
            return Err(JobError::InvalidRequest(
                "clip length must be at least 1 second".to_string(),
            ));
        }

        let job = Job::new(kind);
        let job_id = job.id().to_string();
        let entry = self.registry.insert(job).await;

        metrics::JOBS_CREATED.with_label_values(&[kind.as_str()]).inc();
        info!(
            job_id = %job_id,
            kind = kind.as_str(),
            source = %source_path.display(),
            images = request.image_paths.len(),
            clip_length_secs = request.clip_length_secs,
            "Job created"
        );
        self.notify(&job_id, JobStatus::Queued);

        let info = match self.prober.probe(&source_path).await {
            Ok(info) => info,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Probe failed");
                let transition = entry.write().await.fail(e.to_string());
                if let JobTransition::Terminal(status) = transition {
                    report_terminal(&job_id, status, self.on_update.as_ref());
                }
                return Ok(job_id);
            }
        };

        let image_paths = match kind {
            SourceKind::Audio => request.image_paths,
            SourceKind::Video => Vec::new(),
        };
        let specs = planner::plan(
            info.duration_secs,
            request.clip_length_secs,
            image_paths.len(),
            kind,
        );
        debug!(
            job_id = %job_id,
            duration_secs = info.duration_secs,
            clips = specs.len(),
            "Planned clips"
        );

        let transition = entry.write().await.start_processing(specs.len());
        match transition {
            JobTransition::Terminal(status) => {
                report_terminal(&job_id, status, self.on_update.as_ref());
                return Ok(job_id);
            }
            JobTransition::Updated => self.notify(&job_id, JobStatus::Processing),
            JobTransition::Ignored => return Ok(job_id),
        }

        self.dispatch(&job_id, entry, source_path, image_paths, specs);
        Ok(job_id)
    }

    /// Snapshot of one job.
    pub async fn get_job(&self, job_id: &str) -> Result<JobSnapshot, JobError> {
        self.registry
            .get(job_id)
            .await
            .ok_or_else(|| JobError::UnknownJob(job_id.to_string()))
    }

    /// Snapshots of every job, newest first.
    pub async fn list_jobs(&self) -> Vec<JobSnapshot> {
        self.registry.list().await
    }

    /// Returns the current orchestrator status.
    pub async fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            pool: self
                .worker
                .stats
                .to_status(self.config.max_parallel_clips.max(1)),
            jobs: self.registry.counts().await,
        }
    }

    /// Spawns the job's aggregator and one task per clip.
    fn dispatch(
        &self,
        job_id: &str,
        entry: JobEntry,
        source_path: PathBuf,
        image_paths: Vec<PathBuf>,
        specs: Vec<ClipSpec>,
    ) {
        let (events_tx, events_rx) = mpsc::channel(self.config.event_buffer.max(1));
        tokio::spawn(run_aggregator(
            job_id.to_string(),
            entry,
            events_rx,
            self.on_update.clone(),
        ));

        let halted = Arc::new(AtomicBool::new(false));
        for spec in specs {
            let request = ClipRequest {
                job_id: job_id.to_string(),
                image_path: spec.image_index.and_then(|i| image_paths.get(i).cloned()),
                output_path: self.output_dir.join(spec.output_file_name(job_id)),
                source_path: source_path.clone(),
                spec,
            };

            tokio::spawn(self.worker.clone().run_clip(
                request,
                Arc::clone(&halted),
                events_tx.clone(),
            ));
        }
    }

    fn notify(&self, job_id: &str, status: JobStatus) {
        if let Some(ref callback) = self.on_update {
            callback(job_id, status);
        }
    }
}

impl ClipWorker {
    /// Waits for a pool slot, renders one clip and reports the result.
    ///
    /// `halted` is set by the first failing clip of the job before its slot is
    /// released, so clips still waiting for a slot are skipped.
    async fn run_clip(
        self,
        request: ClipRequest,
        halted: Arc<AtomicBool>,
        events: mpsc::Sender<ClipEvent>,
    ) {
        let index = request.spec.index;

        self.stats.queued.fetch_add(1, Ordering::Relaxed);
        let permit = self.semaphore.acquire_owned().await;
        self.stats.queued.fetch_sub(1, Ordering::Relaxed);

        let _permit = match permit {
            Ok(permit) => permit,
            Err(_) => {
                let _ = events
                    .send(ClipEvent::Failed {
                        index,
                        error: "Clip worker pool is closed".to_string(),
                    })
                    .await;
                return;
            }
        };

        if halted.load(Ordering::SeqCst) {
            metrics::CLIPS_TOTAL.with_label_values(&["skipped"]).inc();
            let _ = events.send(ClipEvent::Skipped { index }).await;
            return;
        }

        let job_id = request.job_id.clone();
        let variant = request.spec.variant;
        debug!(job_id = %job_id, clip = index, variant = variant.as_str(), "Clip started");

        self.stats.active.fetch_add(1, Ordering::Relaxed);
        metrics::CLIPS_IN_FLIGHT.inc();
        let start = Instant::now();

        let result = self.transcoder.transcode(request).await;

        metrics::CLIPS_IN_FLIGHT.dec();
        self.stats.active.fetch_sub(1, Ordering::Relaxed);
        metrics::CLIP_DURATION
            .with_label_values(&[variant.as_str()])
            .observe(start.elapsed().as_secs_f64());

        let event = match result {
            Ok(output) => {
                self.stats.total_processed.fetch_add(1, Ordering::Relaxed);
                metrics::CLIPS_TOTAL.with_label_values(&["completed"]).inc();
                ClipEvent::Completed(output)
            }
            Err(e) => {
                halted.store(true, Ordering::SeqCst);
                self.stats.total_failed.fetch_add(1, Ordering::Relaxed);
                metrics::CLIPS_TOTAL.with_label_values(&["failed"]).inc();
                ClipEvent::Failed {
                    index,
                    error: e.to_string(),
                }
            }
        };

        // The aggregator is gone once the job is terminal.
        if events.send(event).await.is_err() {
            debug!(job_id = %job_id, clip = index, "Result discarded, job already finished");
        }
    }
}
