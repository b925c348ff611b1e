//! Mock media toolkit for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::media::{ClipOutput, ClipRequest, ClipTranscoder, MediaError, MediaInfo, MediaProber};

/// Mock implementation of [`MediaProber`] and [`ClipTranscoder`].
///
/// Provides controllable behavior for testing:
/// - Scripted probe duration or probe failure
/// - Per-clip failures and delays
/// - Recorded probe paths and transcode requests
/// - Optionally writes small placeholder files as clip outputs
///
/// # Example
///
/// ```rust,ignore
/// use podclip_core::testing::MockMediaToolkit;
///
/// let toolkit = Arc::new(MockMediaToolkit::with_duration(185.0));
/// toolkit.fail_clip(1, "ffmpeg exited with code 1: boom").await;
///
/// let orchestrator = JobOrchestrator::new(config, out_dir, toolkit.clone(), toolkit.clone());
/// ```
#[derive(Debug)]
pub struct MockMediaToolkit {
    /// Duration reported by every probe.
    duration_secs: Arc<RwLock<f64>>,
    /// If set, every probe fails with this reason.
    probe_error: Arc<RwLock<Option<String>>>,
    /// Clips that fail, by index, with their error reason.
    failing_clips: Arc<RwLock<HashMap<usize, String>>>,
    /// Per-clip simulated transcode time.
    clip_delays: Arc<RwLock<HashMap<usize, Duration>>>,
    /// Simulated transcode time for clips without an explicit delay.
    default_delay: Arc<RwLock<Duration>>,
    /// Whether to write placeholder output files.
    write_outputs: Arc<RwLock<bool>>,
    /// Recorded probe paths.
    probed: Arc<RwLock<Vec<PathBuf>>>,
    /// Recorded transcode requests, in call order.
    requests: Arc<RwLock<Vec<ClipRequest>>>,
}

impl Default for MockMediaToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMediaToolkit {
    /// Create a new mock that reports 180 second sources.
    pub fn new() -> Self {
        Self::with_duration(180.0)
    }

    /// Create a new mock that reports sources of `duration_secs`.
    pub fn with_duration(duration_secs: f64) -> Self {
        Self {
            duration_secs: Arc::new(RwLock::new(duration_secs)),
            probe_error: Arc::new(RwLock::new(None)),
            failing_clips: Arc::new(RwLock::new(HashMap::new())),
            clip_delays: Arc::new(RwLock::new(HashMap::new())),
            default_delay: Arc::new(RwLock::new(Duration::ZERO)),
            write_outputs: Arc::new(RwLock::new(false)),
            probed: Arc::new(RwLock::new(Vec::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Set the duration reported by probes.
    pub async fn set_duration(&self, duration_secs: f64) {
        *self.duration_secs.write().await = duration_secs;
    }

    /// Make every probe fail with `reason`.
    pub async fn set_probe_error(&self, reason: impl Into<String>) {
        *self.probe_error.write().await = Some(reason.into());
    }

    /// Make clip `index` fail with `reason`.
    pub async fn fail_clip(&self, index: usize, reason: impl Into<String>) {
        self.failing_clips
            .write()
            .await
            .insert(index, reason.into());
    }

    /// Set the simulated transcode time of clip `index`.
    pub async fn set_clip_delay(&self, index: usize, delay: Duration) {
        self.clip_delays.write().await.insert(index, delay);
    }

    /// Set the simulated transcode time of every other clip.
    pub async fn set_default_delay(&self, delay: Duration) {
        *self.default_delay.write().await = delay;
    }

    /// Write a small placeholder file for each successful clip.
    pub async fn set_write_outputs(&self, write: bool) {
        *self.write_outputs.write().await = write;
    }

    /// Paths passed to `probe`.
    pub async fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed.read().await.clone()
    }

    /// Requests passed to `transcode`, in call order.
    pub async fn transcode_requests(&self) -> Vec<ClipRequest> {
        self.requests.read().await.clone()
    }

    /// Number of `transcode` calls so far.
    pub async fn transcode_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Waits until at least `count` transcodes were started.
    ///
    /// Gives up after about five seconds and returns false.
    pub async fn wait_for_transcodes(&self, count: usize) -> bool {
        for _ in 0..500 {
            if self.transcode_count().await >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

#[async_trait]
impl MediaProber for MockMediaToolkit {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, MediaError> {
        self.probed.write().await.push(path.to_path_buf());

        if let Some(reason) = self.probe_error.read().await.as_ref() {
            return Err(MediaError::probe_failed(reason.clone()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown");
        let is_video = matches!(extension, "mp4" | "mov" | "mkv" | "webm");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            duration_secs: *self.duration_secs.read().await,
            format: extension.to_string(),
            has_audio: true,
            has_video: is_video,
        })
    }
}

#[async_trait]
impl ClipTranscoder for MockMediaToolkit {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcode(&self, request: ClipRequest) -> Result<ClipOutput, MediaError> {
        let index = request.spec.index;
        self.requests.write().await.push(request.clone());

        let delay = match self.clip_delays.read().await.get(&index) {
            Some(delay) => *delay,
            None => *self.default_delay.read().await,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(reason) = self.failing_clips.read().await.get(&index) {
            return Err(MediaError::transcode_failed(reason.clone()));
        }

        let mut size_bytes = 0;
        if *self.write_outputs.read().await {
            if let Some(parent) = request.output_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let contents = format!("clip {} of {}", index + 1, request.job_id);
            tokio::fs::write(&request.output_path, &contents).await?;
            size_bytes = contents.len() as u64;
        }

        Ok(ClipOutput::for_request(&request, size_bytes))
    }
}
