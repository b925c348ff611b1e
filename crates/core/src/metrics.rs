//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (created, finished)
//! - Clips (results, transcode duration, in-flight count)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs created by source kind.
pub static JOBS_CREATED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("podclip_jobs_created_total", "Total jobs created"),
        &["kind"], // "audio", "video"
    )
    .unwrap()
});

/// Jobs reaching a terminal status.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("podclip_jobs_finished_total", "Total jobs finished"),
        &["status"], // "completed", "failed"
    )
    .unwrap()
});

// =============================================================================
// Clip Metrics
// =============================================================================

/// Clip results.
pub static CLIPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("podclip_clips_total", "Total clips by result"),
        &["result"], // "completed", "failed", "skipped"
    )
    .unwrap()
});

/// Time spent in the transcoder per clip.
pub static CLIP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "podclip_clip_transcode_duration_seconds",
            "Duration of one clip transcode",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["variant"],
    )
    .unwrap()
});

/// Clips currently being transcoded.
pub static CLIPS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("podclip_clips_in_flight", "Clips currently transcoding").unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_CREATED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        // Clips
        Box::new(CLIPS_TOTAL.clone()),
        Box::new(CLIP_DURATION.clone()),
        Box::new(CLIPS_IN_FLIGHT.clone()),
    ]
}
