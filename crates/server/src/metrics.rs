//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the PodClip server:
//! - HTTP request metrics (latency, counts)
//! - Upload metrics
//! - Job and worker pool status (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "podclip_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("podclip_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "podclip_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Upload Metrics
// =============================================================================

/// Uploaded files by form field.
pub static UPLOADED_FILES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("podclip_uploaded_files_total", "Total uploaded files"),
        &["field"], // "audio", "image", "video"
    )
    .unwrap()
});

// =============================================================================
// Job Metrics (collected dynamically)
// =============================================================================

/// Jobs by current status.
pub static JOBS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("podclip_jobs_by_status", "Current job count by status"),
        &["status"],
    )
    .unwrap()
});

/// Clips holding a worker pool slot.
pub static CLIP_POOL_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("podclip_clip_pool_active", "Number of active clip transcodes").unwrap()
});

/// Clips waiting for a worker pool slot.
pub static CLIP_POOL_QUEUED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("podclip_clip_pool_queued", "Number of queued clip transcodes").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Uploads
    registry
        .register(Box::new(UPLOADED_FILES_TOTAL.clone()))
        .unwrap();

    // Jobs
    registry
        .register(Box::new(JOBS_BY_STATUS.clone()))
        .unwrap();
    registry
        .register(Box::new(CLIP_POOL_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(CLIP_POOL_QUEUED.clone()))
        .unwrap();

    // Core metrics (jobs, clips)
    for metric in podclip_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with current values
/// from the orchestrator.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.orchestrator().status().await;

    CLIP_POOL_ACTIVE.set(status.pool.active_clips as i64);
    CLIP_POOL_QUEUED.set(status.pool.queued_clips as i64);

    for (label, count) in [
        ("queued", status.jobs.queued),
        ("processing", status.jobs.processing),
        ("completed", status.jobs.completed),
        ("failed", status.jobs.failed),
    ] {
        JOBS_BY_STATUS.with_label_values(&[label]).set(count as i64);
    }
}

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static CLIP_FILE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"/[^/]+\.(mp3|mp4)$").unwrap());

static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs and clip files with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = CLIP_FILE_REGEX.replace_all(path, "/{file}");
    let result = UUID_REGEX.replace_all(&result, "{id}");
    let result = NUMERIC_REGEX.replace_all(&result, "/{id}$1");
    result.to_string()
}
