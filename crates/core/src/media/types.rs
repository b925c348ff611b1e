//! Types for the media module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::planner::ClipSpec;

/// Information about a probed source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// File path.
    pub path: PathBuf,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Container format (e.g., "mp3", "mov").
    pub format: String,
    /// Whether an audio stream is present.
    pub has_audio: bool,
    /// Whether a video stream is present.
    pub has_video: bool,
}

/// Everything the transcoder needs to render one clip.
#[derive(Debug, Clone)]
pub struct ClipRequest {
    /// Job the clip belongs to.
    pub job_id: String,
    /// The clip's plan.
    pub spec: ClipSpec,
    /// Audio or video source.
    pub source_path: PathBuf,
    /// Still image for image+audio clips.
    pub image_path: Option<PathBuf>,
    /// Where the clip is written.
    pub output_path: PathBuf,
}

/// Reference to a produced clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipOutput {
    /// Clip index in the job's plan.
    pub index: usize,
    /// File name inside the output directory.
    pub file_name: String,
    /// Full output path.
    pub path: PathBuf,
    /// Output file size in bytes.
    pub size_bytes: u64,
}

impl ClipOutput {
    /// Builds the reference for a request whose output was written.
    pub fn for_request(request: &ClipRequest, size_bytes: u64) -> Self {
        let file_name = request
            .output_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| request.spec.output_file_name(&request.job_id));

        Self {
            index: request.spec.index,
            file_name,
            path: request.output_path.clone(),
            size_bytes,
        }
    }
}
