//! Trait definitions for the media module.

use async_trait::async_trait;
use std::path::Path;

use super::error::MediaError;
use super::types::{ClipOutput, ClipRequest, MediaInfo};

/// Inspects a source file before it is planned.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Returns the name of this prober implementation.
    fn name(&self) -> &str;

    /// Probes a media file. Fails with [`MediaError::ProbeFailed`] carrying the
    /// tool's diagnostic text when the source cannot be read.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, MediaError>;
}

/// Renders a single clip.
#[async_trait]
pub trait ClipTranscoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Renders one clip to `request.output_path`.
    ///
    /// Fails with [`MediaError::TranscodeFailed`] carrying the tool's message.
    /// Implementations never retry.
    async fn transcode(&self, request: ClipRequest) -> Result<ClipOutput, MediaError>;
}
