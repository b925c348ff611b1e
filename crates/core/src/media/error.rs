//! Error types for the media module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while probing or transcoding media.
///
/// `ProbeFailed` and `TranscodeFailed` display their reason verbatim, since
/// the reason is the external tool's own diagnostic and ends up in front of
/// users as the job's error message.
#[derive(Debug, Error)]
pub enum MediaError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// The source could not be inspected.
    #[error("{reason}")]
    ProbeFailed { reason: String },

    /// One clip's transcoder invocation failed.
    #[error("{reason}")]
    TranscodeFailed { reason: String },

    /// I/O error while talking to the tools.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Creates a new probe failed error.
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new transcode failed error.
    pub fn transcode_failed(reason: impl Into<String>) -> Self {
        Self::TranscodeFailed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_is_displayed_verbatim() {
        let err = MediaError::probe_failed("corrupt.mp3: Invalid data found when processing input");
        assert_eq!(
            err.to_string(),
            "corrupt.mp3: Invalid data found when processing input"
        );

        let err = MediaError::transcode_failed("ffmpeg exited with code 1: boom");
        assert_eq!(err.to_string(), "ffmpeg exited with code 1: boom");
    }
}
