//! Media probing and clip transcoding.
//!
//! The job engine talks to media tools only through the [`MediaProber`] and
//! [`ClipTranscoder`] traits. [`FfmpegToolkit`] implements both by spawning
//! `ffprobe` and `ffmpeg`.

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::{EncodingProfile, TranscoderConfig};
pub use error::MediaError;
pub use ffmpeg::FfmpegToolkit;
pub use traits::{ClipTranscoder, MediaProber};
pub use types::{ClipOutput, ClipRequest, MediaInfo};
