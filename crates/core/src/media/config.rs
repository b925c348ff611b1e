//! Configuration for the media tools.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the external tools live and how they are invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Per-clip timeout in seconds. Unset means clips may run indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Additional arguments placed right before the output path.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_log_level() -> String {
    "error".to_string()
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            log_level: default_log_level(),
            timeout_secs: None,
            extra_args: Vec::new(),
        }
    }
}

impl TranscoderConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Sets the per-clip timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }
}

/// Encoder settings shared by every clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingProfile {
    /// Side of the square frame used for image clips, in pixels.
    #[serde(default = "default_square_size")]
    pub square_size: u32,

    /// Input frame rate of the looped still image.
    #[serde(default = "default_image_framerate")]
    pub image_framerate: u32,

    /// Video encoder.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Encoder speed preset.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (0-51, lower = better).
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio encoder for video clips.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate for video clips, in kbps.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,

    /// Audio encoder for audio-only clips.
    #[serde(default = "default_mp3_codec")]
    pub mp3_codec: String,

    /// Bitrate for audio-only clips, in kbps.
    #[serde(default = "default_mp3_bitrate")]
    pub mp3_bitrate_kbps: u32,
}

fn default_square_size() -> u32 {
    1080
}

fn default_image_framerate() -> u32 {
    1
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_crf() -> u8 {
    23
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> u32 {
    128
}

fn default_mp3_codec() -> String {
    "libmp3lame".to_string()
}

fn default_mp3_bitrate() -> u32 {
    128
}

impl Default for EncodingProfile {
    fn default() -> Self {
        Self {
            square_size: default_square_size(),
            image_framerate: default_image_framerate(),
            video_codec: default_video_codec(),
            preset: default_preset(),
            crf: default_crf(),
            audio_codec: default_audio_codec(),
            audio_bitrate_kbps: default_audio_bitrate(),
            mp3_codec: default_mp3_codec(),
            mp3_bitrate_kbps: default_mp3_bitrate(),
        }
    }
}
