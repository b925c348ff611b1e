//! Types for the clip planner.

use serde::{Deserialize, Serialize};

/// What kind of source a job was submitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Long-form audio, optionally combined with still images.
    Audio,
    /// A video that is sliced directly.
    Video,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

/// How a single clip is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipVariant {
    /// Trimmed audio slice.
    AudioOnly,
    /// Still image held for the clip's duration over an audio slice.
    ImageAudio,
    /// Trimmed and re-encoded slice of a source video.
    VideoOnly,
}

impl ClipVariant {
    /// Returns the file extension of the produced clip.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::AudioOnly => "mp3",
            Self::ImageAudio | Self::VideoOnly => "mp4",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AudioOnly => "audio_only",
            Self::ImageAudio => "image_audio",
            Self::VideoOnly => "video_only",
        }
    }
}

/// The immutable plan for one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSpec {
    /// 0-based position in the plan.
    pub index: usize,
    /// Offset into the source, in seconds.
    pub start_offset_secs: f64,
    /// Clip length, in seconds.
    pub duration_secs: f64,
    /// Index into the job's image list (round-robin), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_index: Option<usize>,
    /// Rendering variant.
    pub variant: ClipVariant,
}

impl ClipSpec {
    /// End of the slice in the source, in seconds.
    pub fn end_secs(&self) -> f64 {
        self.start_offset_secs + self.duration_secs
    }

    /// Output file name for this clip. Unique per job and clip index.
    pub fn output_file_name(&self, job_id: &str) -> String {
        format!(
            "{}_clip{}.{}",
            job_id,
            self.index + 1,
            self.variant.extension()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_extension() {
        assert_eq!(ClipVariant::AudioOnly.extension(), "mp3");
        assert_eq!(ClipVariant::ImageAudio.extension(), "mp4");
        assert_eq!(ClipVariant::VideoOnly.extension(), "mp4");
    }

    #[test]
    fn test_output_file_name_is_one_based() {
        let spec = ClipSpec {
            index: 0,
            start_offset_secs: 0.0,
            duration_secs: 60.0,
            image_index: None,
            variant: ClipVariant::AudioOnly,
        };
        assert_eq!(spec.output_file_name("job-1"), "job-1_clip1.mp3");
        assert_eq!(spec.end_secs(), 60.0);
    }

    #[test]
    fn test_source_kind_serialization() {
        assert_eq!(serde_json::to_string(&SourceKind::Audio).unwrap(), "\"audio\"");
        assert_eq!(serde_json::to_string(&SourceKind::Video).unwrap(), "\"video\"");
    }
}
