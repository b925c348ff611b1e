//! Clip planning.

use super::types::{ClipSpec, ClipVariant, SourceKind};

/// Number of full-length clips that fit in the source.
///
/// A trailing remainder shorter than `clip_length_secs` is dropped.
pub fn clip_count(duration_secs: f64, clip_length_secs: u32) -> usize {
    if clip_length_secs == 0 || !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0;
    }
    (duration_secs / f64::from(clip_length_secs)).floor() as usize
}

/// Computes the ordered clip plan for a source.
///
/// Audio sources become `.mp3` clips when no images are supplied and
/// `.mp4` image+audio clips otherwise, with images assigned round-robin.
/// Video sources always become `.mp4` slices and ignore images.
pub fn plan(
    duration_secs: f64,
    clip_length_secs: u32,
    num_images: usize,
    kind: SourceKind,
) -> Vec<ClipSpec> {
    let length = f64::from(clip_length_secs);

    (0..clip_count(duration_secs, clip_length_secs))
        .map(|index| {
            let (variant, image_index) = match kind {
                SourceKind::Video => (ClipVariant::VideoOnly, None),
                SourceKind::Audio if num_images > 0 => {
                    (ClipVariant::ImageAudio, Some(index % num_images))
                }
                SourceKind::Audio => (ClipVariant::AudioOnly, None),
            };

            ClipSpec {
                index,
                start_offset_secs: index as f64 * length,
                duration_secs: length,
                image_index,
                variant,
            }
        })
        .collect()
}
