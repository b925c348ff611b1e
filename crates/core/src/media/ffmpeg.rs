//! FFmpeg-based prober and transcoder.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::{EncodingProfile, TranscoderConfig};
use super::error::MediaError;
use super::traits::{ClipTranscoder, MediaProber};
use super::types::{ClipOutput, ClipRequest, MediaInfo};
use crate::planner::ClipVariant;

/// Number of trailing stderr lines kept in transcode errors.
const STDERR_TAIL_LINES: usize = 5;

/// Runs `ffprobe` and `ffmpeg` as child processes.
pub struct FfmpegToolkit {
    transcoder: TranscoderConfig,
    encoding: EncodingProfile,
}

impl FfmpegToolkit {
    /// Creates a new toolkit.
    pub fn new(transcoder: TranscoderConfig, encoding: EncodingProfile) -> Self {
        Self {
            transcoder,
            encoding,
        }
    }

    /// Creates a toolkit with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default(), EncodingProfile::default())
    }

    /// Builds the ffmpeg arguments for one clip.
    fn build_clip_args(&self, request: &ClipRequest) -> Result<Vec<String>, MediaError> {
        let spec = &request.spec;
        let start = format_secs(spec.start_offset_secs);
        let duration = format_secs(spec.duration_secs);
        let source = request.source_path.to_string_lossy().to_string();

        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.transcoder.log_level.clone(),
        ];

        match spec.variant {
            ClipVariant::AudioOnly => {
                args.extend([
                    "-ss".to_string(),
                    start,
                    "-i".to_string(),
                    source,
                    "-t".to_string(),
                    duration,
                    "-vn".to_string(),
                    "-c:a".to_string(),
                    self.encoding.mp3_codec.clone(),
                    "-b:a".to_string(),
                    format!("{}k", self.encoding.mp3_bitrate_kbps),
                ]);
            }
            ClipVariant::ImageAudio => {
                let image = request.image_path.as_ref().ok_or_else(|| {
                    MediaError::transcode_failed(format!(
                        "Clip {} has no image assigned",
                        spec.index + 1
                    ))
                })?;
                let size = self.encoding.square_size;

                // Still image held for the clip length, audio slice seeked on input.
                args.extend([
                    "-loop".to_string(),
                    "1".to_string(),
                    "-framerate".to_string(),
                    self.encoding.image_framerate.to_string(),
                    "-t".to_string(),
                    duration.clone(),
                    "-i".to_string(),
                    image.to_string_lossy().to_string(),
                    "-ss".to_string(),
                    start,
                    "-i".to_string(),
                    source,
                    "-t".to_string(),
                    duration,
                    "-map".to_string(),
                    "0:v:0".to_string(),
                    "-map".to_string(),
                    "1:a:0".to_string(),
                    "-vf".to_string(),
                    format!("scale={}:{},format=yuv420p", size, size),
                ]);
                args.extend(self.video_encoding_args());
                args.push("-shortest".to_string());
                args.extend(["-movflags".to_string(), "+faststart".to_string()]);
            }
            ClipVariant::VideoOnly => {
                args.extend([
                    "-ss".to_string(),
                    start,
                    "-i".to_string(),
                    source,
                    "-t".to_string(),
                    duration,
                ]);
                args.extend(self.video_encoding_args());
                args.extend(["-movflags".to_string(), "+faststart".to_string()]);
            }
        }

        args.extend(self.transcoder.extra_args.iter().cloned());
        args.push(request.output_path.to_string_lossy().to_string());

        Ok(args)
    }

    /// Video and audio encoder settings shared by the `.mp4` variants.
    fn video_encoding_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.encoding.video_codec.clone(),
            "-preset".to_string(),
            self.encoding.preset.clone(),
            "-crf".to_string(),
            self.encoding.crf.to_string(),
            "-c:a".to_string(),
            self.encoding.audio_codec.clone(),
            "-b:a".to_string(),
            format!("{}k", self.encoding.audio_bitrate_kbps),
        ]
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, MediaError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: Option<String>,
            duration: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            duration: Option<String>,
        }

        let probe: ProbeOutput = serde_json::from_str(output).map_err(|e| {
            MediaError::probe_failed(format!("Failed to parse ffprobe output: {}", e))
        })?;

        let parse = |value: &Option<String>| {
            value
                .as_deref()
                .and_then(|d| d.parse::<f64>().ok())
                .filter(|d| d.is_finite() && *d >= 0.0)
        };

        // Some containers only report duration per stream.
        let duration_secs = parse(&probe.format.duration)
            .or_else(|| probe.streams.iter().filter_map(|s| parse(&s.duration)).reduce(f64::max))
            .ok_or_else(|| {
                MediaError::probe_failed(format!(
                    "{}: ffprobe reported no duration",
                    path.display()
                ))
            })?;

        let has_stream = |kind: &str| {
            probe
                .streams
                .iter()
                .any(|s| s.codec_type.as_deref() == Some(kind))
        };

        let format = probe
            .format
            .format_name
            .as_deref()
            .and_then(|f| f.split(',').next())
            .unwrap_or("unknown")
            .to_string();

        Ok(MediaInfo {
            path: path.to_path_buf(),
            duration_secs,
            format,
            has_audio: has_stream("audio"),
            has_video: has_stream("video"),
        })
    }

    /// Checks that ffmpeg and ffprobe can be executed.
    pub async fn validate(&self) -> Result<(), MediaError> {
        let ffmpeg_result = Command::new(&self.transcoder.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(MediaError::FfmpegNotFound {
                    path: self.transcoder.ffmpeg_path.clone(),
                });
            }
            return Err(MediaError::Io(e));
        }

        let ffprobe_result = Command::new(&self.transcoder.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(MediaError::FfprobeNotFound {
                    path: self.transcoder.ffprobe_path.clone(),
                });
            }
            return Err(MediaError::Io(e));
        }

        Ok(())
    }
}

#[async_trait]
impl MediaProber for FfmpegToolkit {
    fn name(&self) -> &str {
        "ffprobe"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, MediaError> {
        if !path.exists() {
            return Err(MediaError::probe_failed(format!(
                "{}: No such file or directory",
                path.display()
            )));
        }

        let output = Command::new(&self.transcoder.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediaError::probe_failed(format!(
                        "FFprobe not found at path: {}",
                        self.transcoder.ffprobe_path.display()
                    ))
                } else {
                    MediaError::probe_failed(format!("Failed to run ffprobe: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(MediaError::probe_failed(if stderr.is_empty() {
                format!("ffprobe exited with code {}", exit_code(&output.status))
            } else {
                stderr
            }));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }
}

#[async_trait]
impl ClipTranscoder for FfmpegToolkit {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode(&self, request: ClipRequest) -> Result<ClipOutput, MediaError> {
        if let Some(parent) = request.output_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MediaError::transcode_failed(format!(
                    "Failed to create output directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let args = self.build_clip_args(&request)?;
        debug!(
            job_id = %request.job_id,
            clip = request.spec.index,
            variant = request.spec.variant.as_str(),
            "Running ffmpeg"
        );

        let mut command = Command::new(&self.transcoder.ffmpeg_path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Dropping the future on timeout kills the child.
        let run = command.output();
        let result = match self.transcoder.timeout_secs {
            Some(secs) => match timeout(Duration::from_secs(secs), run).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(MediaError::transcode_failed(format!(
                        "ffmpeg timed out after {} seconds",
                        secs
                    )))
                }
            },
            None => run.await,
        };

        let output = result.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MediaError::transcode_failed(format!(
                    "FFmpeg not found at path: {}",
                    self.transcoder.ffmpeg_path.display()
                ))
            } else {
                MediaError::transcode_failed(format!("Failed to run ffmpeg: {}", e))
            }
        })?;

        if !output.status.success() {
            let tail = stderr_tail(&output.stderr);
            let code = exit_code(&output.status);
            return Err(MediaError::transcode_failed(if tail.is_empty() {
                format!("ffmpeg exited with code {}", code)
            } else {
                format!("ffmpeg exited with code {}: {}", code, tail)
            }));
        }

        let meta = tokio::fs::metadata(&request.output_path).await.map_err(|_| {
            MediaError::transcode_failed(format!(
                "ffmpeg produced no output at {}",
                request.output_path.display()
            ))
        })?;

        Ok(ClipOutput::for_request(&request, meta.len()))
    }
}

/// Seconds as ffmpeg time syntax.
fn format_secs(secs: f64) -> String {
    format!("{:.3}", secs)
}

fn exit_code(status: &std::process::ExitStatus) -> String {
    status
        .code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

/// Last few non-empty stderr lines, which is where ffmpeg reports the failure.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
