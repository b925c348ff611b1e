pub mod config;
pub mod job;
pub mod media;
pub mod metrics;
pub mod orchestrator;
pub mod planner;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
    ServerConfig, StorageConfig,
};
pub use job::{
    resolve_clip_length, CreateJobRequest, JobCounts, JobError, JobRegistry, JobSnapshot,
    JobStatus,
};
pub use media::{
    ClipOutput, ClipTranscoder, EncodingProfile, FfmpegToolkit, MediaError, MediaInfo,
    MediaProber, TranscoderConfig,
};
pub use orchestrator::{JobOrchestrator, JobUpdateCallback, JobsConfig, OrchestratorStatus};
pub use planner::{ClipSpec, ClipVariant, SourceKind};
