//! Job orchestrator.
//!
//! Owns the job lifecycle: probe the source, plan clips, fan them out to a
//! bounded worker pool and fold their results into job state:
//! - **Probe**: inline in `create_job`, failure is terminal for the job
//! - **Clips**: concurrent, bounded by `jobs.max_parallel_clips`
//! - **Aggregation**: one task per job, the single writer for that job

mod aggregator;
mod config;
mod runner;
mod types;

pub use config::JobsConfig;
pub use runner::JobOrchestrator;
pub use types::{ClipEvent, JobUpdateCallback, OrchestratorStatus, PoolStatus};
