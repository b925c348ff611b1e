//! Jobs and the registry that holds them.

mod error;
mod registry;
mod types;

pub use error::JobError;
pub use registry::JobRegistry;
pub(crate) use registry::JobEntry;
pub use types::{
    resolve_clip_length, CreateJobRequest, Job, JobCounts, JobSnapshot, JobStatus, JobTransition,
};
