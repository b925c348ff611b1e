//! Error types for job operations.

use thiserror::Error;

use crate::planner::SourceKind;

/// Errors reported synchronously by job operations.
///
/// Probe and transcode failures are not here: they are recorded on the job.
#[derive(Debug, Error)]
pub enum JobError {
    /// No source file was provided.
    #[error("No {} file uploaded", .kind.as_str())]
    InputMissing { kind: SourceKind },

    /// No job with this id exists.
    #[error("Job not found: {0}")]
    UnknownJob(String),

    /// The request cannot be planned.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
