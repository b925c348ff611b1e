//! Clip planner.
//!
//! Turns a probed source duration and a requested clip length into the
//! ordered list of [`ClipSpec`]s a job will produce. Planning is pure: it
//! never touches the filesystem or the transcoder.

mod plan;
mod types;

pub use plan::{clip_count, plan};
pub use types::{ClipSpec, ClipVariant, SourceKind};
