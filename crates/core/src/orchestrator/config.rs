//! Job orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the job orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Maximum transcoder processes running at once, across all jobs.
    #[serde(default = "default_max_parallel_clips")]
    pub max_parallel_clips: usize,

    /// Clip length used when a request does not carry a valid one (seconds).
    #[serde(default = "default_clip_length")]
    pub default_clip_length_secs: u32,

    /// Capacity of each job's clip event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_max_parallel_clips() -> usize {
    4
}

fn default_clip_length() -> u32 {
    60
}

fn default_event_buffer() -> usize {
    64
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_parallel_clips: default_max_parallel_clips(),
            default_clip_length_secs: default_clip_length(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl JobsConfig {
    /// Sets the worker pool size.
    pub fn with_max_parallel_clips(mut self, max_parallel_clips: usize) -> Self {
        self.max_parallel_clips = max_parallel_clips;
        self
    }
}
