//! Testing utilities and mock implementations.
//!
//! [`MockMediaToolkit`] stands in for ffprobe and ffmpeg so jobs can run
//! end to end without the real tools.
//!
//! # Example
//!
//! ```rust,ignore
//! use podclip_core::testing::MockMediaToolkit;
//!
//! let toolkit = Arc::new(MockMediaToolkit::with_duration(125.0));
//! toolkit.set_default_delay(Duration::from_millis(20)).await;
//!
//! // Use as both prober and transcoder...
//! ```

mod mock_media;

pub use mock_media::MockMediaToolkit;
