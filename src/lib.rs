// SPDX-License-Identifier: GPL-3.0-only

//! Live camera frame pipeline
//!
//! Streams raw sensor frames through color conversion and a crop/rotate
//! transform, delivering fixed-size output frames to a consumer at the
//! sensor's rate without ever falling behind (a frame arriving while the
//! previous one is still processing is dropped, never queued).
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`pipeline`]: the frame processor, color converter, transform
//!   calculator and orientation tracker
//! - [`source`]: the frame source capability and a synthetic test source
//! - [`frame`]: sensor frame, plane and output frame types
//! - [`config`]: session configuration
//! - [`errors`]: error taxonomy
//!
//! # Example
//!
//! ```no_run
//! use camera_pipeline::{FramePipeline, FrameSource, PipelineConfig, TestPatternSource};
//! use std::time::Duration;
//!
//! let pipeline = FramePipeline::start(PipelineConfig::new(640, 480), |frame| {
//!     println!("frame {} ({}x{})", frame.sequence, frame.width, frame.height);
//! })?;
//!
//! let mut source = TestPatternSource::new(1280, 720, Duration::from_millis(33));
//! source.start(pipeline.handle())?;
//! std::thread::sleep(Duration::from_secs(1));
//! source.stop();
//! pipeline.stop();
//! # Ok::<(), camera_pipeline::PipelineError>(())
//! ```

pub mod config;
pub mod errors;
pub mod frame;
pub mod pipeline;
pub mod source;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use errors::{ConfigError, FrameError, PipelineError, PipelineResult};
pub use frame::{Facing, FramePlane, OutputFrame, PlaneData, Rotation, SensorFrame};
pub use pipeline::{
    AffineTransform, FrameHandle, FramePipeline, PipelineState, PipelineStats, SubmitResult,
    TransformPair,
};
pub use source::{FrameSource, TestPatternSource, test_pattern_frame};
