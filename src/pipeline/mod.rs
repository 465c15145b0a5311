// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing pipeline
//!
//! Per-frame flow: plane copy-in → YUV 4:2:0 to packed ARGB conversion →
//! crop/rotate transform (recomputed only when geometry or orientation
//! changed) → inverse-mapped render into the output buffer → synchronous
//! delivery. The processor owns the single-in-flight guarantee; everything
//! below it is a pure function over buffers.

pub mod convert;
pub mod orientation;
pub mod processor;
pub mod render;
pub mod transform;

pub use orientation::EffectiveOrientation;
pub use processor::{FrameHandle, FramePipeline, PipelineState, PipelineStats, SubmitResult};
pub use transform::{AffineTransform, TransformPair};
