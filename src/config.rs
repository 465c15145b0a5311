// SPDX-License-Identifier: GPL-3.0-only

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Session configuration for the frame pipeline
///
/// The destination geometry is supplied once when the pipeline is started
/// and stays fixed for the session's lifetime. Validation happens at start;
/// an invalid geometry is a fatal configuration error, not a per-frame one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Output frame width in pixels
    pub output_width: u32,
    /// Output frame height in pixels
    pub output_height: u32,
}

impl PipelineConfig {
    pub fn new(output_width: u32, output_height: u32) -> Self {
        Self {
            output_width,
            output_height,
        }
    }

    /// Check that the configured geometry can produce output frames
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_width == 0 || self.output_height == 0 {
            return Err(ConfigError::InvalidGeometry {
                width: self.output_width,
                height: self.output_height,
            });
        }
        Ok(())
    }

    /// Number of pixels in one output frame
    pub fn output_pixels(&self) -> usize {
        self.output_width as usize * self.output_height as usize
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_width: 640,
            output_height: 480,
        }
    }
}
