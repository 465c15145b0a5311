// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the frame pipeline

use std::fmt;

/// Result type alias using PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Main pipeline error type
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// Session configuration errors (fatal at start)
    Config(ConfigError),
    /// Per-frame processing errors (frame dropped, stream continues)
    Frame(FrameError),
    /// Worker thread could not be spawned or joined
    Worker(String),
}

/// Session configuration errors
///
/// These are surfaced once when the pipeline is started and prevent the
/// worker from being spawned. They are never raised per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Destination width or height is zero
    InvalidGeometry { width: u32, height: u32 },
}

/// Per-frame processing errors
///
/// Any of these causes the offending frame to be dropped with a warning;
/// the stream is never halted by a single bad frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// A plane's declared geometry needs more bytes than its buffer holds
    CorruptPlane {
        plane: &'static str,
        needed: usize,
        available: usize,
    },
    /// Source frame dimensions are zero or inconsistent with the plane data
    InvalidGeometry { width: u32, height: u32 },
    /// Unexpected failure during conversion or rendering
    Conversion(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Config(e) => write!(f, "Configuration error: {}", e),
            PipelineError::Frame(e) => write!(f, "Frame error: {}", e),
            PipelineError::Worker(msg) => write!(f, "Worker error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidGeometry { width, height } => {
                write!(f, "Invalid output geometry {}x{}", width, height)
            }
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::CorruptPlane {
                plane,
                needed,
                available,
            } => {
                write!(
                    f,
                    "Corrupt {} plane: needs {} bytes, buffer holds {}",
                    plane, needed, available
                )
            }
            FrameError::InvalidGeometry { width, height } => {
                write!(f, "Invalid source geometry {}x{}", width, height)
            }
            FrameError::Conversion(msg) => write!(f, "Conversion failed: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for FrameError {}

// Conversions from sub-errors to PipelineError
impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::Config(err)
    }
}

impl From<FrameError> for PipelineError {
    fn from(err: FrameError) -> Self {
        PipelineError::Frame(err)
    }
}
