// SPDX-License-Identifier: GPL-3.0-only

//! Shared frame types for the processing pipeline

use crate::pipeline::transform::AffineTransform;
use std::sync::Arc;
use std::time::Instant;

/// Plane data storage - reference-counted bytes
///
/// Cloning is cheap (reference count bump). The underlying buffer is
/// returned to its source when the last clone is dropped, which is how the
/// pipeline "releases" a frame after copying its planes out.
#[derive(Clone)]
pub struct PlaneData(Arc<[u8]>);

impl PlaneData {
    /// Get the length of the plane data in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the plane data is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for PlaneData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PlaneData({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for PlaneData {
    fn from(bytes: Vec<u8>) -> Self {
        PlaneData(Arc::from(bytes))
    }
}

impl From<&[u8]> for PlaneData {
    fn from(bytes: &[u8]) -> Self {
        PlaneData(Arc::from(bytes))
    }
}

impl AsRef<[u8]> for PlaneData {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::ops::Deref for PlaneData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// One channel's worth of raw sample bytes in a subsampled color encoding
///
/// `row_stride` is the byte distance between successive rows, `pixel_stride`
/// the distance between successive samples within a row. Planar chroma uses
/// `pixel_stride == 1`, semi-planar (interleaved UV) uses `pixel_stride == 2`.
#[derive(Debug, Clone)]
pub struct FramePlane {
    pub data: PlaneData,
    pub row_stride: usize,
    pub pixel_stride: usize,
}

impl FramePlane {
    pub fn new(data: impl Into<PlaneData>, row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data: data.into(),
            row_stride,
            pixel_stride,
        }
    }
}

/// A single raw frame from the sensor (YUV 4:2:0, one plane per channel)
///
/// Immutable once captured. The pipeline owns the frame for the duration of
/// processing and drops it as soon as the plane bytes have been copied into
/// its reusable scratch buffers, even if conversion later fails.
#[derive(Debug, Clone)]
pub struct SensorFrame {
    pub width: u32,
    pub height: u32,
    /// Planes in Y, U, V order
    pub planes: [FramePlane; 3],
    /// Monotonically increasing capture sequence number
    pub sequence: u64,
    /// Timestamp when the frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

impl SensorFrame {
    pub fn new(width: u32, height: u32, planes: [FramePlane; 3], sequence: u64) -> Self {
        Self {
            width,
            height,
            planes,
            sequence,
            captured_at: Instant::now(),
        }
    }
}

/// Sensor or device rotation in degrees (clockwise)
///
/// Camera sensors are often physically mounted at 90° or 270° relative to
/// the device's natural display orientation, and the device itself rotates
/// independently. Both are expressed as quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// No rotation
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl Rotation {
    /// Create rotation from an integer degree value (normalised to 0-360,
    /// non-quarter-turn values fall back to `None`).
    pub fn from_degrees_int(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => Rotation::Rotate90,
            180 => Rotation::Rotate180,
            270 => Rotation::Rotate270,
            _ => Rotation::None,
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }

    /// Check if rotation swaps width and height
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, Rotation::Rotate90 | Rotation::Rotate270)
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Which way the sensor faces on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    /// Rear sensor, looking away from the user
    #[default]
    Back,
    /// Front sensor, looking at the user (presents a mirrored image)
    Front,
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Back => write!(f, "back"),
            Facing::Front => write!(f, "front"),
        }
    }
}

/// A processed frame at the caller-configured output size
///
/// Produced fresh for every delivery; ownership moves to the delivery
/// callback. Pixels are packed `0xAARRGGBB` with alpha forced opaque.
/// `frame_to_output` is the transform that produced this image from the
/// source frame; `output_to_frame` is its inverse, usable to map output
/// coordinates (e.g. a tap position) back onto the sensor frame.
#[derive(Debug, Clone)]
pub struct OutputFrame {
    pub width: u32,
    pub height: u32,
    pub source_width: u32,
    pub source_height: u32,
    /// Packed pixels, row-major, `width * height` entries
    pub pixels: Vec<u32>,
    pub frame_to_output: AffineTransform,
    pub output_to_frame: AffineTransform,
    pub sequence: u64,
    pub captured_at: Instant,
}

impl OutputFrame {
    /// View the packed pixels as raw bytes (native byte order)
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Convert to an RGBA image, e.g. for PNG encoding
    ///
    /// Returns `None` if the pixel buffer no longer matches the declared
    /// dimensions (the fields are public and a consumer may have resized it).
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        let mut rgba = Vec::with_capacity(self.pixels.len() * 4);
        for &px in &self.pixels {
            rgba.push((px >> 16) as u8); // R
            rgba.push((px >> 8) as u8); // G
            rgba.push(px as u8); // B
            rgba.push((px >> 24) as u8); // A
        }
        image::RgbaImage::from_raw(self.width, self.height, rgba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees_int(0), Rotation::None);
        assert_eq!(Rotation::from_degrees_int(90), Rotation::Rotate90);
        assert_eq!(Rotation::from_degrees_int(450), Rotation::Rotate90);
        assert_eq!(Rotation::from_degrees_int(-90), Rotation::Rotate270);
        assert_eq!(Rotation::from_degrees_int(360), Rotation::None);
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        assert!(!Rotation::None.swaps_dimensions());
        assert!(Rotation::Rotate90.swaps_dimensions());
        assert!(!Rotation::Rotate180.swaps_dimensions());
        assert!(Rotation::Rotate270.swaps_dimensions());
    }

    #[test]
    fn test_plane_data_release_on_drop() {
        let data = PlaneData::from(vec![1u8, 2, 3]);
        let clone = data.clone();
        drop(data);
        // The clone keeps the buffer alive
        assert_eq!(clone.len(), 3);
        assert_eq!(&clone[..], &[1, 2, 3]);
    }

    #[test]
    fn test_output_frame_byte_view() {
        let frame = OutputFrame {
            width: 2,
            height: 1,
            source_width: 2,
            source_height: 1,
            pixels: vec![0xFF00FF00, 0xFFFF0000],
            frame_to_output: AffineTransform::IDENTITY,
            output_to_frame: AffineTransform::IDENTITY,
            sequence: 0,
            captured_at: Instant::now(),
        };
        assert_eq!(frame.as_bytes().len(), 8);

        let image = frame.to_rgba_image().expect("buffer matches dimensions");
        // 0xFF00FF00 is opaque green in ARGB packing
        assert_eq!(image.get_pixel(0, 0).0, [0, 255, 0, 255]);
        // 0xFFFF0000 is opaque red
        assert_eq!(image.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }
}
