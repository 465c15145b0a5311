// SPDX-License-Identifier: GPL-3.0-only

//! Crop/rotate transform derivation
//!
//! Computes the affine map that places a source frame onto the destination
//! canvas: optional horizontal mirror, rotation about the source center,
//! crop-to-fill scaling and centering. The inverse map is computed alongside
//! and handed to consumers for reverse coordinate mapping (e.g. translating
//! a tap on the output image back to sensor coordinates).

use crate::errors::FrameError;
use crate::frame::Rotation;

/// A 2D affine map: `x' = a*x + b*y + tx`, `y' = d*x + e*y + ty`
///
/// Coefficients are stored row-major as `[a, b, tx, d, e, ty]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub m: [f32; 6],
}

impl AffineTransform {
    pub const IDENTITY: Self = Self {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
    };

    pub fn translation(tx: f32, ty: f32) -> Self {
        Self {
            m: [1.0, 0.0, tx, 0.0, 1.0, ty],
        }
    }

    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self {
            m: [sx, 0.0, 0.0, 0.0, sy, 0.0],
        }
    }

    /// Clockwise rotation about the origin (y axis points down)
    ///
    /// Quarter turns only, so the coefficients are exact integers and no
    /// trigonometric error accumulates across compositions.
    pub fn rotation(rotation: Rotation) -> Self {
        let (cos, sin) = match rotation {
            Rotation::None => (1.0, 0.0),
            Rotation::Rotate90 => (0.0, 1.0),
            Rotation::Rotate180 => (-1.0, 0.0),
            Rotation::Rotate270 => (0.0, -1.0),
        };
        Self {
            m: [cos, -sin, 0.0, sin, cos, 0.0],
        }
    }

    /// Compose: apply `self` first, then `next`
    pub fn then(&self, next: &Self) -> Self {
        let [a1, b1, tx1, d1, e1, ty1] = self.m;
        let [a2, b2, tx2, d2, e2, ty2] = next.m;
        Self {
            m: [
                a2 * a1 + b2 * d1,
                a2 * b1 + b2 * e1,
                a2 * tx1 + b2 * ty1 + tx2,
                d2 * a1 + e2 * d1,
                d2 * b1 + e2 * e1,
                d2 * tx1 + e2 * ty1 + ty2,
            ],
        }
    }

    /// Map a point through the transform
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, tx, d, e, ty] = self.m;
        (a * x + b * y + tx, d * x + e * y + ty)
    }

    /// Matrix inverse, `None` if the transform is degenerate
    pub fn invert(&self) -> Option<Self> {
        let [a, b, tx, d, e, ty] = self.m;
        let det = a * e - b * d;
        if det.abs() < f32::EPSILON {
            return None;
        }
        Some(Self {
            m: [
                e / det,
                -b / det,
                (b * ty - e * tx) / det,
                -d / det,
                a / det,
                (d * tx - a * ty) / det,
            ],
        })
    }
}

/// Everything the transform depends on; a change in any field invalidates
/// the cached pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformParams {
    pub src_width: u32,
    pub src_height: u32,
    pub dst_width: u32,
    pub dst_height: u32,
    pub rotation: Rotation,
    pub mirror: bool,
}

/// Forward (source to output) transform together with its inverse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformPair {
    pub forward: AffineTransform,
    pub inverse: AffineTransform,
}

/// Compute the frame-to-output transform and its inverse
///
/// Build order: mirror about the source center (front-facing correction),
/// rotate about the center, scale uniformly by the larger of the two axis
/// ratios (crop-to-fill: the destination is always fully covered, content
/// outside it is cropped), then center on the destination canvas.
pub fn compute_transform(params: TransformParams) -> Result<TransformPair, FrameError> {
    if params.src_width == 0 || params.src_height == 0 {
        return Err(FrameError::InvalidGeometry {
            width: params.src_width,
            height: params.src_height,
        });
    }
    if params.dst_width == 0 || params.dst_height == 0 {
        return Err(FrameError::InvalidGeometry {
            width: params.dst_width,
            height: params.dst_height,
        });
    }

    let src_w = params.src_width as f32;
    let src_h = params.src_height as f32;
    let dst_w = params.dst_width as f32;
    let dst_h = params.dst_height as f32;

    // Rotation by 90/270 swaps the bounding box the scale is computed against
    let (effective_w, effective_h) = if params.rotation.swaps_dimensions() {
        (src_h, src_w)
    } else {
        (src_w, src_h)
    };
    let scale = (dst_w / effective_w).max(dst_h / effective_h);

    let mut forward = AffineTransform::translation(-src_w / 2.0, -src_h / 2.0);
    if params.mirror {
        forward = forward.then(&AffineTransform::scaling(-1.0, 1.0));
    }
    forward = forward
        .then(&AffineTransform::rotation(params.rotation))
        .then(&AffineTransform::scaling(scale, scale))
        .then(&AffineTransform::translation(dst_w / 2.0, dst_h / 2.0));

    let inverse = forward
        .invert()
        .ok_or_else(|| FrameError::Conversion("transform is not invertible".to_string()))?;

    Ok(TransformPair { forward, inverse })
}

/// Parameter-keyed cache around [`compute_transform`]
///
/// Skipping recomputation is an optimization only; recomputing every frame
/// produces an identical pair. The cache guarantees the inverse handed out
/// always belongs to the forward transform it is paired with.
#[derive(Debug, Default)]
pub struct TransformCache {
    cached: Option<(TransformParams, TransformPair)>,
    recomputes: u64,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the pair for `params`, recomputing only when they changed
    pub fn get(&mut self, params: TransformParams) -> Result<TransformPair, FrameError> {
        if let Some((cached_params, pair)) = &self.cached
            && *cached_params == params
        {
            return Ok(*pair);
        }
        let pair = compute_transform(params)?;
        self.cached = Some((params, pair));
        self.recomputes += 1;
        Ok(pair)
    }

    /// How many times the pair has actually been recomputed
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(
        src: (u32, u32),
        dst: (u32, u32),
        rotation: Rotation,
        mirror: bool,
    ) -> TransformParams {
        TransformParams {
            src_width: src.0,
            src_height: src.1,
            dst_width: dst.0,
            dst_height: dst.1,
            rotation,
            mirror,
        }
    }

    #[test]
    fn test_identity_when_nothing_changes() {
        let pair = compute_transform(params((640, 480), (640, 480), Rotation::None, false))
            .expect("valid geometry");
        for (forward, identity) in pair.forward.m.iter().zip(AffineTransform::IDENTITY.m) {
            assert!((forward - identity).abs() < 1e-5);
        }
    }

    #[test]
    fn test_rotate_90_moves_top_left_to_top_right() {
        let pair = compute_transform(params((100, 50), (50, 100), Rotation::Rotate90, false))
            .expect("valid geometry");
        let (x, y) = pair.forward.apply(0.0, 0.0);
        assert!((x - 50.0).abs() < 1e-4);
        assert!(y.abs() < 1e-4);
    }

    #[test]
    fn test_crop_to_fill_uses_larger_scale() {
        // 400x300 source into a 200x200 destination: the height ratio (2/3)
        // exceeds the width ratio (1/2), so rows are cropped, columns are not.
        let pair = compute_transform(params((400, 300), (200, 200), Rotation::None, false))
            .expect("valid geometry");
        let (left, _) = pair.forward.apply(0.0, 150.0);
        let (right, _) = pair.forward.apply(400.0, 150.0);
        assert!(left < 0.0, "left edge cropped off canvas: {}", left);
        assert!(right > 200.0, "right edge cropped off canvas: {}", right);
        let (_, top) = pair.forward.apply(200.0, 0.0);
        let (_, bottom) = pair.forward.apply(200.0, 300.0);
        assert!(top.abs() < 1e-3 && (bottom - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_mirror_flips_horizontally() {
        let pair = compute_transform(params((100, 100), (100, 100), Rotation::None, true))
            .expect("valid geometry");
        let (x, y) = pair.forward.apply(0.0, 0.0);
        assert!((x - 100.0).abs() < 1e-4);
        assert!(y.abs() < 1e-4);
    }

    #[test]
    fn test_zero_source_dimension_is_invalid() {
        let result = compute_transform(params((0, 480), (640, 480), Rotation::None, false));
        assert!(matches!(result, Err(FrameError::InvalidGeometry { .. })));
    }

    #[test]
    fn test_cache_skips_recompute_for_same_params() {
        let mut cache = TransformCache::new();
        let p = params((640, 480), (320, 240), Rotation::Rotate180, false);
        let first = cache.get(p).expect("valid geometry");
        let second = cache.get(p).expect("valid geometry");
        assert_eq!(first, second);
        assert_eq!(cache.recompute_count(), 1);

        let rotated = params((640, 480), (320, 240), Rotation::Rotate90, false);
        cache.get(rotated).expect("valid geometry");
        assert_eq!(cache.recompute_count(), 2);
    }
}
