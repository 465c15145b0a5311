// SPDX-License-Identifier: GPL-3.0-only

//! Sensor/device orientation tracking
//!
//! Reduces {sensor orientation, device rotation, facing} to the single
//! effective rotation (plus mirror flag) consumed by the transform
//! calculator. Front sensors present a mirrored image relative to the
//! device's natural viewing orientation, hence the asymmetric formulas.

use crate::frame::{Facing, Rotation};

/// The rotation and mirroring a frame needs to appear upright to the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveOrientation {
    pub rotation: Rotation,
    pub mirror: bool,
}

/// Tracks orientation state between explicit change notifications
///
/// Mutated only by the pipeline's setter entry points (never polled per
/// frame); the frame processor reads it under its mutual-exclusion boundary
/// so a processing cycle started after an update always observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrientationTracker {
    sensor_orientation: Rotation,
    device_rotation: Rotation,
    facing: Facing,
}

impl OrientationTracker {
    pub fn new(sensor_orientation: Rotation, facing: Facing) -> Self {
        Self {
            sensor_orientation,
            device_rotation: Rotation::None,
            facing,
        }
    }

    /// Update the sensor's mount orientation and facing, returning whether
    /// anything changed (setters are idempotent)
    pub fn set_sensor(&mut self, orientation: Rotation, facing: Facing) -> bool {
        let changed = self.sensor_orientation != orientation || self.facing != facing;
        self.sensor_orientation = orientation;
        self.facing = facing;
        changed
    }

    /// Update the device's current rotation, returning whether it changed
    pub fn set_device_rotation(&mut self, rotation: Rotation) -> bool {
        let changed = self.device_rotation != rotation;
        self.device_rotation = rotation;
        changed
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Effective rotation for the current state
    ///
    /// Back-facing: `(sensor - device + 360) mod 360`.
    /// Front-facing: `(360 - ((sensor + device) mod 360)) mod 360`, mirrored.
    pub fn effective(&self) -> EffectiveOrientation {
        let sensor = self.sensor_orientation.degrees() as i32;
        let device = self.device_rotation.degrees() as i32;
        match self.facing {
            Facing::Back => EffectiveOrientation {
                rotation: Rotation::from_degrees_int(sensor - device),
                mirror: false,
            },
            Facing::Front => EffectiveOrientation {
                rotation: Rotation::from_degrees_int(360 - (sensor + device).rem_euclid(360)),
                mirror: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_facing_formula() {
        let mut tracker = OrientationTracker::new(Rotation::Rotate90, Facing::Back);
        assert_eq!(
            tracker.effective(),
            EffectiveOrientation {
                rotation: Rotation::Rotate90,
                mirror: false
            }
        );

        tracker.set_device_rotation(Rotation::Rotate270);
        // (90 - 270 + 360) % 360 = 180
        assert_eq!(tracker.effective().rotation, Rotation::Rotate180);
    }

    #[test]
    fn test_front_facing_formula_mirrors() {
        let mut tracker = OrientationTracker::new(Rotation::Rotate90, Facing::Front);
        // (360 - (90 + 0) % 360) % 360 = 270
        assert_eq!(
            tracker.effective(),
            EffectiveOrientation {
                rotation: Rotation::Rotate270,
                mirror: true
            }
        );

        tracker.set_device_rotation(Rotation::Rotate90);
        // (360 - (90 + 90) % 360) % 360 = 180
        assert_eq!(tracker.effective().rotation, Rotation::Rotate180);
        assert!(tracker.effective().mirror);
    }

    #[test]
    fn test_facing_switch_changes_formula() {
        let mut tracker = OrientationTracker::new(Rotation::Rotate90, Facing::Back);
        assert_eq!(tracker.effective().rotation, Rotation::Rotate90);

        assert!(tracker.set_sensor(Rotation::Rotate90, Facing::Front));
        let effective = tracker.effective();
        assert_eq!(effective.rotation, Rotation::Rotate270);
        assert!(effective.mirror);
    }

    #[test]
    fn test_setters_are_idempotent() {
        let mut tracker = OrientationTracker::new(Rotation::None, Facing::Back);
        assert!(!tracker.set_sensor(Rotation::None, Facing::Back));
        assert!(!tracker.set_device_rotation(Rotation::None));
        assert!(tracker.set_device_rotation(Rotation::Rotate90));
        assert!(!tracker.set_device_rotation(Rotation::Rotate90));
    }

    #[test]
    fn test_front_facing_zero_sums() {
        let mut tracker = OrientationTracker::new(Rotation::None, Facing::Front);
        // (360 - 0) % 360 must normalise back to 0
        assert_eq!(tracker.effective().rotation, Rotation::None);

        tracker.set_sensor(Rotation::Rotate180, Facing::Front);
        tracker.set_device_rotation(Rotation::Rotate180);
        assert_eq!(tracker.effective().rotation, Rotation::None);
    }
}
