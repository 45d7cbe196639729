// SPDX-License-Identifier: GPL-3.0-only

//! Sensor + device orientation tracking
//!
//! The orientation sensor reports a continuous angle on its own dispatch
//! context while the capture thread reads the combined rotation once per
//! frame. Both values are single-word atomics, so neither side ever blocks
//! the other.

use crate::constants::orientation;
use std::sync::atomic::{AtomicU32, Ordering};

/// Tracks the fixed sensor mounting angle and the live device-orientation
/// bucket, and combines them into a per-frame total rotation.
#[derive(Debug, Default)]
pub struct RotationTracker {
    /// Set once when the capture device is opened
    sensor_orientation: AtomicU32,
    /// Updated by the orientation listener, read by the capture thread
    device_rotation: AtomicU32,
}

impl RotationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the sensor mounting angle reported by device characteristics
    pub fn set_sensor_orientation(&self, degrees: u32) {
        self.sensor_orientation.store(degrees % 360, Ordering::Relaxed);
    }

    /// Feed one raw orientation-sensor event (0..=359 degrees).
    ///
    /// The angle is bucketed into one of four 90°-wide ranges offset by 45°
    /// from the cardinal boundaries; boundary angles resolve to the upper
    /// bucket.
    pub fn on_orientation_changed(&self, angle_degrees: u32) {
        let angle = angle_degrees % 360;
        let bucket = if (orientation::QUADRANT_270.0..=orientation::QUADRANT_270.1).contains(&angle)
        {
            270
        } else if (orientation::QUADRANT_180.0..=orientation::QUADRANT_180.1).contains(&angle) {
            180
        } else if (orientation::QUADRANT_90.0..=orientation::QUADRANT_90.1).contains(&angle) {
            90
        } else {
            0
        };
        self.device_rotation.store(bucket, Ordering::Relaxed);
    }

    /// The current device-rotation bucket, one of {0, 90, 180, 270}
    pub fn device_rotation(&self) -> u32 {
        self.device_rotation.load(Ordering::Relaxed)
    }

    /// Combined rotation needed to present a frame upright.
    ///
    /// `(sensor - device + 360) % 360`; always one of {0, 90, 180, 270},
    /// never negative.
    pub fn total_rotation(&self) -> u32 {
        let sensor = self.sensor_orientation.load(Ordering::Relaxed);
        let device = self.device_rotation.load(Ordering::Relaxed);
        (sensor + 360 - device) % 360
    }
}
