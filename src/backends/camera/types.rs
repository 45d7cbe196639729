// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for capture backends

use std::sync::Arc;

/// One plane of a raw sensor frame.
///
/// The buffer is borrowed from the capture subsystem and is only valid for
/// the duration of the per-frame callback; anything the pipeline needs past
/// that point must be copied out (which is exactly what the converter does).
#[derive(Debug, Clone, Copy)]
pub struct RawPlane<'a> {
    /// Plane bytes as delivered by the device
    pub data: &'a [u8],
    /// Byte offset between the start of consecutive rows (may exceed the
    /// row width due to padding)
    pub row_stride: usize,
    /// Byte offset between consecutive samples within a row (greater than 1
    /// when channels are interleaved in the source)
    pub pixel_stride: usize,
}

/// A raw three-plane YUV 4:2:0 frame.
///
/// `width`/`height` describe the Y plane; the U and V planes are subsampled
/// by exactly 2 in both dimensions.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    pub width: usize,
    pub height: usize,
    pub y: RawPlane<'a>,
    pub u: RawPlane<'a>,
    pub v: RawPlane<'a>,
}

impl RawFrame<'_> {
    /// Byte length of the packed NV21 buffer this frame converts into
    pub fn nv21_len(&self) -> usize {
        self.width * self.height + 2 * (self.width / 2) * (self.height / 2)
    }
}

/// Pixel layout of a frame travelling through the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// Packed NV21: full Y plane followed by interleaved V/U pairs
    Nv21,
    /// Packed 4-byte-per-pixel RGBA (output of the processing boundary)
    Rgba,
}

impl FrameFormat {
    /// Exact buffer length this format requires for the given dimensions
    pub fn expected_len(&self, width: u32, height: u32) -> usize {
        let (w, h) = (width as usize, height as usize);
        match self {
            FrameFormat::Nv21 => w * h + 2 * (w / 2) * (h / 2),
            FrameFormat::Rgba => w * h * 4,
        }
    }
}

/// A converted frame handed from the capture thread to the renderer.
///
/// The buffer length always matches `format.expected_len(width, height)`;
/// frames are never exposed partially filled.
#[derive(Debug, Clone)]
pub struct PipelineFrame {
    pub data: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    /// Total rotation in degrees, one of {0, 90, 180, 270}
    pub rotation: u32,
    pub format: FrameFormat,
}

impl PipelineFrame {
    /// Build an NV21 frame from a freshly converted buffer.
    ///
    /// Returns `None` when the buffer does not match the packed NV21 length
    /// for the given dimensions.
    pub fn nv21(data: Vec<u8>, width: u32, height: u32, rotation: u32) -> Option<Self> {
        if data.len() != FrameFormat::Nv21.expected_len(width, height) {
            return None;
        }
        Some(Self {
            data: Arc::from(data),
            width,
            height,
            rotation,
            format: FrameFormat::Nv21,
        })
    }

    /// Build an RGBA frame from a processed buffer
    pub fn rgba(data: Vec<u8>, width: u32, height: u32, rotation: u32) -> Option<Self> {
        if data.len() != FrameFormat::Rgba.expected_len(width, height) {
            return None;
        }
        Some(Self {
            data: Arc::from(data),
            width,
            height,
            rotation,
            format: FrameFormat::Rgba,
        })
    }
}

/// Physical placement of a camera on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    /// Rear-facing (preferred for capture)
    Back,
    /// Front-facing
    Front,
    /// External / unknown placement
    #[default]
    External,
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Back => write!(f, "back"),
            Facing::Front => write!(f, "front"),
            Facing::External => write!(f, "external"),
        }
    }
}

/// A capture device as reported by backend enumeration
#[derive(Debug, Clone)]
pub struct CameraDescriptor {
    pub id: String,
    pub name: String,
    pub facing: Facing,
    /// Fixed mounting angle of the sensor, degrees clockwise (0/90/180/270)
    pub sensor_orientation: u32,
}

impl std::fmt::Display for CameraDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] ({}, sensor {}°)",
            self.id, self.name, self.facing, self.sensor_orientation
        )
    }
}

/// Requested capture session format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFormat {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_len() {
        assert_eq!(FrameFormat::Nv21.expected_len(640, 480), 640 * 480 * 3 / 2);
        assert_eq!(FrameFormat::Rgba.expected_len(640, 480), 640 * 480 * 4);
        // Odd dimensions round chroma down
        assert_eq!(FrameFormat::Nv21.expected_len(5, 3), 15 + 2 * 2 * 1);
    }

    #[test]
    fn test_frame_constructors_reject_bad_lengths() {
        assert!(PipelineFrame::nv21(vec![0u8; 11], 4, 2, 0).is_none());
        assert!(PipelineFrame::nv21(vec![0u8; 12], 4, 2, 0).is_some());
        assert!(PipelineFrame::rgba(vec![0u8; 31], 4, 2, 90).is_none());
        assert!(PipelineFrame::rgba(vec![0u8; 32], 4, 2, 90).is_some());
    }
}
