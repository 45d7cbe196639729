// SPDX-License-Identifier: GPL-3.0-only

//! External pixel-processing boundary
//!
//! The pipeline hands a packed NV21 buffer across this seam and takes back
//! either the same-shape buffer (pass-through), a 4-byte-per-pixel RGBA
//! buffer, or nothing. The result is treated as opaque: an absent or
//! wrong-sized buffer just means that frame is skipped.

pub mod edges;

pub use edges::SobelEdges;

/// Result of one trip through the processing boundary
#[derive(Debug, Clone)]
pub enum ProcessedFrame {
    /// Unmodified packed NV21, same shape as the input
    PassThrough(Vec<u8>),
    /// Processed RGBA output, `width * height * 4` bytes
    Rgba(Vec<u8>),
}

/// A pixel-processing engine plugged into the pipeline.
///
/// Implementations run synchronously on the capture thread and must be
/// bounded; returning `None` signals "no usable result for this frame".
pub trait FrameProcessor: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &str;

    /// Transform one packed NV21 frame
    fn process(
        &self,
        nv21: &[u8],
        width: u32,
        height: u32,
        rotation: u32,
    ) -> Option<ProcessedFrame>;
}

/// Processor that returns its input unchanged
#[derive(Debug, Default)]
pub struct Passthrough;

impl FrameProcessor for Passthrough {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn process(
        &self,
        nv21: &[u8],
        _width: u32,
        _height: u32,
        _rotation: u32,
    ) -> Option<ProcessedFrame> {
        Some(ProcessedFrame::PassThrough(nv21.to_vec()))
    }
}
