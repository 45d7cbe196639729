// SPDX-License-Identifier: GPL-3.0-only

//! CPU Sobel edge detector
//!
//! Stands in for an external edge-detection engine: consumes the luma plane
//! of a packed NV21 buffer and produces a white-on-black RGBA edge map.

use super::{FrameProcessor, ProcessedFrame};

/// Gradient magnitudes at or above this value become white pixels
const DEFAULT_THRESHOLD: u16 = 96;

/// Sobel 3x3 edge detector over the NV21 luma plane
#[derive(Debug, Clone, Copy)]
pub struct SobelEdges {
    threshold: u16,
}

impl SobelEdges {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(threshold: u16) -> Self {
        Self { threshold }
    }
}

impl Default for SobelEdges {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameProcessor for SobelEdges {
    fn name(&self) -> &str {
        "sobel-edges"
    }

    fn process(
        &self,
        nv21: &[u8],
        width: u32,
        height: u32,
        _rotation: u32,
    ) -> Option<ProcessedFrame> {
        let w = width as usize;
        let h = height as usize;
        if w == 0 || h == 0 || nv21.len() < w * h {
            return None;
        }

        let luma = &nv21[..w * h];
        let mut rgba = vec![0u8; w * h * 4];

        // Border pixels stay black; the 3x3 kernels need a full neighborhood
        for row in 1..h.saturating_sub(1) {
            for col in 1..w - 1 {
                let p = |dr: isize, dc: isize| -> i32 {
                    let r = (row as isize + dr) as usize;
                    let c = (col as isize + dc) as usize;
                    luma[r * w + c] as i32
                };

                let gx = -p(-1, -1) + p(-1, 1) - 2 * p(0, -1) + 2 * p(0, 1) - p(1, -1) + p(1, 1);
                let gy = -p(-1, -1) - 2 * p(-1, 0) - p(-1, 1) + p(1, -1) + 2 * p(1, 0) + p(1, 1);
                let magnitude = ((gx.abs() + gy.abs()) / 4) as u16;

                if magnitude >= self.threshold {
                    let idx = (row * w + col) * 4;
                    rgba[idx] = 255;
                    rgba[idx + 1] = 255;
                    rgba[idx + 2] = 255;
                }
            }
        }

        // Opaque alpha everywhere
        for px in rgba.chunks_exact_mut(4) {
            px[3] = 255;
        }

        Some(ProcessedFrame::Rgba(rgba))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nv21_from_luma(luma: &[u8], width: usize, height: usize) -> Vec<u8> {
        let mut buf = luma.to_vec();
        buf.resize(width * height + 2 * (width / 2) * (height / 2), 128);
        buf
    }

    #[test]
    fn test_flat_frame_has_no_edges() {
        let luma = vec![100u8; 8 * 8];
        let nv21 = nv21_from_luma(&luma, 8, 8);

        let out = SobelEdges::new().process(&nv21, 8, 8, 0).unwrap();
        let ProcessedFrame::Rgba(rgba) = out else {
            panic!("expected RGBA output");
        };
        assert_eq!(rgba.len(), 8 * 8 * 4);
        // No white pixels, only opaque alpha
        for px in rgba.chunks_exact(4) {
            assert_eq!(&px[..3], &[0, 0, 0]);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn test_vertical_step_produces_edge() {
        // Left half dark, right half bright
        let mut luma = vec![0u8; 8 * 8];
        for row in 0..8 {
            for col in 4..8 {
                luma[row * 8 + col] = 255;
            }
        }
        let nv21 = nv21_from_luma(&luma, 8, 8);

        let out = SobelEdges::new().process(&nv21, 8, 8, 0).unwrap();
        let ProcessedFrame::Rgba(rgba) = out else {
            panic!("expected RGBA output");
        };
        // The step column lights up away from the border rows
        let idx = (4 * 8 + 4) * 4;
        assert_eq!(rgba[idx], 255);
    }

    #[test]
    fn test_undersized_buffer_is_absent() {
        assert!(SobelEdges::new().process(&[0u8; 10], 8, 8, 0).is_none());
    }
}
