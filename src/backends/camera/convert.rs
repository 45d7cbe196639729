// SPDX-License-Identifier: GPL-3.0-only

//! YUV 4:2:0 three-plane to packed NV21 conversion
//!
//! Capture devices deliver frames as three independently-strided planes;
//! the rest of the pipeline works on a single packed buffer. Conversion is
//! tolerant of padded row strides and interleaved pixel strides, and reads
//! that would fall past the end of a source plane are substituted with zero
//! rather than faulting the capture thread.

use super::types::RawFrame;
use tracing::warn;

/// Convert a three-plane YUV 4:2:0 frame into a packed NV21 buffer.
///
/// The output is `width*height` luma bytes followed by interleaved (V, U)
/// pairs, one pair per 2x2 chroma block, for a total of
/// `width*height + 2*(width/2)*(height/2)` bytes.
///
/// A zero-length return is the "conversion failed, drop this frame"
/// sentinel, produced when a plane's geometry is malformed (the buffer
/// cannot cover its last addressable sample). This function never panics on
/// device-supplied geometry.
pub fn yuv420_to_nv21(frame: &RawFrame<'_>) -> Vec<u8> {
    let width = frame.width;
    let height = frame.height;

    if width == 0 || height == 0 {
        warn!(width, height, "Rejecting degenerate frame dimensions");
        return Vec::new();
    }

    if !plane_covers(frame.y.data.len(), frame.y.row_stride, frame.y.pixel_stride, width, height) {
        warn!(
            len = frame.y.data.len(),
            row_stride = frame.y.row_stride,
            pixel_stride = frame.y.pixel_stride,
            "Y plane buffer too short for its geometry"
        );
        return Vec::new();
    }

    let y_size = width * height;
    let chroma_width = width / 2;
    let chroma_height = height / 2;
    let mut nv21 = vec![0u8; y_size + 2 * chroma_width * chroma_height];

    copy_luma(frame, &mut nv21[..y_size]);
    interleave_chroma(frame, &mut nv21[y_size..]);

    nv21
}

/// True when a plane buffer covers its last addressable sample
fn plane_covers(len: usize, row_stride: usize, pixel_stride: usize, cols: usize, rows: usize) -> bool {
    if rows == 0 || cols == 0 {
        return false;
    }
    let last = (rows - 1) * row_stride + (cols - 1) * pixel_stride;
    len > last
}

/// Copy the full-resolution Y plane into the start of the output.
///
/// Tightly packed planes take a single bulk copy; anything else walks every
/// sample through its strides. The bulk path is purely an optimization and
/// both paths produce identical bytes.
fn copy_luma(frame: &RawFrame<'_>, out: &mut [u8]) {
    let width = frame.width;
    let height = frame.height;
    let plane = &frame.y;

    if plane.pixel_stride == 1 && plane.row_stride == width && plane.data.len() >= width * height {
        out.copy_from_slice(&plane.data[..width * height]);
        return;
    }

    for row in 0..height {
        let row_base = row * plane.row_stride;
        let out_row = &mut out[row * width..(row + 1) * width];
        for (col, slot) in out_row.iter_mut().enumerate() {
            let pos = row_base + col * plane.pixel_stride;
            *slot = plane.data.get(pos).copied().unwrap_or(0);
        }
    }
}

/// Write interleaved (V, U) chroma pairs after the luma block.
///
/// Subsampled planes are rarely contiguous in practice, so this path always
/// walks strides explicitly; positions past a plane's end read as zero.
fn interleave_chroma(frame: &RawFrame<'_>, out: &mut [u8]) {
    let chroma_width = frame.width / 2;
    let chroma_height = frame.height / 2;

    for row in 0..chroma_height {
        let u_base = row * frame.u.row_stride;
        let v_base = row * frame.v.row_stride;
        // Output rows are 2*chroma_width bytes; for odd frame widths that is
        // one byte less than `width`, so the base must not use `width`
        let out_base = row * 2 * chroma_width;

        for col in 0..chroma_width {
            let v_pos = v_base + col * frame.v.pixel_stride;
            let u_pos = u_base + col * frame.u.pixel_stride;
            // NV21 pair order: V first, then U
            out[out_base + col * 2] = frame.v.data.get(v_pos).copied().unwrap_or(0);
            out[out_base + col * 2 + 1] = frame.u.data.get(u_pos).copied().unwrap_or(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::RawPlane;

    fn frame<'a>(
        width: usize,
        height: usize,
        y: RawPlane<'a>,
        u: RawPlane<'a>,
        v: RawPlane<'a>,
    ) -> RawFrame<'a> {
        RawFrame {
            width,
            height,
            y,
            u,
            v,
        }
    }

    #[test]
    fn test_tight_luma_is_byte_for_byte() {
        let y: Vec<u8> = (0..32u8).collect();
        let u = vec![100u8; 8];
        let v = vec![200u8; 8];
        let f = frame(
            8,
            4,
            RawPlane { data: &y, row_stride: 8, pixel_stride: 1 },
            RawPlane { data: &u, row_stride: 4, pixel_stride: 1 },
            RawPlane { data: &v, row_stride: 4, pixel_stride: 1 },
        );

        let out = yuv420_to_nv21(&f);
        assert_eq!(out.len(), 32 + 16);
        assert_eq!(&out[..32], y.as_slice());
    }

    #[test]
    fn test_4x2_interleave_vector() {
        let y = vec![0u8, 1, 2, 3, 4, 5, 6, 7];
        let u = vec![10u8, 11];
        let v = vec![20u8, 21];
        let f = frame(
            4,
            2,
            RawPlane { data: &y, row_stride: 4, pixel_stride: 1 },
            RawPlane { data: &u, row_stride: 2, pixel_stride: 1 },
            RawPlane { data: &v, row_stride: 2, pixel_stride: 1 },
        );

        let out = yuv420_to_nv21(&f);
        assert_eq!(out, vec![0, 1, 2, 3, 4, 5, 6, 7, 20, 10, 21, 11]);
    }

    #[test]
    fn test_padded_row_stride_skips_padding() {
        // 4x2 luma with 2 bytes of row padding; padding bytes are 0xEE
        let y = vec![0u8, 1, 2, 3, 0xEE, 0xEE, 4, 5, 6, 7, 0xEE, 0xEE];
        let u = vec![10u8, 11];
        let v = vec![20u8, 21];
        let f = frame(
            4,
            2,
            RawPlane { data: &y, row_stride: 6, pixel_stride: 1 },
            RawPlane { data: &u, row_stride: 2, pixel_stride: 1 },
            RawPlane { data: &v, row_stride: 2, pixel_stride: 1 },
        );

        let out = yuv420_to_nv21(&f);
        assert_eq!(&out[..8], &[0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_pixel_stride_two_chroma() {
        // Camera2-style semi-planar source: chroma samples interleaved with
        // pixel stride 2 inside each plane view
        let y: Vec<u8> = (0..8u8).collect();
        let u = vec![10u8, 0xEE, 11u8];
        let v = vec![20u8, 0xEE, 21u8];
        let f = frame(
            4,
            2,
            RawPlane { data: &y, row_stride: 4, pixel_stride: 1 },
            RawPlane { data: &u, row_stride: 4, pixel_stride: 2 },
            RawPlane { data: &v, row_stride: 4, pixel_stride: 2 },
        );

        let out = yuv420_to_nv21(&f);
        assert_eq!(&out[8..], &[20, 10, 21, 11]);
    }

    #[test]
    fn test_odd_width_rounds_chroma_down() {
        // 5x4 luma: chroma grid rounds down to 2x2, output is 20 + 8 bytes
        let y: Vec<u8> = (0..20u8).collect();
        let u = vec![10u8, 11, 12, 13];
        let v = vec![20u8, 21, 22, 23];
        let f = frame(
            5,
            4,
            RawPlane { data: &y, row_stride: 5, pixel_stride: 1 },
            RawPlane { data: &u, row_stride: 2, pixel_stride: 1 },
            RawPlane { data: &v, row_stride: 2, pixel_stride: 1 },
        );

        let out = yuv420_to_nv21(&f);
        assert_eq!(out.len(), 20 + 8);
        assert_eq!(&out[..20], y.as_slice());
        assert_eq!(&out[20..], &[20, 10, 21, 11, 22, 12, 23, 13]);
    }

    #[test]
    fn test_odd_both_dimensions() {
        let y = vec![7u8; 5 * 3];
        let u = vec![10u8, 11];
        let v = vec![20u8, 21];
        let f = frame(
            5,
            3,
            RawPlane { data: &y, row_stride: 5, pixel_stride: 1 },
            RawPlane { data: &u, row_stride: 2, pixel_stride: 1 },
            RawPlane { data: &v, row_stride: 2, pixel_stride: 1 },
        );

        let out = yuv420_to_nv21(&f);
        assert_eq!(out.len(), 15 + 4);
        assert_eq!(&out[15..], &[20, 10, 21, 11]);
    }

    #[test]
    fn test_malformed_y_plane_returns_empty() {
        // 4 rows at stride 4 need 16 bytes; give 10
        let y = vec![0u8; 10];
        let u = vec![0u8; 4];
        let v = vec![0u8; 4];
        let f = frame(
            4,
            4,
            RawPlane { data: &y, row_stride: 4, pixel_stride: 1 },
            RawPlane { data: &u, row_stride: 2, pixel_stride: 1 },
            RawPlane { data: &v, row_stride: 2, pixel_stride: 1 },
        );

        assert!(yuv420_to_nv21(&f).is_empty());
    }

    #[test]
    fn test_short_chroma_substitutes_zero() {
        let y: Vec<u8> = (0..8u8).collect();
        // Only one chroma sample present where two are addressed
        let u = vec![10u8];
        let v = vec![20u8];
        let f = frame(
            4,
            2,
            RawPlane { data: &y, row_stride: 4, pixel_stride: 1 },
            RawPlane { data: &u, row_stride: 2, pixel_stride: 1 },
            RawPlane { data: &v, row_stride: 2, pixel_stride: 1 },
        );

        let out = yuv420_to_nv21(&f);
        assert_eq!(&out[8..], &[20, 10, 0, 0]);
    }

    #[test]
    fn test_conversion_is_idempotent() {
        let y: Vec<u8> = (0..64u8).map(|v| v.wrapping_mul(3)).collect();
        let u: Vec<u8> = (0..16u8).collect();
        let v: Vec<u8> = (16..32u8).collect();
        let f = frame(
            8,
            8,
            RawPlane { data: &y, row_stride: 8, pixel_stride: 1 },
            RawPlane { data: &u, row_stride: 4, pixel_stride: 1 },
            RawPlane { data: &v, row_stride: 4, pixel_stride: 1 },
        );

        assert_eq!(yuv420_to_nv21(&f), yuv420_to_nv21(&f));
    }
}
