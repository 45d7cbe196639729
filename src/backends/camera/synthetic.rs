// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic capture backend
//!
//! Generates a moving test pattern with the same plane geometry a real
//! sensor delivers: padded luma rows and interleaved chroma samples with a
//! pixel stride of 2. Used by the demo binary and the integration tests so
//! the full pipeline runs without camera hardware.

use super::types::{CameraDescriptor, CaptureFormat, Facing, RawFrame, RawPlane};
use super::{CaptureBackend, CaptureSession};
use crate::constants::synthetic;
use crate::errors::CameraError;
use std::time::Instant;
use tracing::{debug, info};

/// Backend producing synthetic devices and frames
pub struct SyntheticBackend {
    devices: Vec<CameraDescriptor>,
}

impl SyntheticBackend {
    /// Backend with a rear and a front device, sensor-mounted at 90°/270°
    /// like typical phone modules
    pub fn new() -> Self {
        Self {
            devices: vec![
                CameraDescriptor {
                    id: "synthetic-0".into(),
                    name: "Synthetic rear sensor".into(),
                    facing: Facing::Back,
                    sensor_orientation: 90,
                },
                CameraDescriptor {
                    id: "synthetic-1".into(),
                    name: "Synthetic front sensor".into(),
                    facing: Facing::Front,
                    sensor_orientation: 270,
                },
            ],
        }
    }

    /// Backend that enumerates nothing (exercises the no-device path)
    pub fn without_devices() -> Self {
        Self { devices: Vec::new() }
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for SyntheticBackend {
    fn enumerate(&mut self) -> Vec<CameraDescriptor> {
        self.devices.clone()
    }

    fn open(
        &mut self,
        device: &CameraDescriptor,
        format: &CaptureFormat,
    ) -> Result<Box<dyn CaptureSession>, CameraError> {
        if !self.devices.iter().any(|d| d.id == device.id) {
            return Err(CameraError::OpenFailed(format!(
                "unknown device {}",
                device.id
            )));
        }
        if format.width == 0 || format.height == 0 || format.width % 2 != 0 || format.height % 2 != 0
        {
            return Err(CameraError::ConfigureFailed(format!(
                "unsupported format {}",
                format
            )));
        }

        info!(device = %device, format = %format, "Opening synthetic session");
        Ok(Box::new(SyntheticSession::new(
            format.width as usize,
            format.height as usize,
        )))
    }
}

/// One streaming synthetic session
struct SyntheticSession {
    width: usize,
    height: usize,
    y_row_stride: usize,
    chroma_row_stride: usize,
    y_buf: Vec<u8>,
    u_buf: Vec<u8>,
    v_buf: Vec<u8>,
    frame_index: u64,
    last_frame: Option<Instant>,
    closed: bool,
}

impl SyntheticSession {
    fn new(width: usize, height: usize) -> Self {
        let y_row_stride = width + synthetic::ROW_PADDING;
        // Chroma samples use pixel stride 2, so a row of width/2 samples
        // spans width bytes before padding
        let chroma_row_stride = width + synthetic::ROW_PADDING;
        let chroma_height = height / 2;

        Self {
            width,
            height,
            y_row_stride,
            chroma_row_stride,
            y_buf: vec![0u8; y_row_stride * height],
            u_buf: vec![0u8; chroma_row_stride * chroma_height],
            v_buf: vec![0u8; chroma_row_stride * chroma_height],
            frame_index: 0,
            last_frame: None,
            closed: false,
        }
    }

    /// Fill the planes with a diagonal gradient that drifts each frame
    fn render_pattern(&mut self) {
        let t = self.frame_index as usize;

        for row in 0..self.height {
            let base = row * self.y_row_stride;
            for col in 0..self.width {
                self.y_buf[base + col] = ((row + col + t * 2) & 0xFF) as u8;
            }
        }

        let chroma_height = self.height / 2;
        let chroma_width = self.width / 2;
        for row in 0..chroma_height {
            let base = row * self.chroma_row_stride;
            for col in 0..chroma_width {
                self.u_buf[base + col * 2] = (128 + ((col + t) & 0x3F)) as u8;
                self.v_buf[base + col * 2] = (128u16.wrapping_sub(((row + t) & 0x3F) as u16)) as u8;
            }
        }
    }

    fn pace(&mut self) {
        if let Some(last) = self.last_frame {
            let elapsed = last.elapsed();
            if elapsed < synthetic::FRAME_INTERVAL {
                std::thread::sleep(synthetic::FRAME_INTERVAL - elapsed);
            }
        }
        self.last_frame = Some(Instant::now());
    }
}

impl CaptureSession for SyntheticSession {
    fn acquire_latest(
        &mut self,
        visit: &mut dyn FnMut(RawFrame<'_>),
    ) -> Result<bool, CameraError> {
        if self.closed {
            return Err(CameraError::Disconnected);
        }

        self.pace();
        self.render_pattern();
        self.frame_index += 1;

        let frame = RawFrame {
            width: self.width,
            height: self.height,
            y: RawPlane {
                data: &self.y_buf,
                row_stride: self.y_row_stride,
                pixel_stride: 1,
            },
            u: RawPlane {
                data: &self.u_buf,
                row_stride: self.chroma_row_stride,
                pixel_stride: 2,
            },
            v: RawPlane {
                data: &self.v_buf,
                row_stride: self.chroma_row_stride,
                pixel_stride: 2,
            },
        };
        visit(frame);
        Ok(true)
    }

    fn close(&mut self) {
        debug!(frames = self.frame_index, "Closing synthetic session");
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::convert::yuv420_to_nv21;

    #[test]
    fn test_open_rejects_odd_dimensions() {
        let mut backend = SyntheticBackend::new();
        let device = backend.enumerate().remove(0);
        let result = backend.open(&device, &CaptureFormat { width: 641, height: 480 });
        assert!(matches!(result, Err(CameraError::ConfigureFailed(_))));
    }

    #[test]
    fn test_session_delivers_convertible_frames() {
        let mut backend = SyntheticBackend::new();
        let device = backend.enumerate().remove(0);
        let mut session = backend
            .open(&device, &CaptureFormat { width: 32, height: 16 })
            .unwrap();

        let mut converted = Vec::new();
        let delivered = session
            .acquire_latest(&mut |raw| {
                converted = yuv420_to_nv21(&raw);
            })
            .unwrap();

        assert!(delivered);
        assert_eq!(converted.len(), 32 * 16 * 3 / 2);
    }

    #[test]
    fn test_closed_session_reports_disconnected() {
        let mut backend = SyntheticBackend::new();
        let device = backend.enumerate().remove(0);
        let mut session = backend
            .open(&device, &CaptureFormat { width: 8, height: 8 })
            .unwrap();

        session.close();
        let result = session.acquire_latest(&mut |_| {});
        assert!(matches!(result, Err(CameraError::Disconnected)));
    }
}
