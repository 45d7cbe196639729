// SPDX-License-Identifier: GPL-3.0-only

//! Capture backend abstraction
//!
//! The capture subsystem itself (device discovery, buffer plumbing) is an
//! external collaborator; the pipeline only depends on these two traits.
//!
//! ```text
//! ┌──────────────────┐
//! │ CapturePipeline  │  ← lifecycle, per-frame callback wiring
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ CaptureBackend   │  ← enumerate / open
//! │ CaptureSession   │  ← acquire_latest / close
//! └────────┬─────────┘
//!          │
//!          ▼
//!     ┌──────────┐
//!     │Synthetic │  ← built-in test-pattern implementation
//!     └──────────┘
//! ```

pub mod convert;
pub mod frame_loop;
pub mod frame_queue;
pub mod pipeline;
pub mod rotation;
pub mod synthetic;
pub mod types;

pub use frame_queue::FrameQueue;
pub use pipeline::{CapturePipeline, PipelineState};
pub use rotation::RotationTracker;
pub use types::*;

use crate::errors::CameraError;

/// A source of capture devices
pub trait CaptureBackend: Send {
    /// Enumerate the devices this backend can open
    fn enumerate(&mut self) -> Vec<CameraDescriptor>;

    /// Open a device and configure a capture session at the given format.
    ///
    /// On success the session is streaming and frames can be pulled with
    /// [`CaptureSession::acquire_latest`].
    fn open(
        &mut self,
        device: &CameraDescriptor,
        format: &CaptureFormat,
    ) -> Result<Box<dyn CaptureSession>, CameraError>;
}

/// An open, streaming capture session
pub trait CaptureSession: Send {
    /// Deliver the newest pending raw frame to `visit`, discarding any
    /// older buffered frames first.
    ///
    /// The `RawFrame` borrow is only valid inside the callback; the caller
    /// must copy out anything it keeps. Returns `Ok(true)` when a frame was
    /// delivered, `Ok(false)` when none was pending yet.
    fn acquire_latest(
        &mut self,
        visit: &mut dyn FnMut(RawFrame<'_>),
    ) -> Result<bool, CameraError>;

    /// Stop streaming and release the device
    fn close(&mut self);
}
