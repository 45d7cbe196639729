// SPDX-License-Identifier: GPL-3.0-only

//! Capture pipeline orchestration
//!
//! Owns the device lifecycle and wires the per-frame callback: rotation
//! lookup, plane conversion, the optional processing boundary, and the
//! hand-off queue. The capture loop runs on its own thread; the renderer
//! only ever sees the queue.

use super::convert::yuv420_to_nv21;
use super::frame_loop::{CaptureLoop, LoopAction};
use super::frame_queue::FrameQueue;
use super::rotation::RotationTracker;
use super::types::{CaptureFormat, Facing, PipelineFrame, RawFrame};
use super::{CaptureBackend, CaptureSession};
use crate::constants::STATS_LOG_INTERVAL;
use crate::errors::CameraError;
use crate::processing::{FrameProcessor, ProcessedFrame};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Pipeline lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Opening,
    Streaming,
    Stopping,
    /// Unrecoverable device failure; resources are released and an explicit
    /// `start()` is required to recover
    Error,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Opening => write!(f, "opening"),
            PipelineState::Streaming => write!(f, "streaming"),
            PipelineState::Stopping => write!(f, "stopping"),
            PipelineState::Error => write!(f, "error"),
        }
    }
}

/// Per-stream frame counters.
///
/// An explicit accumulator handed into the capture callback instead of
/// ambient captured state; all fields are atomics so the demo can read a
/// snapshot while the capture thread keeps counting.
#[derive(Debug, Default)]
pub struct FrameStats {
    frames: AtomicU64,
    conversion_drops: AtomicU64,
    processing_drops: AtomicU64,
}

impl FrameStats {
    fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    fn record_conversion_drop(&self) {
        self.conversion_drops.fetch_add(1, Ordering::Relaxed);
    }

    fn record_processing_drop(&self) {
        self.processing_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn conversion_drops(&self) -> u64 {
        self.conversion_drops.load(Ordering::Relaxed)
    }

    pub fn processing_drops(&self) -> u64 {
        self.processing_drops.load(Ordering::Relaxed)
    }
}

/// Closes the capture session when the capture thread unwinds, whether the
/// loop stopped itself or was signalled
struct SessionGuard(Box<dyn CaptureSession>);

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Orchestrates device selection, the capture thread and the frame queue
pub struct CapturePipeline {
    backend: Box<dyn CaptureBackend>,
    format: CaptureFormat,
    prefer_back: bool,
    rotation: Arc<RotationTracker>,
    queue: Arc<FrameQueue>,
    processor: Option<Arc<dyn FrameProcessor>>,
    state: Arc<Mutex<PipelineState>>,
    stats: Arc<FrameStats>,
    capture_loop: Option<CaptureLoop>,
}

impl CapturePipeline {
    pub fn new(backend: Box<dyn CaptureBackend>, format: CaptureFormat) -> Self {
        Self {
            backend,
            format,
            prefer_back: true,
            rotation: Arc::new(RotationTracker::new()),
            queue: Arc::new(FrameQueue::new()),
            processor: None,
            state: Arc::new(Mutex::new(PipelineState::Idle)),
            stats: Arc::new(FrameStats::default()),
            capture_loop: None,
        }
    }

    /// Plug a processing engine into the per-frame path; `None` streams
    /// converted NV21 directly
    pub fn set_processor(&mut self, processor: Option<Arc<dyn FrameProcessor>>) {
        self.processor = processor;
    }

    /// Prefer the first enumerated device instead of a rear-facing one
    pub fn set_prefer_back(&mut self, prefer_back: bool) {
        self.prefer_back = prefer_back;
    }

    /// The hand-off queue the renderer polls
    pub fn queue(&self) -> Arc<FrameQueue> {
        Arc::clone(&self.queue)
    }

    /// The tracker the external orientation listener feeds
    pub fn rotation_tracker(&self) -> Arc<RotationTracker> {
        Arc::clone(&self.rotation)
    }

    pub fn stats(&self) -> Arc<FrameStats> {
        Arc::clone(&self.stats)
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: PipelineState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Select a device, open it and start streaming frames to the queue.
    ///
    /// Prefers a rear-facing device, falls back to the first enumerated
    /// one. Device failures release everything and leave the pipeline idle;
    /// they are never retried silently.
    pub fn start(&mut self) -> Result<(), CameraError> {
        match self.state() {
            PipelineState::Streaming | PipelineState::Opening => {
                warn!("start() called while already {}", self.state());
                return Ok(());
            }
            _ => {}
        }

        self.set_state(PipelineState::Opening);

        let devices = self.backend.enumerate();
        let device = if self.prefer_back {
            devices
                .iter()
                .find(|d| d.facing == Facing::Back)
                .or_else(|| devices.first())
        } else {
            devices.first()
        };
        let device = match device {
            Some(d) => d.clone(),
            None => {
                self.set_state(PipelineState::Idle);
                return Err(CameraError::NoDeviceAvailable);
            }
        };

        info!(device = %device, format = %self.format, "Opening capture device");
        self.rotation.set_sensor_orientation(device.sensor_orientation);

        let session = match self.backend.open(&device, &self.format) {
            Ok(s) => s,
            Err(e) => {
                error!(device = %device, error = %e, "Failed to open capture session");
                self.set_state(PipelineState::Idle);
                return Err(e);
            }
        };

        let mut session = SessionGuard(session);
        let rotation = Arc::clone(&self.rotation);
        let queue = Arc::clone(&self.queue);
        let stats = Arc::clone(&self.stats);
        let state = Arc::clone(&self.state);
        let processor = self.processor.clone();
        let mut last_log = Instant::now();

        self.capture_loop = Some(CaptureLoop::spawn("camera-capture", move || {
            let result = session.0.acquire_latest(&mut |raw| {
                handle_frame(raw, &rotation, processor.as_deref(), &queue, &stats);
            });

            if last_log.elapsed() >= STATS_LOG_INTERVAL {
                debug!(
                    frames = stats.frames(),
                    conversion_drops = stats.conversion_drops(),
                    processing_drops = stats.processing_drops(),
                    "Capture statistics"
                );
                last_log = Instant::now();
            }

            match result {
                Ok(_) => LoopAction::Continue,
                Err(e) => {
                    error!(error = %e, "Capture session failed, stopping stream");
                    *state.lock().unwrap_or_else(|p| p.into_inner()) = PipelineState::Error;
                    LoopAction::Stop
                }
            }
        }));

        self.set_state(PipelineState::Streaming);
        Ok(())
    }

    /// Close the session and stop the capture thread.
    ///
    /// Any partially processed frame is discarded; no new frames are
    /// delivered after this returns.
    pub fn stop(&mut self) {
        if self.capture_loop.is_none() {
            self.set_state(PipelineState::Idle);
            return;
        }

        info!("Stopping capture pipeline");
        self.set_state(PipelineState::Stopping);
        if let Some(mut capture_loop) = self.capture_loop.take() {
            capture_loop.stop();
        }
        self.set_state(PipelineState::Idle);
    }

    pub fn is_streaming(&self) -> bool {
        self.state() == PipelineState::Streaming
            && self
                .capture_loop
                .as_ref()
                .map(|l| l.is_running())
                .unwrap_or(false)
    }
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The per-frame callback: rotation, conversion, optional processing,
/// enqueue. Frame-local failures are logged and dropped without touching
/// the stream.
fn handle_frame(
    raw: RawFrame<'_>,
    rotation: &RotationTracker,
    processor: Option<&dyn FrameProcessor>,
    queue: &FrameQueue,
    stats: &FrameStats,
) {
    let total_rotation = rotation.total_rotation();
    let width = raw.width as u32;
    let height = raw.height as u32;

    let nv21 = yuv420_to_nv21(&raw);
    if nv21.is_empty() {
        stats.record_conversion_drop();
        warn!(width, height, "Conversion failed, dropping frame");
        return;
    }

    let frame = match processor {
        Some(p) => match p.process(&nv21, width, height, total_rotation) {
            Some(ProcessedFrame::PassThrough(data)) => {
                PipelineFrame::nv21(data, width, height, total_rotation)
            }
            Some(ProcessedFrame::Rgba(data)) => {
                PipelineFrame::rgba(data, width, height, total_rotation)
            }
            None => None,
        },
        None => PipelineFrame::nv21(nv21, width, height, total_rotation),
    };

    match frame {
        Some(f) => {
            queue.offer(f);
            stats.record_frame();
        }
        None => {
            stats.record_processing_drop();
            if let Some(p) = processor {
                warn!(processor = p.name(), "Processing returned no usable result, dropping frame");
            }
        }
    }
}
