// SPDX-License-Identifier: GPL-3.0-only

//! edgeview - live camera frame pipeline with edge-detection preview
//!
//! Ingests raw three-plane YUV 4:2:0 frames from a capture backend,
//! converts them to packed NV21 with full stride handling, tracks sensor
//! plus device rotation, and hands the newest frames to a GPU renderer,
//! optionally routing them through a pixel-processing boundary first.
//!
//! # Architecture
//!
//! - [`backends::camera`]: capture traits, plane conversion, rotation
//!   tracking, the frame queue and the pipeline orchestrator
//! - [`processing`]: the external pixel-processing boundary
//! - [`render`]: wgpu textured-quad renderer
//! - [`config`]: user configuration handling

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod processing;
pub mod render;

// Re-export commonly used types
pub use backends::camera::{CapturePipeline, FrameQueue, PipelineState, RotationTracker};
pub use config::{Config, ProcessingMode};
pub use errors::{CameraError, FrameError, PipelineError, RenderError};
