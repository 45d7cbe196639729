// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture pipeline

use std::fmt;

/// Result type alias for pipeline-level operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Top-level pipeline error
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// Capture device errors
    Camera(CameraError),
    /// Renderer / GPU errors
    Render(RenderError),
    /// Configuration errors
    Config(String),
}

/// Capture device errors
///
/// These are pipeline-level: the pipeline transitions to `Error`, releases
/// the device and waits for an explicit `start()` to recover.
#[derive(Debug, Clone)]
pub enum CameraError {
    /// No capture device present on the system
    NoDeviceAvailable,
    /// Opening the device failed
    OpenFailed(String),
    /// Device disconnected while streaming
    Disconnected,
    /// Capture session could not be configured at the requested format
    ConfigureFailed(String),
}

/// Frame-local errors
///
/// These never stop the stream: the offending frame is logged and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Plane conversion produced the zero-length sentinel
    ConversionFailed,
    /// Processing boundary returned nothing or a wrong-sized buffer
    ProcessingAbsent,
}

/// Renderer errors
#[derive(Debug, Clone)]
pub enum RenderError {
    /// No suitable GPU adapter found
    NoAdapter,
    /// Device/queue request failed
    DeviceRequest(String),
    /// Reading rendered output back failed
    Readback(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Camera(e) => write!(f, "Camera error: {}", e),
            PipelineError::Render(e) => write!(f, "Render error: {}", e),
            PipelineError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoDeviceAvailable => write!(f, "No capture device available"),
            CameraError::OpenFailed(msg) => write!(f, "Failed to open device: {}", msg),
            CameraError::Disconnected => write!(f, "Device disconnected"),
            CameraError::ConfigureFailed(msg) => write!(f, "Session configuration failed: {}", msg),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::ConversionFailed => write!(f, "Frame conversion failed"),
            FrameError::ProcessingAbsent => write!(f, "Processing returned no usable result"),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NoAdapter => write!(f, "No suitable GPU adapter"),
            RenderError::DeviceRequest(msg) => write!(f, "GPU device request failed: {}", msg),
            RenderError::Readback(msg) => write!(f, "GPU readback failed: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}
impl std::error::Error for CameraError {}
impl std::error::Error for FrameError {}
impl std::error::Error for RenderError {}

impl From<CameraError> for PipelineError {
    fn from(err: CameraError) -> Self {
        PipelineError::Camera(err)
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        PipelineError::Render(err)
    }
}

impl From<String> for PipelineError {
    fn from(msg: String) -> Self {
        PipelineError::Config(msg)
    }
}
