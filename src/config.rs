// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON under the per-user config directory; missing or
//! unparsable files fall back to defaults with a logged warning.

use crate::backends::camera::types::CaptureFormat;
use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Which processing engine the pipeline routes frames through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingMode {
    /// Stream converted NV21 straight to the renderer
    Off,
    /// Run the boundary but keep the frame unchanged
    Passthrough,
    /// Edge detection (default, the whole point of the viewer)
    #[default]
    Edges,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture resolution
    pub width: u32,
    pub height: u32,
    /// Prefer a rear-facing device when more than one is available
    pub prefer_back_camera: bool,
    /// Processing engine selection
    pub processing: ProcessingMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
            prefer_back_camera: true,
            processing: ProcessingMode::default(),
        }
    }
}

impl Config {
    /// Capture format derived from the configured resolution
    pub fn capture_format(&self) -> CaptureFormat {
        CaptureFormat {
            width: self.width,
            height: self.height,
        }
    }

    /// Default config file location, if a config directory exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from a specific path, falling back to defaults on any failure
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                Self::default()
            }
        }
    }

    /// Persist to a specific path, creating parent directories
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.width, DEFAULT_FRAME_WIDTH);
        assert_eq!(config.height, DEFAULT_FRAME_HEIGHT);
        assert!(config.prefer_back_camera);
        assert_eq!(config.processing, ProcessingMode::Edges);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/edgeview/config.json"));
        assert_eq!(config, Config::default());
    }
}
