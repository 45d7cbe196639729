// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Default capture resolution (matches the common sensor preview size)
pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

/// Maximum number of converted frames held between the capture thread and
/// the draw context. Two frames smooth over one slow consumer tick without
/// unbounded growth; insertion past capacity evicts the oldest first.
pub const FRAME_QUEUE_CAPACITY: usize = 2;

/// Orientation bucketing
///
/// Quadrant boundaries are shifted by 45 degrees from the cardinal
/// directions so that small wobbles near 0/90/180/270 do not flip the
/// bucket back and forth.
pub mod orientation {
    /// [45, 134] degrees maps to a 270-degree display rotation
    pub const QUADRANT_270: (u32, u32) = (45, 134);
    /// [135, 224] degrees maps to 180
    pub const QUADRANT_180: (u32, u32) = (135, 224);
    /// [225, 314] degrees maps to 90
    pub const QUADRANT_90: (u32, u32) = (225, 314);
}

/// Synthetic backend timing
pub mod synthetic {
    use super::Duration;

    /// Pacing interval between generated frames (~30fps)
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

    /// Extra bytes of row padding added to generated planes so the strided
    /// conversion path is exercised the way real capture buffers do
    pub const ROW_PADDING: usize = 16;
}

/// Config file name under the per-user config directory
pub const CONFIG_DIR_NAME: &str = "edgeview";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// How often the capture loop logs its frame statistics
pub const STATS_LOG_INTERVAL: Duration = Duration::from_secs(5);
