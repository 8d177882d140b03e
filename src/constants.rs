// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application name, used for config and cache directories
pub const APP_NAME: &str = "camera-controls";

/// Config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Log file written while the terminal UI owns the screen
pub const LOG_FILE_NAME: &str = "camera-controls.log";

/// Default log filter when neither RUST_LOG nor the config sets one
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Requested preview width
pub const DEFAULT_WIDTH: u32 = 640;

/// Requested preview height
pub const DEFAULT_HEIGHT: u32 = 480;

/// Directory scanned for V4L2 nodes
pub const DEFAULT_DEVICE_DIR: &str = "/dev";

/// Prefix of V4L2 video node names
pub const VIDEO_NODE_PREFIX: &str = "video";

/// Capture buffers queued on the V4L2 stream
pub const CAPTURE_BUFFER_COUNT: u32 = 4;

/// Preview frames buffered between capture thread and UI
pub const PREVIEW_CHANNEL_CAPACITY: usize = 2;

/// Terminal UI timing
pub mod ui {
    use super::Duration;

    /// Input poll timeout, also bounds the redraw rate
    pub const POLL_INTERVAL: Duration = Duration::from_millis(16);

    /// Slider steps moved by PageUp/PageDown
    pub const COARSE_STEPS: f64 = 10.0;
}
