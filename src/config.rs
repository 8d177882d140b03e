// SPDX-License-Identifier: GPL-3.0-only

//! Read-only application configuration
//!
//! Configuration is loaded once at startup from a JSON file. Nothing the
//! user adjusts at runtime is ever written back.

use crate::constants::{
    APP_NAME, CONFIG_FILE_NAME, DEFAULT_DEVICE_DIR, DEFAULT_HEIGHT, DEFAULT_WIDTH,
};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Requested stream width
    pub width: u32,
    /// Requested stream height
    pub height: u32,
    /// Device to open at startup; `None` lets the backend pick
    pub device: Option<String>,
    /// Directory scanned for `video*` nodes
    pub device_dir: PathBuf,
    /// Show the live preview in the terminal UI
    pub preview: bool,
    /// tracing filter directive used when RUST_LOG is unset
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            device: None,
            device_dir: PathBuf::from(DEFAULT_DEVICE_DIR),
            preview: true,
            log_filter: None,
        }
    }
}

impl Config {
    /// Default config file location (`$XDG_CONFIG_HOME/camera-controls/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing default file yields defaults. An explicit path that does not
    /// exist, or any file that fails to parse, is an error.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), ?config, "Loaded config");
        Ok(config)
    }

    /// Parse config JSON; absent fields take their defaults
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The device requested at startup, with an empty string meaning "none"
    pub fn initial_device(&self) -> Option<String> {
        self.device.clone().filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "width": 1280, "height": 720 }"#).unwrap();
        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 720);
        assert!(config.preview);
        assert_eq!(config.device_dir, PathBuf::from("/dev"));
    }

    #[test]
    fn test_empty_device_means_default() {
        let config = Config::from_json(r#"{ "device": "" }"#).unwrap();
        assert_eq!(config.initial_device(), None);

        let config = Config::from_json(r#"{ "device": "/dev/video2" }"#).unwrap();
        assert_eq!(config.initial_device().as_deref(), Some("/dev/video2"));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(Config::from_json("{ width: }").is_err());
    }
}
