// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends
//!
//! Descriptors serialize with browser-style camelCase field names and omit
//! absent entries, so their JSON dumps read like a media track's
//! `getCapabilities()` / `getSettings()` output.

use futures::channel::mpsc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of a device node as reported by enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Video capture (a camera)
    VideoInput,
    /// Video output or memory-to-memory codec node
    VideoOutput,
    /// Metadata-only node (e.g. UVC metadata)
    Metadata,
    /// Anything else
    Other,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::VideoInput => "videoinput",
            DeviceKind::VideoOutput => "videooutput",
            DeviceKind::Metadata => "metadata",
            DeviceKind::Other => "other",
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A device as seen by enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    /// Opaque identifier, stable for the session. Empty for the placeholder.
    pub id: String,
    /// Human readable name. Empty until the device may be opened.
    pub label: String,
    pub kind: DeviceKind,
}

impl CameraDevice {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
        }
    }

    /// Entry reported for a camera that exists but may not be opened yet
    pub fn placeholder() -> Self {
        Self::new("", "", DeviceKind::VideoInput)
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_empty()
    }

    pub fn is_video_input(&self) -> bool {
        self.kind == DeviceKind::VideoInput
    }
}

/// Parameters for acquiring a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    /// Device to open; `None` lets the provider pick its default camera
    pub device_id: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Always false; audio capture is not supported
    pub audio: bool,
    /// Deliver preview frames; without it the stream only carries controls
    pub preview: bool,
}

impl StreamRequest {
    pub fn video(device_id: Option<String>, width: u32, height: u32) -> Self {
        Self {
            device_id,
            width,
            height,
            audio: false,
            preview: true,
        }
    }

    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }
}

/// An adjustable image parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Brightness,
    Contrast,
    Saturation,
    Sharpness,
}

impl Parameter {
    /// All tracked parameters, in display order
    pub const ALL: [Parameter; 4] = [
        Parameter::Brightness,
        Parameter::Contrast,
        Parameter::Saturation,
        Parameter::Sharpness,
    ];

    /// Position in [`Parameter::ALL`]
    pub fn index(self) -> usize {
        match self {
            Parameter::Brightness => 0,
            Parameter::Contrast => 1,
            Parameter::Saturation => 2,
            Parameter::Sharpness => 3,
        }
    }

    /// Name used in descriptors and on the command line
    pub fn name(self) -> &'static str {
        match self {
            Parameter::Brightness => "brightness",
            Parameter::Contrast => "contrast",
            Parameter::Saturation => "saturation",
            Parameter::Sharpness => "sharpness",
        }
    }

    /// Get display name for UI
    pub fn display_name(self) -> &'static str {
        match self {
            Parameter::Brightness => "Brightness",
            Parameter::Contrast => "Contrast",
            Parameter::Saturation => "Saturation",
            Parameter::Sharpness => "Sharpness",
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Parameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parameter::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown parameter '{}', expected one of: brightness, contrast, saturation, sharpness",
                    s
                )
            })
    }
}

/// Hardware-reported range of a numeric setting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl MediaRange {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }
}

/// What a video track can do
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<MediaRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<MediaRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<MediaRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast: Option<MediaRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<MediaRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpness: Option<MediaRange>,
}

impl TrackCapabilities {
    pub fn range(&self, parameter: Parameter) -> Option<MediaRange> {
        match parameter {
            Parameter::Brightness => self.brightness,
            Parameter::Contrast => self.contrast,
            Parameter::Saturation => self.saturation,
            Parameter::Sharpness => self.sharpness,
        }
    }

    pub fn set_range(&mut self, parameter: Parameter, range: Option<MediaRange>) {
        let slot = match parameter {
            Parameter::Brightness => &mut self.brightness,
            Parameter::Contrast => &mut self.contrast,
            Parameter::Saturation => &mut self.saturation,
            Parameter::Sharpness => &mut self.sharpness,
        };
        *slot = range;
    }

    /// Builder-style [`TrackCapabilities::set_range`]
    pub fn with_range(mut self, parameter: Parameter, range: MediaRange) -> Self {
        self.set_range(parameter, Some(range));
        self
    }
}

/// Current values of a video track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpness: Option<f64>,
}

impl TrackSettings {
    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Brightness => self.brightness,
            Parameter::Contrast => self.contrast,
            Parameter::Saturation => self.saturation,
            Parameter::Sharpness => self.sharpness,
        }
    }

    pub fn set_value(&mut self, parameter: Parameter, value: Option<f64>) {
        let slot = match parameter {
            Parameter::Brightness => &mut self.brightness,
            Parameter::Contrast => &mut self.contrast,
            Parameter::Saturation => &mut self.saturation,
            Parameter::Sharpness => &mut self.sharpness,
        };
        *slot = value;
    }

    /// Builder-style [`TrackSettings::set_value`]
    pub fn with_value(mut self, parameter: Parameter, value: f64) -> Self {
        self.set_value(parameter, Some(value));
        self
    }
}

/// Request to move one parameter of the active track to a new value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub parameter: Parameter,
    pub value: f64,
}

/// Pixel layout of a preview frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed 8-bit RGB
    Rgb24,
    /// Packed YUV 4:2:2, Y0 U Y1 V
    Yuyv,
    /// 8-bit luma only
    Gray8,
}

/// A single preview frame
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row
    pub stride: u32,
    pub format: PixelFormat,
    pub data: Arc<[u8]>,
}

pub type FrameSender = mpsc::Sender<CameraFrame>;
pub type FrameReceiver = mpsc::Receiver<CameraFrame>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_index_matches_all_order() {
        for (i, parameter) in Parameter::ALL.iter().enumerate() {
            assert_eq!(parameter.index(), i);
        }
    }

    #[test]
    fn test_parameter_from_str() {
        assert_eq!("Contrast".parse::<Parameter>(), Ok(Parameter::Contrast));
        assert!("hue".parse::<Parameter>().is_err());
    }

    #[test]
    fn test_capabilities_dump_uses_browser_field_names() {
        let caps = TrackCapabilities {
            device_id: Some("abc".into()),
            ..Default::default()
        }
        .with_range(Parameter::Brightness, MediaRange::new(0.0, 100.0, 1.0));

        let json: serde_json::Value = serde_json::to_value(&caps).unwrap();
        assert_eq!(json["deviceId"], "abc");
        assert_eq!(json["brightness"]["max"], 100.0);
        assert!(json.get("contrast").is_none());
    }

    #[test]
    fn test_device_kind_serializes_lowercase() {
        let json = serde_json::to_string(&DeviceKind::VideoInput).unwrap();
        assert_eq!(json, "\"videoinput\"");
    }
}
