// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 user-class image controls
//!
//! Queries ranges and reads/writes current values of the brightness,
//! contrast, saturation and sharpness controls through the
//! `VIDIOC_QUERYCTRL`, `VIDIOC_G_CTRL` and `VIDIOC_S_CTRL` ioctls.

use super::types::{MediaRange, Parameter};
use crate::errors::{BackendError, BackendResult};
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use tracing::{debug, warn};

const V4L2_CTRL_CLASS_USER: u32 = 0x00980000;
const V4L2_CID_BASE: u32 = V4L2_CTRL_CLASS_USER | 0x900;

pub const V4L2_CID_BRIGHTNESS: u32 = V4L2_CID_BASE;
pub const V4L2_CID_CONTRAST: u32 = V4L2_CID_BASE + 1;
pub const V4L2_CID_SATURATION: u32 = V4L2_CID_BASE + 2;
pub const V4L2_CID_SHARPNESS: u32 = V4L2_CID_BASE + 27;

const V4L2_CTRL_TYPE_INTEGER: u32 = 1;
const V4L2_CTRL_TYPE_BOOLEAN: u32 = 2;
const V4L2_CTRL_TYPE_MENU: u32 = 3;

const V4L2_CTRL_FLAG_DISABLED: u32 = 0x0001;
const V4L2_CTRL_FLAG_READ_ONLY: u32 = 0x0004;
const V4L2_CTRL_FLAG_INACTIVE: u32 = 0x0010;

// (dir << 30) | (size << 16) | ('V' << 8) | nr, dir 3 = READ|WRITE
const VIDIOC_G_CTRL: libc::c_ulong = 0xC008561B;
const VIDIOC_S_CTRL: libc::c_ulong = 0xC008561C;
const VIDIOC_QUERYCTRL: libc::c_ulong = 0xC0445624;

#[repr(C)]
struct V4l2Control {
    id: u32,
    value: i32,
}

#[repr(C)]
struct V4l2Queryctrl {
    id: u32,
    ctrl_type: u32,
    name: [u8; 32],
    minimum: i32,
    maximum: i32,
    step: i32,
    default_value: i32,
    flags: u32,
    reserved: [u32; 2],
}

/// V4L2 control id for a parameter
pub fn control_id(parameter: Parameter) -> u32 {
    match parameter {
        Parameter::Brightness => V4L2_CID_BRIGHTNESS,
        Parameter::Contrast => V4L2_CID_CONTRAST,
        Parameter::Saturation => V4L2_CID_SATURATION,
        Parameter::Sharpness => V4L2_CID_SHARPNESS,
    }
}

/// V4L2 control type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
    Integer,
    Boolean,
    Menu,
    Unknown(u32),
}

impl From<u32> for ControlType {
    fn from(value: u32) -> Self {
        match value {
            V4L2_CTRL_TYPE_INTEGER => ControlType::Integer,
            V4L2_CTRL_TYPE_BOOLEAN => ControlType::Boolean,
            V4L2_CTRL_TYPE_MENU => ControlType::Menu,
            other => ControlType::Unknown(other),
        }
    }
}

/// Result of `VIDIOC_QUERYCTRL`
#[derive(Debug, Clone)]
pub struct ControlInfo {
    pub id: u32,
    pub name: String,
    pub ctrl_type: ControlType,
    pub minimum: i32,
    pub maximum: i32,
    pub step: i32,
    pub default_value: i32,
    pub flags: u32,
}

impl ControlInfo {
    pub fn is_disabled(&self) -> bool {
        self.flags & V4L2_CTRL_FLAG_DISABLED != 0
    }

    pub fn is_read_only(&self) -> bool {
        self.flags & V4L2_CTRL_FLAG_READ_ONLY != 0
    }

    /// Inactive controls exist but currently have no effect (e.g. an auto mode is on)
    pub fn is_inactive(&self) -> bool {
        self.flags & V4L2_CTRL_FLAG_INACTIVE != 0
    }

    /// Range as a capability descriptor entry.
    ///
    /// Only writable integer controls are adjustable; a zero step from a
    /// sloppy driver is reported as 1.
    pub fn media_range(&self) -> Option<MediaRange> {
        if self.is_disabled() || self.is_read_only() || self.ctrl_type != ControlType::Integer {
            return None;
        }
        Some(MediaRange::new(
            f64::from(self.minimum),
            f64::from(self.maximum),
            f64::from(self.step.max(1)),
        ))
    }
}

fn extract_name(bytes: &[u8; 32]) -> String {
    let name_len = bytes.iter().position(|&c| c == 0).unwrap_or(32);
    String::from_utf8_lossy(&bytes[..name_len]).to_string()
}

/// An open V4L2 node used for control access
#[derive(Debug)]
pub struct ControlDevice {
    path: String,
    file: File,
}

impl ControlDevice {
    /// Open a node read/write; the control ioctls work while another handle streams
    pub fn open(path: &str) -> BackendResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            path: path.to_string(),
            file,
        })
    }

    /// Query a control; `None` when the driver does not know it
    pub fn query(&self, control_id: u32) -> Option<ControlInfo> {
        let mut qctrl = V4l2Queryctrl {
            id: control_id,
            ctrl_type: 0,
            name: [0; 32],
            minimum: 0,
            maximum: 0,
            step: 0,
            default_value: 0,
            flags: 0,
            reserved: [0; 2],
        };

        let result = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                VIDIOC_QUERYCTRL as _,
                &mut qctrl as *mut V4l2Queryctrl,
            )
        };
        if result < 0 {
            return None;
        }

        Some(ControlInfo {
            id: qctrl.id,
            name: extract_name(&qctrl.name),
            ctrl_type: qctrl.ctrl_type.into(),
            minimum: qctrl.minimum,
            maximum: qctrl.maximum,
            step: qctrl.step,
            default_value: qctrl.default_value,
            flags: qctrl.flags,
        })
    }

    /// Read the current value of a control
    pub fn get(&self, control_id: u32) -> Option<i32> {
        let mut ctrl = V4l2Control {
            id: control_id,
            value: 0,
        };

        let result = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                VIDIOC_G_CTRL as _,
                &mut ctrl as *mut V4l2Control,
            )
        };
        if result < 0 {
            debug!(device = %self.path, control_id, "Failed to get V4L2 control");
            return None;
        }

        Some(ctrl.value)
    }

    /// Write a control, returning the value the driver settled on
    pub fn set(&self, control_id: u32, value: i32) -> BackendResult<i32> {
        let mut ctrl = V4l2Control {
            id: control_id,
            value,
        };

        let result = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                VIDIOC_S_CTRL as _,
                &mut ctrl as *mut V4l2Control,
            )
        };
        if result < 0 {
            let errno = std::io::Error::last_os_error();
            warn!(device = %self.path, control_id, value, %errno, "Failed to set V4L2 control");
            return Err(BackendError::ConstraintRejected(errno.to_string()));
        }

        if ctrl.value != value {
            debug!(
                device = %self.path,
                control_id,
                requested = value,
                actual = ctrl.value,
                "V4L2 control value was clamped"
            );
        }
        Ok(ctrl.value)
    }

    /// Capability range of a parameter, if the device exposes it
    pub fn parameter_range(&self, parameter: Parameter) -> Option<MediaRange> {
        self.query(control_id(parameter))?.media_range()
    }

    /// Current value of a parameter
    pub fn parameter_value(&self, parameter: Parameter) -> Option<f64> {
        self.get(control_id(parameter)).map(f64::from)
    }

    /// Write a parameter, rounding to the integer the driver expects
    pub fn set_parameter(&self, parameter: Parameter, value: f64) -> BackendResult<i32> {
        if !value.is_finite() {
            return Err(BackendError::ConstraintRejected(format!(
                "{} is not a finite value for {}",
                value, parameter
            )));
        }
        let raw = value.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
        self.set(control_id(parameter), raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(ctrl_type: u32, flags: u32, step: i32) -> ControlInfo {
        ControlInfo {
            id: V4L2_CID_BRIGHTNESS,
            name: "Brightness".into(),
            ctrl_type: ctrl_type.into(),
            minimum: -64,
            maximum: 64,
            step,
            default_value: 0,
            flags,
        }
    }

    #[test]
    fn test_control_id_values() {
        assert_eq!(V4L2_CID_BRIGHTNESS, 0x00980900);
        assert_eq!(V4L2_CID_CONTRAST, 0x00980901);
        assert_eq!(V4L2_CID_SATURATION, 0x00980902);
        assert_eq!(V4L2_CID_SHARPNESS, 0x0098091b);
    }

    #[test]
    fn test_integer_control_exposes_range() {
        let range = info(V4L2_CTRL_TYPE_INTEGER, 0, 2).media_range().unwrap();
        assert_eq!(range, MediaRange::new(-64.0, 64.0, 2.0));
    }

    #[test]
    fn test_zero_step_reported_as_one() {
        let range = info(V4L2_CTRL_TYPE_INTEGER, 0, 0).media_range().unwrap();
        assert_eq!(range.step, 1.0);
    }

    #[test]
    fn test_unusable_controls_have_no_range() {
        assert!(info(V4L2_CTRL_TYPE_INTEGER, V4L2_CTRL_FLAG_DISABLED, 1).media_range().is_none());
        assert!(info(V4L2_CTRL_TYPE_INTEGER, V4L2_CTRL_FLAG_READ_ONLY, 1).media_range().is_none());
        assert!(info(V4L2_CTRL_TYPE_MENU, 0, 1).media_range().is_none());
    }

    #[test]
    fn test_inactive_control_keeps_range() {
        let control = info(V4L2_CTRL_TYPE_INTEGER, V4L2_CTRL_FLAG_INACTIVE, 1);
        assert!(control.is_inactive());
        assert!(control.media_range().is_some());
    }

    #[test]
    fn test_control_type_conversion() {
        assert_eq!(ControlType::from(1), ControlType::Integer);
        assert_eq!(ControlType::from(2), ControlType::Boolean);
        assert_eq!(ControlType::from(99), ControlType::Unknown(99));
    }
}
