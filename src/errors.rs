// SPDX-License-Identifier: GPL-3.0-only

//! Error types for camera-controls
//!
//! The synchronizer itself never fails; these types describe what the
//! collaborators (device scan, stream acquisition, control writes) and the
//! command-line front-end can report.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for camera backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera backend errors
    Camera(BackendError),
    /// Configuration errors
    Config(String),
    /// Terminal setup or drawing errors
    Terminal(String),
    /// Generic error with message
    Other(String),
}

/// Errors reported by camera backends
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// No device matches the requested id
    DeviceNotFound(String),
    /// The device node exists but may not be opened
    PermissionDenied(String),
    /// The device refused the requested capture format
    FormatNotSupported(String),
    /// The capture stream could not be started
    StreamFailed(String),
    /// The device does not expose this control
    ControlNotSupported(String),
    /// The device rejected a control write
    ConstraintRejected(String),
    /// Other I/O failure
    Io(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Terminal(msg) => write!(f, "Terminal error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::DeviceNotFound(id) => write!(f, "Device not found: {}", id),
            BackendError::PermissionDenied(path) => write!(f, "Permission denied: {}", path),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::StreamFailed(msg) => write!(f, "Stream failed: {}", msg),
            BackendError::ControlNotSupported(name) => write!(f, "Control not supported: {}", name),
            BackendError::ConstraintRejected(msg) => write!(f, "Constraint rejected: {}", msg),
            BackendError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for BackendError {}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Camera(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Terminal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => BackendError::PermissionDenied(err.to_string()),
            std::io::ErrorKind::NotFound => BackendError::DeviceNotFound(err.to_string()),
            _ => BackendError::Io(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_kinds_map_to_backend_errors() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(
            BackendError::from(denied),
            BackendError::PermissionDenied(_)
        ));

        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(
            BackendError::from(missing),
            BackendError::DeviceNotFound(_)
        ));

        let other = std::io::Error::other("boom");
        assert!(matches!(BackendError::from(other), BackendError::Io(_)));
    }

    #[test]
    fn test_backend_error_wraps_into_app_error() {
        let err: AppError = BackendError::DeviceNotFound("/dev/video3".into()).into();
        assert_eq!(err.to_string(), "Camera error: Device not found: /dev/video3");
    }
}
