// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera backend
//!
//! Device ids are node paths (`/dev/videoN`), stable for the session.

mod capture;
mod stream;

pub use capture::NegotiatedFormat;
pub use stream::{V4l2Stream, V4l2Track};

use super::types::{CameraDevice, StreamRequest};
use super::v4l2_utils::{describe_node, list_video_nodes};
use super::{DeviceInventory, MediaStream, StreamProvider};
use crate::errors::{BackendError, BackendResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Scan a directory for video nodes.
///
/// Unreadable nodes collapse into a single placeholder entry.
fn scan(dir: &Path) -> Vec<CameraDevice> {
    let mut seen_placeholder = false;
    list_video_nodes(dir)
        .iter()
        .filter_map(|path| describe_node(path))
        .filter(|device| !device.is_placeholder() || !std::mem::replace(&mut seen_placeholder, true))
        .collect()
}

async fn blocking<T, F>(f: F) -> BackendResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> BackendResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BackendError::Io(format!("blocking task failed: {}", e)))?
}

/// Device inventory backed by `/dev/video*`
#[derive(Debug, Clone)]
pub struct V4l2Inventory {
    device_dir: PathBuf,
}

impl V4l2Inventory {
    pub fn new(device_dir: impl Into<PathBuf>) -> Self {
        Self {
            device_dir: device_dir.into(),
        }
    }
}

#[async_trait]
impl DeviceInventory for V4l2Inventory {
    async fn enumerate(&self) -> BackendResult<Vec<CameraDevice>> {
        let dir = self.device_dir.clone();
        let devices = blocking(move || Ok(scan(&dir))).await?;
        debug!(count = devices.len(), "Enumerated V4L2 nodes");
        Ok(devices)
    }
}

/// Stream provider that opens V4L2 capture nodes
#[derive(Debug, Clone)]
pub struct V4l2StreamProvider {
    device_dir: PathBuf,
}

impl V4l2StreamProvider {
    pub fn new(device_dir: impl Into<PathBuf>) -> Self {
        Self {
            device_dir: device_dir.into(),
        }
    }
}

/// Resolve the node to open: the requested one, or the first usable camera
fn resolve_device(dir: &Path, device_id: Option<&str>) -> BackendResult<CameraDevice> {
    match device_id {
        Some(id) => {
            let device = describe_node(Path::new(id))
                .ok_or_else(|| BackendError::DeviceNotFound(id.to_string()))?;
            if device.is_placeholder() {
                return Err(BackendError::PermissionDenied(id.to_string()));
            }
            if !device.is_video_input() {
                return Err(BackendError::DeviceNotFound(format!(
                    "{} is a {} node, not a camera",
                    id, device.kind
                )));
            }
            Ok(device)
        }
        None => scan(dir)
            .into_iter()
            .find(|device| device.is_video_input() && !device.is_placeholder())
            .ok_or_else(|| BackendError::DeviceNotFound("no camera available".into())),
    }
}

#[async_trait]
impl StreamProvider for V4l2StreamProvider {
    async fn acquire(&self, request: StreamRequest) -> BackendResult<Arc<dyn MediaStream>> {
        let dir = self.device_dir.clone();
        let stream = blocking(move || {
            let device = resolve_device(&dir, request.device_id.as_deref())?;
            info!(device = %device.id, label = %device.label, width = request.width, height = request.height, "Opening V4L2 stream");
            V4l2Stream::open(&device, request.width, request.height, request.preview)
        })
        .await?;
        Ok(Arc::new(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_of_empty_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan(dir.path()).is_empty());
    }

    #[test]
    fn test_default_device_without_cameras_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_device(dir.path(), None),
            Err(BackendError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_device_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("video9");
        assert!(matches!(
            resolve_device(dir.path(), missing.to_str()),
            Err(BackendError::DeviceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_inventory_enumerates_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let inventory = V4l2Inventory::new(dir.path());
        assert_eq!(inventory.enumerate().await.unwrap(), Vec::new());
    }
}
