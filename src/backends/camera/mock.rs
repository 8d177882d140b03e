// SPDX-License-Identifier: GPL-3.0-only

//! In-memory camera backend for tests and hardware-free demos
//!
//! ```
//! use camera_controls::backends::camera::mock::{MockCamera, MockInventory, MockStreamProvider};
//! use camera_controls::backends::camera::{MediaRange, Parameter};
//!
//! let camera = MockCamera::new("/dev/video0", "Mock Cam")
//!     .with_parameter(Parameter::Brightness, MediaRange::new(0.0, 100.0, 1.0), 64.0);
//! let inventory = MockInventory::with_cameras(&[camera.clone()]);
//! let provider = MockStreamProvider::new(vec![camera]);
//! assert_eq!(inventory.enumeration_count(), 0);
//! # let _ = provider;
//! ```

use super::types::{
    CameraDevice, Constraint, DeviceKind, MediaRange, Parameter, StreamRequest,
    TrackCapabilities, TrackSettings,
};
use super::{DeviceInventory, MediaStream, StreamProvider, VideoTrack};
use crate::errors::{BackendError, BackendResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Inventory returning scripted snapshots.
///
/// Each call pops the next queued snapshot; once one remains it is repeated.
#[derive(Debug, Default)]
pub struct MockInventory {
    snapshots: Mutex<VecDeque<BackendResult<Vec<CameraDevice>>>>,
    calls: AtomicUsize,
}

impl MockInventory {
    pub fn new(devices: Vec<CameraDevice>) -> Self {
        Self::scripted(vec![Ok(devices)])
    }

    /// Inventory listing one `videoinput` entry per camera
    pub fn with_cameras(cameras: &[MockCamera]) -> Self {
        Self::new(cameras.iter().map(MockCamera::device).collect())
    }

    pub fn scripted(snapshots: Vec<BackendResult<Vec<CameraDevice>>>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `enumerate` ran
    pub fn enumeration_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceInventory for MockInventory {
    async fn enumerate(&self) -> BackendResult<Vec<CameraDevice>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut snapshots = self
            .snapshots
            .lock()
            .map_err(|_| BackendError::Io("mock inventory poisoned".into()))?;
        match snapshots.len() {
            0 => Ok(Vec::new()),
            1 => snapshots[0].clone(),
            _ => snapshots
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new())),
        }
    }
}

/// Scripted description of one camera
#[derive(Debug, Clone, Default)]
pub struct MockCamera {
    pub id: String,
    pub label: String,
    pub capabilities: TrackCapabilities,
    pub settings: TrackSettings,
    /// Constraint writes fail with `ConstraintRejected`
    pub reject_constraints: bool,
    /// Report the device id in the track settings
    pub report_device_id: bool,
    /// Stream carries no video track
    pub without_video: bool,
}

impl MockCamera {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            capabilities: TrackCapabilities {
                device_id: Some(id.clone()),
                ..Default::default()
            },
            settings: TrackSettings {
                device_id: Some(id.clone()),
                width: Some(640),
                height: Some(480),
                ..Default::default()
            },
            id,
            label: label.into(),
            reject_constraints: false,
            report_device_id: true,
            without_video: false,
        }
    }

    /// Expose `parameter` with `range`, currently set to `value`
    pub fn with_parameter(mut self, parameter: Parameter, range: MediaRange, value: f64) -> Self {
        self.capabilities.set_range(parameter, Some(range));
        self.settings.set_value(parameter, Some(value));
        self
    }

    pub fn rejecting_constraints(mut self) -> Self {
        self.reject_constraints = true;
        self
    }

    pub fn without_video(mut self) -> Self {
        self.without_video = true;
        self
    }

    pub fn device(&self) -> CameraDevice {
        CameraDevice::new(self.id.clone(), self.label.clone(), DeviceKind::VideoInput)
    }
}

/// Cameras served by `--mock`: one full-featured webcam and one that only
/// exposes brightness and refuses writes
pub fn demo_cameras() -> Vec<MockCamera> {
    vec![
        MockCamera::new("/dev/video0", "Mock HD Webcam")
            .with_parameter(Parameter::Brightness, MediaRange::new(-64.0, 64.0, 1.0), 0.0)
            .with_parameter(Parameter::Contrast, MediaRange::new(0.0, 95.0, 1.0), 32.0)
            .with_parameter(Parameter::Saturation, MediaRange::new(0.0, 100.0, 1.0), 64.0)
            .with_parameter(Parameter::Sharpness, MediaRange::new(0.0, 7.0, 1.0), 3.0),
        MockCamera::new("/dev/video2", "Mock IR Camera")
            .with_parameter(Parameter::Brightness, MediaRange::new(0.0, 255.0, 5.0), 128.0)
            .rejecting_constraints(),
    ]
}

/// Stream provider serving [`MockCamera`]s
#[derive(Debug, Default)]
pub struct MockStreamProvider {
    cameras: Vec<MockCamera>,
    requests: Mutex<Vec<StreamRequest>>,
    writes: Arc<Mutex<Vec<(String, Constraint)>>>,
}

impl MockStreamProvider {
    pub fn new(cameras: Vec<MockCamera>) -> Self {
        Self {
            cameras,
            ..Default::default()
        }
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<StreamRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Every constraint written to any stream, with the camera id
    pub fn writes(&self) -> Vec<(String, Constraint)> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StreamProvider for MockStreamProvider {
    async fn acquire(&self, request: StreamRequest) -> BackendResult<Arc<dyn MediaStream>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let camera = match request.device_id.as_deref() {
            Some(id) => self.cameras.iter().find(|camera| camera.id == id),
            None => self.cameras.first(),
        }
        .ok_or_else(|| {
            BackendError::DeviceNotFound(request.device_id.clone().unwrap_or_default())
        })?;

        Ok(Arc::new(MockStream::new(camera.clone(), Arc::clone(&self.writes))))
    }
}

/// A stream over a [`MockCamera`]
#[derive(Debug)]
pub struct MockStream {
    id: String,
    track: Option<Arc<MockTrack>>,
}

impl MockStream {
    pub fn new(camera: MockCamera, writes: Arc<Mutex<Vec<(String, Constraint)>>>) -> Self {
        let track = (!camera.without_video).then(|| {
            Arc::new(MockTrack {
                settings: Mutex::new(camera.settings.clone()),
                camera,
                writes,
            })
        });
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            track,
        }
    }
}

impl MediaStream for MockStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn video_tracks(&self) -> Vec<Arc<dyn VideoTrack>> {
        self.track
            .iter()
            .map(|track| Arc::clone(track) as Arc<dyn VideoTrack>)
            .collect()
    }
}

/// Video track of a [`MockStream`]; accepted writes update its settings
#[derive(Debug)]
pub struct MockTrack {
    camera: MockCamera,
    settings: Mutex<TrackSettings>,
    writes: Arc<Mutex<Vec<(String, Constraint)>>>,
}

#[async_trait]
impl VideoTrack for MockTrack {
    fn label(&self) -> &str {
        &self.camera.label
    }

    fn capabilities(&self) -> TrackCapabilities {
        self.camera.capabilities.clone()
    }

    fn settings(&self) -> TrackSettings {
        let mut settings = self.settings.lock().map(|s| s.clone()).unwrap_or_default();
        if !self.camera.report_device_id {
            settings.device_id = None;
        }
        settings
    }

    async fn apply_constraint(&self, constraint: Constraint) -> BackendResult<()> {
        if let Ok(mut writes) = self.writes.lock() {
            writes.push((self.camera.id.clone(), constraint));
        }
        if self.camera.reject_constraints {
            return Err(BackendError::ConstraintRejected(format!(
                "{} refuses {}",
                self.camera.id, constraint.parameter
            )));
        }
        if self.camera.capabilities.range(constraint.parameter).is_none() {
            return Err(BackendError::ControlNotSupported(
                constraint.parameter.to_string(),
            ));
        }
        if let Ok(mut settings) = self.settings.lock() {
            settings.set_value(constraint.parameter, Some(constraint.value));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_inventory_repeats_last_snapshot() {
        let inventory = MockInventory::scripted(vec![
            Ok(vec![CameraDevice::placeholder()]),
            Ok(vec![MockCamera::new("/dev/video0", "Cam").device()]),
        ]);

        let first = pollster::block_on(inventory.enumerate()).unwrap();
        let second = pollster::block_on(inventory.enumerate()).unwrap();
        let third = pollster::block_on(inventory.enumerate()).unwrap();

        assert!(first[0].is_placeholder());
        assert_eq!(second[0].id, "/dev/video0");
        assert_eq!(second, third);
        assert_eq!(inventory.enumeration_count(), 3);
    }

    #[test]
    fn test_accepted_write_updates_settings() {
        let camera = MockCamera::new("cam", "Cam").with_parameter(
            Parameter::Contrast,
            MediaRange::new(0.0, 10.0, 1.0),
            5.0,
        );
        let provider = MockStreamProvider::new(vec![camera]);
        let stream =
            pollster::block_on(provider.acquire(StreamRequest::video(None, 640, 480))).unwrap();
        let track = stream.video_tracks().remove(0);

        pollster::block_on(track.apply_constraint(Constraint {
            parameter: Parameter::Contrast,
            value: 7.0,
        }))
        .unwrap();

        assert_eq!(track.settings().contrast, Some(7.0));
        assert_eq!(provider.writes().len(), 1);
    }

    #[test]
    fn test_unsupported_parameter_write_is_rejected() {
        let provider = MockStreamProvider::new(vec![MockCamera::new("cam", "Cam")]);
        let stream =
            pollster::block_on(provider.acquire(StreamRequest::video(None, 640, 480))).unwrap();
        let track = stream.video_tracks().remove(0);

        let result = pollster::block_on(track.apply_constraint(Constraint {
            parameter: Parameter::Sharpness,
            value: 1.0,
        }));
        assert!(matches!(result, Err(BackendError::ControlNotSupported(_))));
    }
}
