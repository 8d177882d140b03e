// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 media stream and its single video track

use super::capture::{CaptureThread, NegotiatedFormat};
use crate::backends::camera::types::{
    CameraDevice, Constraint, FrameReceiver, Parameter, TrackCapabilities, TrackSettings,
};
use crate::backends::camera::v4l2_controls::ControlDevice;
use crate::backends::camera::{MediaStream, VideoTrack};
use crate::constants::PREVIEW_CHANNEL_CAPACITY;
use crate::errors::{BackendError, BackendResult};
use async_trait::async_trait;
use futures::channel::mpsc;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// A capture stream on one V4L2 node
pub struct V4l2Stream {
    id: String,
    track: Arc<V4l2Track>,
    preview: Mutex<Option<FrameReceiver>>,
    _capture: CaptureThread,
}

impl V4l2Stream {
    /// Open `device` and start capturing. Blocking.
    ///
    /// Without `preview` the stream carries no frame channel.
    pub fn open(
        device: &CameraDevice,
        width: u32,
        height: u32,
        preview: bool,
    ) -> BackendResult<Self> {
        let controls = ControlDevice::open(&device.id)?;
        let (sender, receiver) = if preview {
            let (sender, receiver) = mpsc::channel(PREVIEW_CHANNEL_CAPACITY);
            (Some(sender), Some(receiver))
        } else {
            (None, None)
        };
        let (capture, format) = CaptureThread::start(&device.id, width, height, sender)?;

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            track: Arc::new(V4l2Track {
                label: device.label.clone(),
                device_id: device.id.clone(),
                controls: Arc::new(controls),
                format,
            }),
            preview: Mutex::new(receiver),
            _capture: capture,
        })
    }
}

impl MediaStream for V4l2Stream {
    fn id(&self) -> &str {
        &self.id
    }

    fn video_tracks(&self) -> Vec<Arc<dyn VideoTrack>> {
        vec![Arc::clone(&self.track) as Arc<dyn VideoTrack>]
    }

    fn take_preview(&self) -> Option<FrameReceiver> {
        self.preview.lock().ok()?.take()
    }
}

impl std::fmt::Debug for V4l2Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V4l2Stream")
            .field("id", &self.id)
            .field("device", &self.track.device_id)
            .finish()
    }
}

/// The video track of a [`V4l2Stream`]
pub struct V4l2Track {
    label: String,
    device_id: String,
    controls: Arc<ControlDevice>,
    format: NegotiatedFormat,
}

#[async_trait]
impl VideoTrack for V4l2Track {
    fn label(&self) -> &str {
        &self.label
    }

    fn capabilities(&self) -> TrackCapabilities {
        let mut caps = TrackCapabilities {
            device_id: Some(self.device_id.clone()),
            width: self.format.width_range,
            height: self.format.height_range,
            ..Default::default()
        };
        for parameter in Parameter::ALL {
            caps.set_range(parameter, self.controls.parameter_range(parameter));
        }
        caps
    }

    fn settings(&self) -> TrackSettings {
        let mut settings = TrackSettings {
            device_id: Some(self.device_id.clone()),
            width: Some(self.format.width),
            height: Some(self.format.height),
            ..Default::default()
        };
        for parameter in Parameter::ALL {
            settings.set_value(parameter, self.controls.parameter_value(parameter));
        }
        settings
    }

    async fn apply_constraint(&self, constraint: Constraint) -> BackendResult<()> {
        let controls = Arc::clone(&self.controls);
        let actual = tokio::task::spawn_blocking(move || {
            controls.set_parameter(constraint.parameter, constraint.value)
        })
        .await
        .map_err(|e| BackendError::Io(format!("blocking task failed: {}", e)))??;

        debug!(
            device = %self.device_id,
            parameter = %constraint.parameter,
            requested = constraint.value,
            actual,
            "Applied constraint"
        );
        Ok(())
    }
}
