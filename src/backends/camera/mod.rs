// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! The synchronizer talks to hardware only through the traits below.
//!
//! ```text
//! ┌─────────────────────┐
//! │ Terminal UI / CLI   │
//! └──────────┬──────────┘
//!            │ intents / snapshots
//!            ▼
//! ┌─────────────────────┐
//! │    Synchronizer     │  ← state, generation tracking
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────────────────────────────┐
//! │ DeviceInventory · StreamProvider · VideoTrack│  ← collaborator traits
//! └──────────┬──────────────────────┬───────────┘
//!            ▼                      ▼
//!       ┌────────┐             ┌────────┐
//!       │  V4L2  │             │  Mock  │
//!       └────────┘             └────────┘
//! ```

pub mod mock;
pub mod types;
pub mod v4l2;
pub mod v4l2_controls;
pub mod v4l2_utils;

pub use types::*;

pub use crate::errors::{BackendError, BackendResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Source of device inventory snapshots
#[async_trait]
pub trait DeviceInventory: Send + Sync {
    /// Enumerate every device node currently present, of any kind.
    ///
    /// Each call returns a fresh snapshot; there are no change notifications.
    async fn enumerate(&self) -> BackendResult<Vec<CameraDevice>>;
}

/// Opens media streams
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Acquire a stream matching `request`.
    ///
    /// The returned stream owns the device until it is dropped.
    async fn acquire(&self, request: StreamRequest) -> BackendResult<Arc<dyn MediaStream>>;
}

/// A live media stream
pub trait MediaStream: Send + Sync {
    /// Unique id of this stream instance
    fn id(&self) -> &str;

    /// Video tracks carried by the stream, possibly none
    fn video_tracks(&self) -> Vec<Arc<dyn VideoTrack>>;

    /// Take the preview frame receiver. Returns `None` once taken or when the
    /// stream produces no frames.
    fn take_preview(&self) -> Option<FrameReceiver> {
        None
    }
}

/// One video track of a stream
#[async_trait]
pub trait VideoTrack: Send + Sync {
    /// Human-readable device name
    fn label(&self) -> &str;

    /// Hardware-reported ranges, read at call time
    fn capabilities(&self) -> TrackCapabilities;

    /// Hardware-reported current values, read at call time
    fn settings(&self) -> TrackSettings;

    /// Ask the track to adopt a new value for one parameter
    async fn apply_constraint(&self, constraint: Constraint) -> BackendResult<()>;
}

/// First video track of a stream, if any
pub fn first_video_track(stream: &dyn MediaStream) -> Option<Arc<dyn VideoTrack>> {
    stream.video_tracks().into_iter().next()
}
