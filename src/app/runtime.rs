// SPDX-License-Identifier: GPL-3.0-only

//! Synchronizer runtime
//!
//! Owns the state, the collaborators and the single active stream. Async
//! collaborator calls run as tokio tasks and report back over a channel;
//! each result is applied with one reducer call, so snapshots never mix old
//! and new values.
//!
//! The runtime also plays the stream-acquisition role: whenever the selected
//! device differs from the one last requested, it releases the active stream
//! and requests a new one tagged with a fresh generation. Results from older
//! generations are dropped.

use super::state::{Snapshot, StreamProbe, SyncState};
use super::update::{Command, Message};
use crate::backends::camera::{
    BackendResult, CameraDevice, Constraint, DeviceInventory, FrameReceiver, MediaStream,
    StreamProvider, StreamRequest, first_video_track,
};
use crate::config::Config;
use crate::constants::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Stream parameters and initial selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynchronizerOptions {
    pub width: u32,
    pub height: u32,
    /// Device to open at start; `None` lets the provider choose
    pub initial_device: Option<String>,
    /// Ask streams for preview frames
    pub preview: bool,
}

impl Default for SynchronizerOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            initial_device: None,
            preview: true,
        }
    }
}

impl From<&Config> for SynchronizerOptions {
    fn from(config: &Config) -> Self {
        Self {
            width: config.width,
            height: config.height,
            initial_device: config.initial_device(),
            preview: config.preview,
        }
    }
}

/// Results of collaborator calls
enum Event {
    Devices(BackendResult<Vec<CameraDevice>>),
    Stream {
        generation: u64,
        result: BackendResult<Arc<dyn MediaStream>>,
    },
    ConstraintApplied {
        constraint: Constraint,
        result: BackendResult<()>,
    },
}

pub struct Synchronizer {
    state: SyncState,
    inventory: Arc<dyn DeviceInventory>,
    provider: Arc<dyn StreamProvider>,
    options: SynchronizerOptions,
    active_stream: Option<Arc<dyn MediaStream>>,
    /// Device the latest stream request was made for
    requested_device: Option<String>,
    /// Device of the accepted active stream
    bound_device: Option<String>,
    /// The latest request has not answered yet
    acquiring: bool,
    events_tx: UnboundedSender<Event>,
    events_rx: UnboundedReceiver<Event>,
    in_flight: usize,
}

impl Synchronizer {
    pub fn new(
        inventory: Arc<dyn DeviceInventory>,
        provider: Arc<dyn StreamProvider>,
        options: SynchronizerOptions,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            state: SyncState::new(),
            inventory,
            provider,
            options,
            active_stream: None,
            requested_device: None,
            bound_device: None,
            acquiring: false,
            events_tx,
            events_rx,
            in_flight: 0,
        }
    }

    /// Mount: enumerate devices and open the initial stream.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(&mut self) {
        info!(options = ?self.options, "Starting synchronizer");
        if let Some(device) = self.options.initial_device.clone() {
            self.state.update(Message::SelectDevice(device));
        }
        self.execute(Command::EnumerateDevices);
        let device = self.state.selected_device_id().map(str::to_string);
        self.request_stream(device);
    }

    /// Apply a user intent
    pub fn dispatch(&mut self, message: Message) {
        let explicit = matches!(message, Message::SelectDevice(_));
        self.apply(message, explicit);
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    pub fn active_stream(&self) -> Option<Arc<dyn MediaStream>> {
        self.active_stream.clone()
    }

    /// Id of the active stream, used by the UI to notice stream changes
    pub fn active_stream_id(&self) -> Option<String> {
        self.active_stream.as_ref().map(|stream| stream.id().to_string())
    }

    /// Label of the active stream's first video track
    pub fn active_track_label(&self) -> Option<String> {
        let stream = self.active_stream.as_deref()?;
        first_video_track(stream).map(|track| track.label().to_string())
    }

    pub fn take_preview(&self) -> Option<FrameReceiver> {
        self.active_stream.as_ref()?.take_preview()
    }

    /// Number of collaborator calls still running
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    /// Apply every event that is already available without waiting.
    ///
    /// Returns true if anything was applied.
    pub fn pump(&mut self) -> bool {
        let mut applied = false;
        while let Ok(event) = self.events_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.handle_event(event);
            applied = true;
        }
        applied
    }

    /// Wait for the next collaborator result and apply it.
    ///
    /// Returns false when nothing is in flight.
    pub async fn next_event(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.events_rx.recv().await {
            Some(event) => {
                self.in_flight -= 1;
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Run until every collaborator call, including follow-ups, has finished
    pub async fn settle(&mut self) {
        while self.next_event().await {}
    }

    fn apply(&mut self, message: Message, explicit: bool) {
        for command in self.state.update(message) {
            self.execute(command);
        }
        self.follow_selection(explicit);
    }

    /// Open a stream for the selected device if it was not requested yet.
    ///
    /// An explicit selection of a device whose stream failed retries it.
    fn follow_selection(&mut self, explicit: bool) {
        let Some(selected) = self.state.selected_device_id().map(str::to_string) else {
            return;
        };
        let retry = explicit && !self.acquiring && self.bound_device.as_ref() != Some(&selected);
        if retry || self.requested_device.as_ref() != Some(&selected) {
            self.request_stream(Some(selected));
        }
    }

    fn request_stream(&mut self, device_id: Option<String>) {
        let generation = self.state.next_generation();
        let request = StreamRequest::video(device_id.clone(), self.options.width, self.options.height)
            .with_preview(self.options.preview);
        info!(generation, device = ?device_id, "Requesting stream");
        self.requested_device = device_id;
        self.acquiring = true;

        // Writes must never reach the device being switched away from
        if self.active_stream.take().is_some() {
            debug!(generation, "Released previous stream");
        }
        self.bound_device = None;

        let provider = Arc::clone(&self.provider);
        self.spawn(async move {
            Event::Stream {
                generation,
                result: provider.acquire(request).await,
            }
        });
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::EnumerateDevices => {
                let inventory = Arc::clone(&self.inventory);
                self.spawn(async move { Event::Devices(inventory.enumerate().await) });
            }
            Command::ApplyConstraint(constraint) => {
                let Some(track) = self
                    .active_stream
                    .as_deref()
                    .and_then(|stream| first_video_track(stream))
                else {
                    debug!(parameter = %constraint.parameter, "No active video track, dropping write");
                    return;
                };
                self.spawn(async move {
                    Event::ConstraintApplied {
                        constraint,
                        result: track.apply_constraint(constraint).await,
                    }
                });
            }
        }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            // The receiver lives as long as the synchronizer
            let _ = tx.send(task.await);
        });
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Devices(Ok(devices)) => self.apply(Message::DevicesEnumerated(devices), false),
            Event::Devices(Err(e)) => warn!(error = %e, "Device enumeration failed"),
            Event::Stream { generation, result } => self.handle_stream(generation, result),
            Event::ConstraintApplied { constraint, result } => match result {
                Ok(()) => debug!(parameter = %constraint.parameter, value = constraint.value, "Constraint applied"),
                Err(e) => warn!(
                    parameter = %constraint.parameter,
                    value = constraint.value,
                    error = %e,
                    "Constraint rejected"
                ),
            },
        }
    }

    fn handle_stream(&mut self, generation: u64, result: BackendResult<Arc<dyn MediaStream>>) {
        if !self.state.is_current(generation) {
            debug!(generation, current = self.state.generation(), "Dropping stale stream");
            return;
        }

        self.acquiring = false;

        let stream = match result {
            Ok(stream) => stream,
            Err(e) => {
                warn!(generation, device = ?self.requested_device, error = %e, "Stream acquisition failed");
                return;
            }
        };

        info!(generation, stream = %stream.id(), "Stream acquired");
        let probe = StreamProbe::from_stream(stream.as_ref());
        if self.requested_device.is_none() {
            self.requested_device = probe
                .as_ref()
                .and_then(|probe| probe.settings.device_id.clone());
        }
        self.bound_device = self.requested_device.clone();
        self.active_stream = Some(stream);
        self.apply(Message::StreamAcquired { generation, probe }, false);
    }
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("options", &self.options)
            .field("generation", &self.state.generation())
            .field("requested_device", &self.requested_device)
            .field("bound_device", &self.bound_device)
            .field("active_stream", &self.active_stream_id())
            .field("in_flight", &self.in_flight)
            .finish()
    }
}
