// SPDX-License-Identifier: GPL-3.0-only

//! Message dispatch
//!
//! Every event the synchronizer reacts to is a [`Message`]. Applying one is
//! a pure state transition that may ask the runtime to perform side effects
//! through the returned [`Command`]s.

use super::state::{StreamProbe, SyncState};
use crate::backends::camera::{CameraDevice, Constraint, Parameter};

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Re-read the device inventory
    RefreshDevices,
    /// A device inventory snapshot arrived
    DevicesEnumerated(Vec<CameraDevice>),
    /// The user picked a device; empty means "backend default"
    SelectDevice(String),
    /// A stream became available. `probe` is `None` when it has no video track.
    StreamAcquired {
        generation: u64,
        probe: Option<StreamProbe>,
    },
    /// The user moved a slider
    ValueChanged(Parameter, f64),
}

/// Side effects requested by a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    EnumerateDevices,
    /// Fire-and-forget write against the active stream's video track
    ApplyConstraint(Constraint),
}

impl SyncState {
    pub fn update(&mut self, message: Message) -> Vec<Command> {
        match message {
            Message::RefreshDevices => self.handle_refresh_devices(),
            Message::DevicesEnumerated(devices) => self.handle_devices_enumerated(devices),
            Message::SelectDevice(id) => self.handle_select_device(id),
            Message::StreamAcquired { generation, probe } => {
                self.handle_stream_acquired(generation, probe)
            }
            Message::ValueChanged(parameter, value) => self.handle_value_changed(parameter, value),
        }
    }
}
