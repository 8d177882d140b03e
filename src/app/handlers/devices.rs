// SPDX-License-Identifier: GPL-3.0-only

//! Device list and selection handlers

use crate::app::state::SyncState;
use crate::app::update::Command;
use crate::backends::camera::CameraDevice;
use tracing::{debug, info};

impl SyncState {
    pub(crate) fn handle_refresh_devices(&mut self) -> Vec<Command> {
        vec![Command::EnumerateDevices]
    }

    /// Replace the device list with the video inputs of a fresh snapshot
    pub(crate) fn handle_devices_enumerated(&mut self, devices: Vec<CameraDevice>) -> Vec<Command> {
        let total = devices.len();
        self.devices = devices
            .into_iter()
            .filter(CameraDevice::is_video_input)
            .collect();
        debug!(total, video_inputs = self.devices.len(), "Device list replaced");
        Vec::new()
    }

    /// Record the selection. Opening the device is the runtime's job.
    pub(crate) fn handle_select_device(&mut self, id: String) -> Vec<Command> {
        let id = (!id.is_empty()).then_some(id);
        info!(device = ?id, "Device selected");
        self.selected_device_id = id;
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::app::{Command, Message, SyncState};
    use crate::backends::camera::{CameraDevice, DeviceKind};

    #[test]
    fn test_only_video_inputs_are_kept() {
        let mut state = SyncState::new();
        state.update(Message::DevicesEnumerated(vec![
            CameraDevice::new("/dev/video0", "Cam", DeviceKind::VideoInput),
            CameraDevice::new("/dev/video1", "Cam", DeviceKind::Metadata),
            CameraDevice::new("/dev/video2", "Codec", DeviceKind::VideoOutput),
            CameraDevice::new("/dev/video3", "Other", DeviceKind::Other),
        ]));

        let ids: Vec<&str> = state.devices().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["/dev/video0"]);
    }

    #[test]
    fn test_list_is_replaced_wholesale() {
        let mut state = SyncState::new();
        state.update(Message::DevicesEnumerated(vec![CameraDevice::placeholder()]));
        state.update(Message::DevicesEnumerated(vec![CameraDevice::new(
            "/dev/video4",
            "USB Cam",
            DeviceKind::VideoInput,
        )]));

        assert_eq!(state.devices().len(), 1);
        assert_eq!(state.devices()[0].label, "USB Cam");
    }

    #[test]
    fn test_select_device_is_a_pure_state_update() {
        let mut state = SyncState::new();
        let commands = state.update(Message::SelectDevice("/dev/video2".into()));
        assert!(commands.is_empty());
        assert_eq!(state.selected_device_id(), Some("/dev/video2"));

        state.update(Message::SelectDevice(String::new()));
        assert_eq!(state.selected_device_id(), None);
    }

    #[test]
    fn test_refresh_requests_enumeration() {
        let mut state = SyncState::new();
        assert_eq!(
            state.update(Message::RefreshDevices),
            vec![Command::EnumerateDevices]
        );
    }
}
