// SPDX-License-Identifier: GPL-3.0-only

//! Stream acquisition handler
//!
//! The main synchronization point: brings selection, controls, current
//! values and raw dumps in line with the newly active stream.

use crate::app::state::{Control, StreamProbe, SyncState};
use crate::app::update::Command;
use crate::backends::camera::{Parameter, TrackCapabilities, TrackSettings};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Pretty JSON with two-space indentation
fn dump<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to render descriptor");
        String::new()
    })
}

/// Control and current value for one parameter.
///
/// Adjustable only when the capabilities give a range and the settings give
/// a value; otherwise inert with the value reset to zero.
fn sync_parameter(
    parameter: Parameter,
    capabilities: &TrackCapabilities,
    settings: &TrackSettings,
) -> (Control, f64) {
    match (capabilities.range(parameter), settings.value(parameter)) {
        (Some(range), Some(value)) => (Control::from_range(range), value),
        _ => (Control::default(), 0.0),
    }
}

impl SyncState {
    pub(crate) fn handle_stream_acquired(
        &mut self,
        generation: u64,
        probe: Option<StreamProbe>,
    ) -> Vec<Command> {
        if !self.is_current(generation) {
            debug!(
                generation,
                current = self.generation,
                "Discarding stale stream acquisition"
            );
            return Vec::new();
        }

        let mut commands = Vec::new();

        // Labels and ids are withheld until a device has been opened once
        if self.has_only_placeholder() {
            debug!("Device list is a placeholder, enumerating again");
            commands.push(Command::EnumerateDevices);
        }

        let Some(probe) = probe else {
            info!(generation, "Stream has no video track, keeping previous controls");
            return commands;
        };

        if self.selected_device_id.is_none()
            && let Some(id) = probe.settings.device_id.as_ref().filter(|id| !id.is_empty())
        {
            info!(device = %id, "Adopting device reported by stream");
            self.selected_device_id = Some(id.clone());
        }

        self.capabilities_json = dump(&probe.capabilities);
        self.settings_json = dump(&probe.settings);

        for parameter in Parameter::ALL {
            let (control, value) = sync_parameter(parameter, &probe.capabilities, &probe.settings);
            self.controls[parameter.index()] = control;
            self.values[parameter.index()] = value;
        }

        info!(
            generation,
            device = ?self.selected_device_id,
            brightness = self.control(Parameter::Brightness).provided,
            contrast = self.control(Parameter::Contrast).provided,
            saturation = self.control(Parameter::Saturation).provided,
            sharpness = self.control(Parameter::Sharpness).provided,
            "Stream changed"
        );
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Message;
    use crate::backends::camera::{CameraDevice, MediaRange};

    fn brightness_probe() -> StreamProbe {
        StreamProbe {
            capabilities: TrackCapabilities::default()
                .with_range(Parameter::Brightness, MediaRange::new(0.0, 100.0, 1.0)),
            settings: TrackSettings::default().with_value(Parameter::Brightness, 64.0),
        }
    }

    fn acquired(state: &mut SyncState, probe: Option<StreamProbe>) -> Vec<Command> {
        let generation = state.next_generation();
        state.update(Message::StreamAcquired { generation, probe })
    }

    #[test]
    fn test_brightness_only_stream() {
        let mut state = SyncState::new();
        acquired(&mut state, Some(brightness_probe()));

        assert_eq!(
            state.control(Parameter::Brightness),
            Control {
                provided: true,
                min: 0.0,
                max: 100.0,
                step: 1.0
            }
        );
        assert_eq!(state.value(Parameter::Brightness), 64.0);
        for parameter in [Parameter::Contrast, Parameter::Saturation, Parameter::Sharpness] {
            assert_eq!(state.control(parameter), Control::default());
        }
    }

    #[test]
    fn test_range_without_setting_is_inert() {
        let mut state = SyncState::new();
        acquired(&mut state, Some(brightness_probe()));

        let probe = StreamProbe {
            capabilities: TrackCapabilities::default()
                .with_range(Parameter::Brightness, MediaRange::new(0.0, 100.0, 1.0)),
            settings: TrackSettings::default(),
        };
        acquired(&mut state, Some(probe));

        assert_eq!(state.control(Parameter::Brightness), Control::default());
        assert_eq!(state.value(Parameter::Brightness), 0.0);
    }

    #[test]
    fn test_ranges_are_copied_without_rounding() {
        let mut state = SyncState::new();
        let probe = StreamProbe {
            capabilities: TrackCapabilities::default()
                .with_range(Parameter::Sharpness, MediaRange::new(-0.5, 7.25, 0.125)),
            settings: TrackSettings::default().with_value(Parameter::Sharpness, 9.0),
        };
        acquired(&mut state, Some(probe));

        let control = state.control(Parameter::Sharpness);
        assert_eq!((control.min, control.max, control.step), (-0.5, 7.25, 0.125));
        // Out-of-range settings are not clamped either
        assert_eq!(state.value(Parameter::Sharpness), 9.0);
    }

    #[test]
    fn test_adopts_reported_device_when_none_selected() {
        let mut state = SyncState::new();
        let mut probe = brightness_probe();
        probe.settings.device_id = Some("abc123".into());
        acquired(&mut state, Some(probe));

        assert_eq!(state.selected_device_id(), Some("abc123"));
    }

    #[test]
    fn test_explicit_selection_is_kept() {
        let mut state = SyncState::new();
        state.update(Message::SelectDevice("mine".into()));
        let mut probe = brightness_probe();
        probe.settings.device_id = Some("abc123".into());
        acquired(&mut state, Some(probe));

        assert_eq!(state.selected_device_id(), Some("mine"));
    }

    #[test]
    fn test_placeholder_list_triggers_enumeration() {
        let mut state = SyncState::new();
        state.update(Message::DevicesEnumerated(vec![CameraDevice::placeholder()]));

        let commands = acquired(&mut state, Some(brightness_probe()));
        assert_eq!(commands, vec![Command::EnumerateDevices]);
    }

    #[test]
    fn test_placeholder_check_runs_without_video_track() {
        let mut state = SyncState::new();
        state.update(Message::DevicesEnumerated(vec![CameraDevice::placeholder()]));

        let commands = acquired(&mut state, None);
        assert_eq!(commands, vec![Command::EnumerateDevices]);
    }

    #[test]
    fn test_missing_video_track_keeps_previous_display() {
        let mut state = SyncState::new();
        acquired(&mut state, Some(brightness_probe()));
        let before = state.snapshot();

        acquired(&mut state, None);
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_same_probe_twice_is_idempotent() {
        let mut state = SyncState::new();
        let generation = state.next_generation();
        let probe = Some(brightness_probe());

        state.update(Message::StreamAcquired {
            generation,
            probe: probe.clone(),
        });
        let first = state.snapshot();
        state.update(Message::StreamAcquired { generation, probe });

        assert_eq!(state.snapshot(), first);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut state = SyncState::new();
        let stale = state.next_generation();
        let current = state.next_generation();

        state.update(Message::StreamAcquired {
            generation: current,
            probe: Some(brightness_probe()),
        });
        let before = state.snapshot();

        let mut other = brightness_probe();
        other.settings.brightness = Some(3.0);
        state.update(Message::StreamAcquired {
            generation: stale,
            probe: Some(other),
        });

        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_raw_dumps_are_pretty_json() {
        let mut state = SyncState::new();
        acquired(&mut state, Some(brightness_probe()));

        assert!(state.capabilities_json().contains("\n  \"brightness\": {"));
        assert_eq!(state.settings_json(), "{\n  \"brightness\": 64.0\n}");
    }
}
