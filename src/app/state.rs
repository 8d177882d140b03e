// SPDX-License-Identifier: GPL-3.0-only

//! Synchronizer state
//!
//! All mutable state lives in [`SyncState`]. It only changes through
//! [`SyncState::update`](crate::app::SyncState::update); presentation reads
//! immutable [`Snapshot`]s.

use crate::backends::camera::{
    CameraDevice, MediaRange, MediaStream, Parameter, TrackCapabilities, TrackSettings,
    first_video_track,
};

/// Adjustability and bounds of one parameter
///
/// `provided == false` always comes with `min == max == step == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Control {
    pub provided: bool,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Control {
    /// A provided control with the hardware range copied verbatim
    pub fn from_range(range: MediaRange) -> Self {
        Self {
            provided: true,
            min: range.min,
            max: range.max,
            step: range.step,
        }
    }

    /// Move `value` by `steps` increments of `step`, staying inside `[min, max]`.
    ///
    /// Inert controls return `value` unchanged.
    pub fn nudge(&self, value: f64, steps: f64) -> f64 {
        if !self.provided || self.step <= 0.0 {
            return value;
        }
        let moved = value + steps * self.step;
        // Snap onto the min + k*step grid
        let snapped = self.min + ((moved - self.min) / self.step).round() * self.step;
        snapped.clamp(self.min, self.max.max(self.min))
    }

    /// Position of `value` inside the range, 0.0..=1.0
    pub fn ratio(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if !self.provided || span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Capability and settings descriptors read from the first video track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamProbe {
    pub capabilities: TrackCapabilities,
    pub settings: TrackSettings,
}

impl StreamProbe {
    /// Read both descriptors; `None` when the stream has no video track
    pub fn from_stream(stream: &dyn MediaStream) -> Option<Self> {
        let track = first_video_track(stream)?;
        Some(Self {
            capabilities: track.capabilities(),
            settings: track.settings(),
        })
    }
}

/// Immutable view of the state for rendering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub devices: Vec<CameraDevice>,
    pub selected_device_id: Option<String>,
    pub controls: [Control; 4],
    pub values: [f64; 4],
    pub capabilities_json: String,
    pub settings_json: String,
}

impl Snapshot {
    pub fn control(&self, parameter: Parameter) -> Control {
        self.controls[parameter.index()]
    }

    pub fn value(&self, parameter: Parameter) -> f64 {
        self.values[parameter.index()]
    }

    /// Index of the selected device in `devices`
    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected_device_id.as_deref()?;
        self.devices.iter().position(|device| device.id == selected)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncState {
    pub(crate) devices: Vec<CameraDevice>,
    pub(crate) selected_device_id: Option<String>,
    pub(crate) controls: [Control; 4],
    pub(crate) values: [f64; 4],
    pub(crate) capabilities_json: String,
    pub(crate) settings_json: String,
    /// Generation of the most recent stream request
    pub(crate) generation: u64,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    pub fn selected_device_id(&self) -> Option<&str> {
        self.selected_device_id.as_deref()
    }

    pub fn control(&self, parameter: Parameter) -> Control {
        self.controls[parameter.index()]
    }

    pub fn value(&self, parameter: Parameter) -> f64 {
        self.values[parameter.index()]
    }

    pub fn capabilities_json(&self) -> &str {
        &self.capabilities_json
    }

    pub fn settings_json(&self) -> &str {
        &self.settings_json
    }

    /// True while the list is exactly the single pre-permission placeholder
    pub fn has_only_placeholder(&self) -> bool {
        matches!(self.devices.as_slice(), [only] if only.is_placeholder())
    }

    /// Tag a new stream request; older generations become stale
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            devices: self.devices.clone(),
            selected_device_id: self.selected_device_id.clone(),
            controls: self.controls,
            values: self.values,
            capabilities_json: self.capabilities_json.clone(),
            settings_json: self.settings_json.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_control_is_inert() {
        let control = Control::default();
        assert!(!control.provided);
        assert_eq!((control.min, control.max, control.step), (0.0, 0.0, 0.0));
        assert_eq!(control.nudge(3.0, 1.0), 3.0);
    }

    #[test]
    fn test_nudge_clamps_and_snaps() {
        let control = Control::from_range(MediaRange::new(0.0, 100.0, 5.0));
        assert_eq!(control.nudge(50.0, 1.0), 55.0);
        assert_eq!(control.nudge(98.0, 1.0), 100.0);
        assert_eq!(control.nudge(2.0, -1.0), 0.0);
        assert_eq!(control.nudge(52.0, 0.0), 50.0);
    }

    #[test]
    fn test_ratio() {
        let control = Control::from_range(MediaRange::new(-50.0, 50.0, 1.0));
        assert_eq!(control.ratio(0.0), 0.5);
        assert_eq!(control.ratio(100.0), 1.0);
        assert_eq!(Control::default().ratio(10.0), 0.0);
    }

    #[test]
    fn test_placeholder_detection_needs_exactly_one_entry() {
        let mut state = SyncState::new();
        state.devices = vec![CameraDevice::placeholder()];
        assert!(state.has_only_placeholder());

        state.devices.push(CameraDevice::placeholder());
        assert!(!state.has_only_placeholder());

        state.devices.clear();
        assert!(!state.has_only_placeholder());
    }

    #[test]
    fn test_generations_increase() {
        let mut state = SyncState::new();
        let first = state.next_generation();
        let second = state.next_generation();
        assert!(second > first);
        assert!(state.is_current(second));
        assert!(!state.is_current(first));
    }
}
