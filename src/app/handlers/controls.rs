// SPDX-License-Identifier: GPL-3.0-only

//! Image control handlers

use crate::app::state::SyncState;
use crate::app::update::Command;
use crate::backends::camera::{Constraint, Parameter};
use tracing::debug;

impl SyncState {
    /// The visible value moves at once; the hardware write is fire-and-forget
    /// and never reconciled until the next stream acquisition.
    pub(crate) fn handle_value_changed(&mut self, parameter: Parameter, value: f64) -> Vec<Command> {
        self.values[parameter.index()] = value;
        debug!(%parameter, value, "Setting value");
        vec![Command::ApplyConstraint(Constraint { parameter, value })]
    }
}

#[cfg(test)]
mod tests {
    use crate::app::{Command, Message, SyncState};
    use crate::backends::camera::{Constraint, Parameter};

    #[test]
    fn test_value_change_updates_state_and_requests_write() {
        let mut state = SyncState::new();
        let commands = state.update(Message::ValueChanged(Parameter::Saturation, 42.0));

        assert_eq!(state.value(Parameter::Saturation), 42.0);
        assert_eq!(
            commands,
            vec![Command::ApplyConstraint(Constraint {
                parameter: Parameter::Saturation,
                value: 42.0
            })]
        );
    }

    #[test]
    fn test_value_change_touches_only_its_parameter() {
        let mut state = SyncState::new();
        state.update(Message::ValueChanged(Parameter::Contrast, 12.0));

        assert_eq!(state.value(Parameter::Brightness), 0.0);
        assert_eq!(state.value(Parameter::Saturation), 0.0);
        assert_eq!(state.value(Parameter::Sharpness), 0.0);
    }
}
