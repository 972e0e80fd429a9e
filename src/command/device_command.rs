// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Actuation commands understood by the window controller.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ValueError;
use crate::types::{AlarmState, LockState, OperatingMode};

/// A named actuation request.
///
/// Names are matched exactly, including case: `"open-window"` is a command,
/// `"Open-Window"` is not.
///
/// # Examples
///
/// ```
/// use smartview_lib::command::DeviceCommand;
/// use smartview_lib::types::OperatingMode;
///
/// let cmd: DeviceCommand = "open-window".parse().unwrap();
/// assert_eq!(cmd, DeviceCommand::OpenWindow);
/// assert_eq!(cmd.name(), "open-window");
///
/// assert!("OPEN-WINDOW".parse::<DeviceCommand>().is_err());
///
/// // Toggles pick the command that flips the current state
/// assert_eq!(
///     DeviceCommand::toggle_mode(OperatingMode::Manual),
///     DeviceCommand::SetModeAutomatic
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCommand {
    /// Opens the window.
    OpenWindow,
    /// Closes the window.
    CloseWindow,
    /// Switches to manual mode.
    SetModeManual,
    /// Switches to automatic mode.
    SetModeAutomatic,
    /// Engages the security lock.
    EnableLock,
    /// Releases the security lock.
    DisableLock,
    /// Arms the alarm.
    EnableAlarm,
    /// Disarms the alarm.
    DisableAlarm,
}

impl DeviceCommand {
    /// Every command, in vocabulary order.
    pub const ALL: [Self; 8] = [
        Self::OpenWindow,
        Self::CloseWindow,
        Self::SetModeManual,
        Self::SetModeAutomatic,
        Self::EnableLock,
        Self::DisableLock,
        Self::EnableAlarm,
        Self::DisableAlarm,
    ];

    /// Returns the wire name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpenWindow => "open-window",
            Self::CloseWindow => "close-window",
            Self::SetModeManual => "set-mode-manual",
            Self::SetModeAutomatic => "set-mode-automatic",
            Self::EnableLock => "enable-lock",
            Self::DisableLock => "disable-lock",
            Self::EnableAlarm => "enable-alarm",
            Self::DisableAlarm => "disable-alarm",
        }
    }

    /// Command that flips the operating mode.
    #[must_use]
    pub const fn toggle_mode(current: OperatingMode) -> Self {
        match current {
            OperatingMode::Manual => Self::SetModeAutomatic,
            OperatingMode::Automatic => Self::SetModeManual,
        }
    }

    /// Command that flips the security lock.
    #[must_use]
    pub const fn toggle_lock(current: LockState) -> Self {
        match current {
            LockState::Engaged => Self::DisableLock,
            LockState::Disengaged => Self::EnableLock,
        }
    }

    /// Command that flips the alarm.
    #[must_use]
    pub const fn toggle_alarm(current: AlarmState) -> Self {
        match current {
            AlarmState::Active => Self::DisableAlarm,
            AlarmState::Inactive => Self::EnableAlarm,
        }
    }

    /// Returns the JSON request body, `{"command": "<name>"}`.
    #[must_use]
    pub fn request_body(&self) -> CommandBody {
        CommandBody {
            command: self.name(),
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceCommand {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.name() == s)
            .ok_or_else(|| ValueError::UnknownCommand(s.to_string()))
    }
}

/// JSON body of a command request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandBody {
    /// Command name.
    pub command: &'static str,
}
