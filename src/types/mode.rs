// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operating mode of the controller.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::normalize;

/// Operating mode of the window controller.
///
/// In [`OperatingMode::Manual`] the user drives the window directly; in
/// [`OperatingMode::Automatic`] the controller reacts to its sensors.
///
/// Unknown codes resolve to `Manual`.
///
/// # Examples
///
/// ```
/// use smartview_lib::types::OperatingMode;
///
/// assert_eq!(OperatingMode::from_raw("manual"), OperatingMode::Manual);
/// assert_eq!(OperatingMode::from_raw("automatico"), OperatingMode::Automatic);
/// assert_eq!(OperatingMode::from_raw("Automático"), OperatingMode::Automatic);
/// assert_eq!(OperatingMode::from_raw("???"), OperatingMode::Manual);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OperatingMode {
    /// User-driven operation.
    #[default]
    Manual,
    /// Sensor-driven operation.
    Automatic,
}

impl OperatingMode {
    /// Device code for manual mode.
    pub const RAW_MANUAL: &'static str = "manual";
    /// Device code for automatic mode.
    pub const RAW_AUTOMATIC: &'static str = "automatico";

    /// Resolves a device code, falling back to [`OperatingMode::Manual`].
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "automatico" | "automático" | "auto" => Self::Automatic,
            _ => Self::Manual,
        }
    }

    /// Returns the user-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Automatic => "Automatic",
        }
    }

    /// Returns the code the device uses for this mode.
    #[must_use]
    pub const fn as_raw(&self) -> &'static str {
        match self {
            Self::Manual => Self::RAW_MANUAL,
            Self::Automatic => Self::RAW_AUTOMATIC,
        }
    }

    /// Returns `true` in manual mode.
    #[must_use]
    pub const fn is_manual(&self) -> bool {
        matches!(self, Self::Manual)
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
