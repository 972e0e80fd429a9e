// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Alarm state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::normalize;

/// State of the intrusion alarm.
///
/// The device reports `"ACTIVADA"` / `"DESACTIVADA"`. Recognition is
/// case-insensitive and unknown codes resolve to [`AlarmState::Inactive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AlarmState {
    /// The alarm is armed.
    Active,
    /// The alarm is disarmed.
    #[default]
    Inactive,
}

impl AlarmState {
    /// Device code for an armed alarm.
    pub const RAW_ACTIVE: &'static str = "ACTIVADA";
    /// Device code for a disarmed alarm.
    pub const RAW_INACTIVE: &'static str = "DESACTIVADA";

    /// Resolves a device code, falling back to [`AlarmState::Inactive`].
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        if normalize(raw) == "activada" {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    /// Returns the user-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }

    /// Returns the code the device uses for this state.
    #[must_use]
    pub const fn as_raw(&self) -> &'static str {
        match self {
            Self::Active => Self::RAW_ACTIVE,
            Self::Inactive => Self::RAW_INACTIVE,
        }
    }

    /// Returns `true` if the alarm is armed.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
