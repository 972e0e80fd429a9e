// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Security lock state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::normalize;

/// State of the window's security lock.
///
/// The device reports `"activo"` when the lock is engaged; anything else is
/// treated as disengaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LockState {
    /// The lock is engaged.
    Engaged,
    /// The lock is released.
    #[default]
    Disengaged,
}

impl LockState {
    /// Device code for an engaged lock.
    pub const RAW_ENGAGED: &'static str = "activo";
    /// Device code for a released lock.
    pub const RAW_DISENGAGED: &'static str = "desactivo";

    /// Resolves a device code, falling back to [`LockState::Disengaged`].
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        if normalize(raw) == Self::RAW_ENGAGED {
            Self::Engaged
        } else {
            Self::Disengaged
        }
    }

    /// Returns the user-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Engaged => "Engaged",
            Self::Disengaged => "Disengaged",
        }
    }

    /// Returns the code the device uses for this state.
    #[must_use]
    pub const fn as_raw(&self) -> &'static str {
        match self {
            Self::Engaged => Self::RAW_ENGAGED,
            Self::Disengaged => Self::RAW_DISENGAGED,
        }
    }

    /// Returns `true` if the lock is engaged.
    #[must_use]
    pub const fn is_engaged(&self) -> bool {
        matches!(self, Self::Engaged)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
