// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Window position reported by the controller.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::normalize;

/// Position of the window actuator.
///
/// The device reports `"abierto"` for an open window. Any other value,
/// including a missing field, is treated as closed.
///
/// # Examples
///
/// ```
/// use smartview_lib::types::WindowPosition;
///
/// assert_eq!(WindowPosition::from_raw("abierto"), WindowPosition::Open);
/// assert_eq!(WindowPosition::from_raw("ABIERTO "), WindowPosition::Open);
/// assert_eq!(WindowPosition::from_raw("cerrado"), WindowPosition::Closed);
/// assert_eq!(WindowPosition::from_raw("ajar"), WindowPosition::Closed);
///
/// assert_eq!(WindowPosition::Open.label(), "Open");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WindowPosition {
    /// The window is open.
    Open,
    /// The window is closed.
    #[default]
    Closed,
}

impl WindowPosition {
    /// Device code for an open window.
    pub const RAW_OPEN: &'static str = "abierto";
    /// Device code for a closed window.
    pub const RAW_CLOSED: &'static str = "cerrado";

    /// Resolves a device code, falling back to [`WindowPosition::Closed`].
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        if normalize(raw) == Self::RAW_OPEN {
            Self::Open
        } else {
            Self::Closed
        }
    }

    /// Returns the user-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
        }
    }

    /// Returns the code the device uses for this position.
    #[must_use]
    pub const fn as_raw(&self) -> &'static str {
        match self {
            Self::Open => Self::RAW_OPEN,
            Self::Closed => Self::RAW_CLOSED,
        }
    }

    /// Returns `true` if the window is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for WindowPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
