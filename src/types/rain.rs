// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rain sensor reading.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::normalize;

/// Reading of the rain sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RainState {
    /// Rain is detected.
    Yes,
    /// No rain is detected.
    #[default]
    No,
}

impl RainState {
    /// Resolves a device code (`"SI"` / `"NO"`), falling back to [`RainState::No`].
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "si" | "sí" => Self::Yes,
            _ => Self::No,
        }
    }

    /// Returns the user-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }

    /// Returns `true` if rain is detected.
    #[must_use]
    pub const fn is_raining(&self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl fmt::Display for RainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
