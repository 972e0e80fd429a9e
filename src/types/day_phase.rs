// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Day/night classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::normalize;

/// Phase of the day derived from the light sensor text.
///
/// The device reports free text such as `"dia"` or `"noche"`. The text itself
/// is displayed unchanged; this type only classifies it for icon selection.
///
/// # Examples
///
/// ```
/// use smartview_lib::types::DayPhase;
///
/// assert_eq!(DayPhase::classify("dia"), DayPhase::Day);
/// assert_eq!(DayPhase::classify("Día soleado"), DayPhase::Day);
/// assert_eq!(DayPhase::classify("noche"), DayPhase::Night);
/// assert_eq!(DayPhase::classify("--"), DayPhase::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DayPhase {
    /// Daylight.
    Day,
    /// Night.
    Night,
    /// The text could not be classified.
    #[default]
    Unknown,
}

impl DayPhase {
    /// Classifies day/night text by substring.
    #[must_use]
    pub fn classify(text: &str) -> Self {
        let text = normalize(text);
        if text.contains("dia") || text.contains("día") {
            Self::Day
        } else if text.contains("noche") {
            Self::Night
        } else {
            Self::Unknown
        }
    }

    /// Returns the user-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::Night => "Night",
            Self::Unknown => "--",
        }
    }
}

impl fmt::Display for DayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
