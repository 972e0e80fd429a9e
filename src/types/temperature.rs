// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature reading and comfort bands.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Temperature reported by the controller, in degrees Celsius.
///
/// Only finite readings can be constructed.
///
/// # Examples
///
/// ```
/// use smartview_lib::types::{Temperature, TemperatureBand};
///
/// let t = Temperature::new(22.0).unwrap();
/// assert_eq!(t.label(), "22");
/// assert_eq!(t.band(), TemperatureBand::Comfortable);
///
/// let t = Temperature::new(22.5).unwrap();
/// assert_eq!(t.label(), "22.5");
///
/// assert!(Temperature::new(f64::NAN).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Temperature(f64);

impl Temperature {
    /// Readings below this value are [`TemperatureBand::Cold`].
    pub const COLD_BELOW: f64 = 15.0;
    /// Readings above this value are [`TemperatureBand::Hot`].
    pub const HOT_ABOVE: f64 = 25.0;
    /// Upper end of the display gauge. The lower end is zero.
    pub const GAUGE_MAX: f64 = 50.0;

    /// Creates a reading, rejecting NaN and infinities.
    #[must_use]
    pub fn new(celsius: f64) -> Option<Self> {
        celsius.is_finite().then_some(Self(celsius))
    }

    /// Parses a numeric string such as `"21.5"`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<f64>().ok().and_then(Self::new)
    }

    /// Returns the value in degrees Celsius.
    #[must_use]
    pub const fn celsius(&self) -> f64 {
        self.0
    }

    /// Returns the decimal label, without a trailing `.0` for whole values.
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Classifies the reading.
    #[must_use]
    pub fn band(&self) -> TemperatureBand {
        if self.0 < Self::COLD_BELOW {
            TemperatureBand::Cold
        } else if self.0 > Self::HOT_ABOVE {
            TemperatureBand::Hot
        } else {
            TemperatureBand::Comfortable
        }
    }

    /// Position on the 0..=50 °C gauge as a fraction in `0.0..=1.0`.
    #[must_use]
    pub fn gauge_fraction(&self) -> f64 {
        self.0.clamp(0.0, Self::GAUGE_MAX) / Self::GAUGE_MAX
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // f64 Display already omits ".0" for whole numbers.
        write!(f, "{}", self.0)
    }
}

/// Comfort band of a temperature reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureBand {
    /// Below 15 °C.
    Cold,
    /// Between 15 °C and 25 °C inclusive.
    Comfortable,
    /// Above 25 °C.
    Hot,
}

impl TemperatureBand {
    /// Returns the user-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cold => "Cold",
            Self::Comfortable => "Comfortable",
            Self::Hot => "Hot",
        }
    }
}

impl fmt::Display for TemperatureBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
