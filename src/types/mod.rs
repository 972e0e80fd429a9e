// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for the window controller.
//!
//! The device reports its actuators and sensors as short Spanish codes
//! (`"abierto"`, `"ACTIVADA"`, `"SI"`, ...). Each type in this module
//! recognizes one of those codes and exposes the stable English label shown
//! to users. Recognition never fails: an unknown code resolves to the
//! documented fallback variant.
//!
//! # Types
//!
//! - [`DeviceId`] - Identifier of the tracked device (e.g. `ventana1`)
//! - [`WindowPosition`] - Open/Closed
//! - [`OperatingMode`] - Manual/Automatic
//! - [`LockState`] - Engaged/Disengaged
//! - [`AlarmState`] - Active/Inactive
//! - [`RainState`] - Yes/No
//! - [`DayPhase`] - Day/Night/Unknown
//! - [`Temperature`] and [`TemperatureBand`] - Celsius reading and comfort band

mod alarm;
mod day_phase;
mod device_id;
mod lock;
mod mode;
mod rain;
mod temperature;
mod window;

pub use alarm::AlarmState;
pub use day_phase::DayPhase;
pub use device_id::DeviceId;
pub use lock::LockState;
pub use mode::OperatingMode;
pub use rain::RainState;
pub use temperature::{Temperature, TemperatureBand};
pub use window::WindowPosition;

/// Normalizes a raw device code for comparison.
pub(crate) fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}
