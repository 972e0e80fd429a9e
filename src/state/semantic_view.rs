// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Display-ready view of the device.

use serde::Serialize;

use crate::types::{
    AlarmState, DayPhase, LockState, OperatingMode, RainState, Temperature, TemperatureBand,
    WindowPosition,
};

/// Placeholder shown for a value the device did not report.
pub const PLACEHOLDER: &str = "--";

/// Semantic view of the window controller, one value per widget.
///
/// Produced only by [`StateMapper::map`](super::StateMapper::map) from the
/// latest [`DeviceState`](super::DeviceState); it has no setters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticDeviceView {
    pub(crate) window: WindowPosition,
    pub(crate) mode: OperatingMode,
    pub(crate) lock: LockState,
    pub(crate) alarm: AlarmState,
    pub(crate) rain: RainState,
    pub(crate) temperature: Option<Temperature>,
    pub(crate) day_night: String,
}

impl SemanticDeviceView {
    /// Window position.
    #[must_use]
    pub fn window(&self) -> WindowPosition {
        self.window
    }

    /// Operating mode.
    #[must_use]
    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// Security lock state.
    #[must_use]
    pub fn lock(&self) -> LockState {
        self.lock
    }

    /// Alarm state.
    #[must_use]
    pub fn alarm(&self) -> AlarmState {
        self.alarm
    }

    /// Rain sensor reading.
    #[must_use]
    pub fn rain(&self) -> RainState {
        self.rain
    }

    /// Temperature reading, if the device reported a usable number.
    #[must_use]
    pub fn temperature(&self) -> Option<Temperature> {
        self.temperature
    }

    /// Temperature as display text, `"--"` when unknown.
    #[must_use]
    pub fn temperature_label(&self) -> String {
        self.temperature
            .map_or_else(|| PLACEHOLDER.to_string(), |t| t.label())
    }

    /// Comfort band of the temperature, `None` when unknown.
    #[must_use]
    pub fn temperature_band(&self) -> Option<TemperatureBand> {
        self.temperature.map(|t| t.band())
    }

    /// Day/night text exactly as the device reported it, `"--"` when missing.
    #[must_use]
    pub fn day_night(&self) -> &str {
        &self.day_night
    }

    /// Day phase classified from [`day_night`](Self::day_night).
    #[must_use]
    pub fn day_phase(&self) -> DayPhase {
        DayPhase::classify(&self.day_night)
    }

    /// Window buttons are usable only in manual mode.
    #[must_use]
    pub fn window_controls_enabled(&self) -> bool {
        self.mode.is_manual()
    }
}
