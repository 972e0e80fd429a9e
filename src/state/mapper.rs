// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Translation from raw device codes to the semantic view.

use crate::types::{
    AlarmState, LockState, OperatingMode, RainState, Temperature, WindowPosition,
};

use super::semantic_view::PLACEHOLDER;
use super::{DeviceState, SemanticDeviceView};

/// Maps raw device records to [`SemanticDeviceView`]s.
///
/// Mapping is pure and total: each field is resolved independently and an
/// unrecognized or missing code takes its fallback (`Closed`, `Manual`,
/// `Disengaged`, `Inactive`, `No`, `"--"`).
///
/// # Examples
///
/// ```
/// use smartview_lib::state::{DeviceState, StateMapper};
/// use smartview_lib::types::{OperatingMode, WindowPosition};
///
/// let raw = DeviceState::from_json(br#"{"ventana":"abierto","modo":"automatico"}"#).unwrap();
/// let view = StateMapper::map(&raw);
///
/// assert_eq!(view.window(), WindowPosition::Open);
/// assert_eq!(view.mode(), OperatingMode::Automatic);
/// assert_eq!(view.temperature_label(), "--");
/// assert_eq!(view.day_night(), "--");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StateMapper;

impl StateMapper {
    /// Derives the semantic view of `state`.
    #[must_use]
    pub fn map(state: &DeviceState) -> SemanticDeviceView {
        SemanticDeviceView {
            window: WindowPosition::from_raw(state.window.as_deref().unwrap_or_default()),
            mode: OperatingMode::from_raw(state.mode.as_deref().unwrap_or_default()),
            lock: LockState::from_raw(state.lock.as_deref().unwrap_or_default()),
            alarm: AlarmState::from_raw(state.alarm.as_deref().unwrap_or_default()),
            rain: RainState::from_raw(state.rain.as_deref().unwrap_or_default()),
            temperature: state.temperature.and_then(Temperature::new),
            day_night: state.day_night.as_deref().unwrap_or(PLACEHOLDER).to_owned(),
        }
    }
}
