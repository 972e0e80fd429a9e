// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Synchronization status of the store.

use std::fmt;

use serde::Serialize;

/// Message shown when the backend has no record for the tracked device.
pub const DEVICE_NOT_FOUND_MESSAGE: &str = "No se encontró el dispositivo.";

/// Whether the store holds usable device state.
///
/// Starts as [`SyncStatus::Loading`]. The first successful arrival moves it
/// to [`SyncStatus::Ready`]; a failed initial fetch moves it to
/// [`SyncStatus::Error`]. Any later successful arrival returns to `Ready`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum SyncStatus {
    /// Waiting for the first device state.
    #[default]
    Loading,
    /// Device state is available.
    Ready,
    /// The device state could not be obtained.
    Error(String),
}

impl SyncStatus {
    /// Creates the status used when the device does not exist.
    #[must_use]
    pub fn device_not_found() -> Self {
        Self::Error(DEVICE_NOT_FOUND_MESSAGE.to_string())
    }

    /// Returns `true` while loading.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns `true` when device state is available.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => f.write_str("loading"),
            Self::Ready => f.write_str("ready"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}
