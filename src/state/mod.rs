// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state: raw records, their semantic view, and the observable store.
//!
//! - [`DeviceState`] - The raw record pushed or returned by the backend
//! - [`StateMapper`] - Pure translation to a [`SemanticDeviceView`]
//! - [`StateStore`] - The single current [`Snapshot`] with its [`SyncStatus`]
//! - [`Revision`] / [`Epoch`] - Ordering stamps for concurrent arrivals
//!
//! # Examples
//!
//! ```
//! use smartview_lib::state::{DeviceState, StateMapper};
//! use smartview_lib::types::{AlarmState, LockState};
//!
//! let raw = DeviceState::from_json(br#"{"seguro":"activo","alarma":"ACTIVADA"}"#).unwrap();
//! let view = StateMapper::map(&raw);
//!
//! assert_eq!(view.lock(), LockState::Engaged);
//! assert_eq!(view.alarm(), AlarmState::Active);
//! ```

mod device_state;
mod mapper;
mod revision;
mod semantic_view;
mod store;
mod sync_status;

pub use device_state::DeviceState;
pub use mapper::StateMapper;
pub use revision::{Epoch, Revision};
pub use semantic_view::{PLACEHOLDER, SemanticDeviceView};
pub use store::{Snapshot, StateStore, WriteOutcome};
pub use sync_status::{DEVICE_NOT_FOUND_MESSAGE, SyncStatus};
