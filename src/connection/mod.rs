// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event-stream session management.
//!
//! A [`ConnectionManager`] ties one [`EventSession`](crate::protocol::EventSession)
//! to one [`StateStore`](crate::state::StateStore): it subscribes to pushes,
//! issues the initial fetch, and tears both down again on close.

mod manager;

pub use manager::ConnectionManager;
