// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for types that publish store changes.

use crate::state::{Snapshot, SyncStatus};
use crate::subscription::SubscriptionId;

/// Trait for types that notify listeners about device state changes.
///
/// Implemented by [`StateStore`](crate::state::StateStore) and by
/// [`Dashboard`](crate::Dashboard), which forwards to its store.
///
/// # Examples
///
/// ```
/// use smartview_lib::state::{StateStore, SyncStatus};
/// use smartview_lib::subscription::Subscribable;
///
/// let store = StateStore::new();
/// store.on_status_changed(|status| {
///     if let SyncStatus::Error(message) = status {
///         eprintln!("sync failed: {message}");
///     }
/// });
/// ```
pub trait Subscribable {
    /// Subscribes to snapshot changes.
    ///
    /// The callback runs after every accepted write, with the new snapshot.
    fn on_snapshot_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static;

    /// Subscribes to status transitions.
    ///
    /// The callback runs only when the status differs from the previous one.
    fn on_status_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static;

    /// Removes a subscription.
    ///
    /// Returns `true` if the subscription existed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
