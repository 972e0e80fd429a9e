// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for store change notifications.
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Registry storing and dispatching callbacks

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::state::{Snapshot, SyncStatus};

/// Unique identifier for a subscription.
///
/// Returned when registering a callback and used to unsubscribe later. IDs
/// are unique within one registry.
///
/// # Examples
///
/// ```
/// use smartview_lib::state::StateStore;
/// use smartview_lib::subscription::Subscribable;
///
/// let store = StateStore::new();
/// let sub_id = store.on_snapshot_changed(|snapshot| {
///     println!("status is now {}", snapshot.status);
/// });
///
/// assert!(store.unsubscribe(sub_id));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

type SnapshotCallback = Arc<dyn Fn(&Snapshot) + Send + Sync>;

type StatusCallback = Arc<dyn Fn(&SyncStatus) + Send + Sync>;

/// Registry of change callbacks.
///
/// Callbacks are cloned out of the registry before being invoked, so a
/// callback may itself subscribe or unsubscribe without deadlocking.
pub struct CallbackRegistry {
    next_id: AtomicU64,
    snapshot_callbacks: RwLock<HashMap<SubscriptionId, SnapshotCallback>>,
    status_callbacks: RwLock<HashMap<SubscriptionId, StatusCallback>>,
}

impl CallbackRegistry {
    /// Creates a new empty callback registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            snapshot_callbacks: RwLock::new(HashMap::new()),
            status_callbacks: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a callback invoked after every snapshot change.
    pub fn on_snapshot_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.snapshot_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback invoked when the status actually changes.
    pub fn on_status_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.status_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Unregisters a callback by its subscription ID.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.snapshot_callbacks.write().remove(&id).is_some()
            || self.status_callbacks.write().remove(&id).is_some()
    }

    /// Calls every snapshot callback.
    pub fn dispatch_snapshot(&self, snapshot: &Snapshot) {
        let callbacks: Vec<SnapshotCallback> =
            self.snapshot_callbacks.read().values().cloned().collect();
        for callback in callbacks {
            callback(snapshot);
        }
    }

    /// Calls every status callback.
    pub fn dispatch_status(&self, status: &SyncStatus) {
        let callbacks: Vec<StatusCallback> =
            self.status_callbacks.read().values().cloned().collect();
        for callback in callbacks {
            callback(status);
        }
    }

    /// Returns the total number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.snapshot_callbacks.read().len() + self.status_callbacks.read().len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}
