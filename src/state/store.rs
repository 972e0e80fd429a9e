// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Observable single-snapshot store.
//!
//! [`StateStore`] holds the one current [`SemanticDeviceView`] and its
//! [`SyncStatus`]. Writes come from two places:
//!
//! - **Unconditional writes** ([`set_state`](StateStore::set_state),
//!   [`set_error`](StateStore::set_error)) always land and take a fresh
//!   revision, so any arrival stamped earlier becomes stale.
//! - **Session writes** ([`apply_state`](StateStore::apply_state),
//!   [`apply_error`](StateStore::apply_error)) carry the [`Revision`] the
//!   connection stamped on them and are checked against the stored one.
//!
//! Ordering of session writes: when both the stored and the incoming record
//! carry `updatedAt`, the older timestamp loses; otherwise the lower `seq`
//! loses. Writes from a sealed or superseded epoch are rejected.
//!
//! Every accepted write is published on a [`tokio::sync::watch`] channel
//! while the lock is held, then dispatched to callbacks after it is released.
//! Callback delivery is serialized and always hands out the latest snapshot:
//! a writer that loses the race to deliver finds its snapshot superseded and
//! skips it, so no callback ever sees a snapshot older than one it already
//! received.

use std::cell::RefCell;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard, ReentrantMutex};
use tokio::sync::watch;

use crate::subscription::{CallbackRegistry, Subscribable, SubscriptionId};

use super::{DeviceState, Epoch, Revision, SemanticDeviceView, StateMapper, SyncStatus};

/// Point-in-time copy of the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    /// Current semantic view, `None` until the first state arrives.
    pub view: Option<SemanticDeviceView>,
    /// Synchronization status.
    pub status: SyncStatus,
    /// Revision of the last accepted write.
    pub revision: Option<Revision>,
}

/// Result of a session write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write was stored and published.
    Applied,
    /// A newer arrival is already stored; the write was discarded.
    Stale,
    /// The write belongs to a closed session; it was discarded.
    Closed,
}

impl WriteOutcome {
    /// Returns `true` if the write landed.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

struct Inner {
    snapshot: Snapshot,
    updated_at: Option<DateTime<Utc>>,
    epoch: Epoch,
    sealed: bool,
    next_seq: u64,
    /// Bumped on every publish; orders callback delivery.
    version: u64,
}

/// What callbacks have been handed so far.
#[derive(Default)]
struct Delivered {
    version: u64,
    status: SyncStatus,
}

impl Inner {
    fn allocate(&mut self, epoch: Epoch) -> Revision {
        self.next_seq += 1;
        Revision::new(epoch, self.next_seq)
    }

    fn accepts_epoch(&self, epoch: Epoch) -> bool {
        !self.sealed && epoch == self.epoch
    }

    /// Returns `true` if the stored arrival is newer than the incoming one.
    fn supersedes(&self, revision: Revision, updated_at: Option<DateTime<Utc>>) -> bool {
        if let (Some(stored), Some(incoming)) = (self.updated_at, updated_at)
            && stored != incoming
        {
            return stored > incoming;
        }
        self.snapshot
            .revision
            .is_some_and(|current| current.seq() > revision.seq())
    }

    fn store_state(&mut self, revision: Revision, state: &DeviceState) {
        self.snapshot = Snapshot {
            view: Some(StateMapper::map(state)),
            status: SyncStatus::Ready,
            revision: Some(revision),
        };
        self.updated_at = state.updated_at;
    }

    fn store_error(&mut self, revision: Revision, message: String) {
        self.snapshot.status = SyncStatus::Error(message);
        self.snapshot.revision = Some(revision);
    }
}

/// Single source of truth for the tracked device.
///
/// Usually shared as `Arc<StateStore>` between a
/// [`ConnectionManager`](crate::connection::ConnectionManager) and the
/// presentation layer.
///
/// # Examples
///
/// ```
/// use smartview_lib::state::{DeviceState, StateStore, SyncStatus};
/// use smartview_lib::types::WindowPosition;
///
/// let store = StateStore::new();
/// assert!(store.snapshot().status.is_loading());
///
/// let raw = DeviceState::from_json(br#"{"ventana":"abierto"}"#).unwrap();
/// store.set_state(raw);
///
/// let snapshot = store.snapshot();
/// assert_eq!(snapshot.status, SyncStatus::Ready);
/// assert_eq!(snapshot.view.unwrap().window(), WindowPosition::Open);
/// ```
pub struct StateStore {
    inner: Mutex<Inner>,
    snapshot_tx: watch::Sender<Snapshot>,
    callbacks: CallbackRegistry,
    // Reentrant so a callback may write to the store.
    delivery: ReentrantMutex<RefCell<Delivered>>,
}

impl StateStore {
    /// Creates an empty store in [`SyncStatus::Loading`].
    #[must_use]
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(Snapshot::default());
        Self {
            inner: Mutex::new(Inner {
                snapshot: Snapshot::default(),
                updated_at: None,
                epoch: Epoch::default(),
                sealed: false,
                next_seq: 0,
                version: 0,
            }),
            snapshot_tx,
            callbacks: CallbackRegistry::new(),
            delivery: ReentrantMutex::new(RefCell::new(Delivered::default())),
        }
    }

    /// Returns a copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.inner.lock().snapshot.clone()
    }

    /// Returns the current view, if any.
    #[must_use]
    pub fn view(&self) -> Option<SemanticDeviceView> {
        self.inner.lock().snapshot.view.clone()
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.inner.lock().snapshot.status.clone()
    }

    /// Returns a receiver that observes every published snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Stores `state` as the current device state and marks the store ready.
    pub fn set_state(&self, state: DeviceState) {
        let mut inner = self.inner.lock();
        let epoch = inner.epoch;
        let revision = inner.allocate(epoch);
        inner.store_state(revision, &state);
        self.publish(inner);
    }

    /// Marks the store failed with `message`, keeping the previous view.
    pub fn set_error(&self, message: impl Into<String>) {
        let mut inner = self.inner.lock();
        let epoch = inner.epoch;
        let revision = inner.allocate(epoch);
        inner.store_error(revision, message.into());
        self.publish(inner);
    }

    /// Stores a state arrival stamped with `revision`, unless it is stale or
    /// its session has been closed.
    pub fn apply_state(&self, revision: Revision, state: DeviceState) -> WriteOutcome {
        let mut inner = self.inner.lock();
        if !inner.accepts_epoch(revision.epoch()) {
            tracing::debug!(%revision, "Discarding state from closed session");
            return WriteOutcome::Closed;
        }
        if inner.supersedes(revision, state.updated_at) {
            tracing::debug!(%revision, "Discarding stale state");
            return WriteOutcome::Stale;
        }
        inner.store_state(revision, &state);
        self.publish(inner);
        WriteOutcome::Applied
    }

    /// Marks the store failed on behalf of the arrival stamped with
    /// `revision`, unless a newer arrival already landed or its session has
    /// been closed.
    pub fn apply_error(&self, revision: Revision, message: impl Into<String>) -> WriteOutcome {
        let mut inner = self.inner.lock();
        if !inner.accepts_epoch(revision.epoch()) {
            tracing::debug!(%revision, "Discarding error from closed session");
            return WriteOutcome::Closed;
        }
        if inner.supersedes(revision, None) {
            tracing::debug!(%revision, "Discarding stale error");
            return WriteOutcome::Stale;
        }
        inner.store_error(revision, message.into());
        self.publish(inner);
        WriteOutcome::Applied
    }

    /// Starts a new session epoch.
    ///
    /// The store is reset to [`SyncStatus::Loading`] with no view, and every
    /// revision from earlier epochs is rejected from now on.
    pub fn begin_epoch(&self) -> Epoch {
        let mut inner = self.inner.lock();
        let epoch = Epoch::new(inner.epoch.value() + 1);
        inner.epoch = epoch;
        inner.sealed = false;
        inner.updated_at = None;
        inner.snapshot = Snapshot::default();
        self.publish(inner);
        epoch
    }

    /// Seals `epoch` so that no further session write from it can land.
    ///
    /// Returns `false` if `epoch` is not the current epoch or is already sealed.
    pub fn seal_epoch(&self, epoch: Epoch) -> bool {
        let mut inner = self.inner.lock();
        if !inner.accepts_epoch(epoch) {
            return false;
        }
        inner.sealed = true;
        true
    }

    /// Allocates the next revision for an arrival belonging to `epoch`.
    pub fn next_revision(&self, epoch: Epoch) -> Revision {
        self.inner.lock().allocate(epoch)
    }

    /// Returns the current epoch.
    #[must_use]
    pub fn epoch(&self) -> Epoch {
        self.inner.lock().epoch
    }

    fn publish(&self, mut inner: MutexGuard<'_, Inner>) {
        inner.version += 1;
        self.snapshot_tx.send_replace(inner.snapshot.clone());
        drop(inner);

        self.deliver();
    }

    /// Hands the latest snapshot to callbacks unless it was already delivered.
    ///
    /// Lock order is `delivery` then `inner`; writers release `inner` before
    /// getting here, so a callback may read the store from any thread.
    fn deliver(&self) {
        let delivery = self.delivery.lock();

        let (snapshot, version) = {
            let inner = self.inner.lock();
            (inner.snapshot.clone(), inner.version)
        };

        let status_changed = {
            let mut delivered = delivery.borrow_mut();
            if version <= delivered.version {
                return;
            }
            delivered.version = version;
            let changed = delivered.status != snapshot.status;
            if changed {
                delivered.status = snapshot.status.clone();
            }
            changed
        };

        self.callbacks.dispatch_snapshot(&snapshot);
        if status_changed {
            self.callbacks.dispatch_status(&snapshot.status);
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("StateStore")
            .field("status", &inner.snapshot.status)
            .field("revision", &inner.snapshot.revision)
            .field("epoch", &inner.epoch)
            .field("sealed", &inner.sealed)
            .finish_non_exhaustive()
    }
}

impl Subscribable for StateStore {
    fn on_snapshot_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.callbacks.on_snapshot_changed(callback)
    }

    fn on_status_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static,
    {
        self.callbacks.on_status_changed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::{OperatingMode, WindowPosition};

    fn raw(json: &str) -> DeviceState {
        DeviceState::from_json(json.as_bytes()).unwrap()
    }

    fn window(store: &StateStore) -> Option<WindowPosition> {
        store.view().map(|view| view.window())
    }

    #[test]
    fn new_store_is_loading_without_view() {
        let store = StateStore::new();
        let snapshot = store.snapshot();
        assert!(snapshot.status.is_loading());
        assert!(snapshot.view.is_none());
        assert!(snapshot.revision.is_none());
    }

    #[test]
    fn set_error_keeps_view() {
        let store = StateStore::new();
        store.set_state(raw(r#"{"ventana":"abierto"}"#));
        store.set_error("link down");

        let snapshot = store.snapshot();
        assert_eq!(snapshot.status, SyncStatus::Error("link down".to_string()));
        assert_eq!(snapshot.view.map(|v| v.window()), Some(WindowPosition::Open));
    }

    #[test]
    fn later_push_overrides_error() {
        let store = StateStore::new();
        let epoch = store.begin_epoch();
        let fetch = store.next_revision(epoch);
        assert_eq!(
            store.apply_error(fetch, SyncStatus::device_not_found().error_message().unwrap()),
            WriteOutcome::Applied
        );

        let push = store.next_revision(epoch);
        assert!(store.apply_state(push, raw(r#"{"modo":"automatico"}"#)).is_applied());

        let snapshot = store.snapshot();
        assert!(snapshot.status.is_ready());
        assert_eq!(snapshot.view.map(|v| v.mode()), Some(OperatingMode::Automatic));
    }

    #[test]
    fn fetch_issued_before_push_is_stale() {
        let store = StateStore::new();
        let epoch = store.begin_epoch();
        let fetch = store.next_revision(epoch);
        let push = store.next_revision(epoch);

        assert!(store.apply_state(push, raw(r#"{"ventana":"abierto"}"#)).is_applied());
        assert_eq!(
            store.apply_state(fetch, raw(r#"{"ventana":"cerrado"}"#)),
            WriteOutcome::Stale
        );
        assert_eq!(window(&store), Some(WindowPosition::Open));
    }

    #[test]
    fn fetch_error_after_push_is_stale() {
        let store = StateStore::new();
        let epoch = store.begin_epoch();
        let fetch = store.next_revision(epoch);
        let push = store.next_revision(epoch);

        store.apply_state(push, raw("{}"));
        assert_eq!(store.apply_error(fetch, "timeout"), WriteOutcome::Stale);
        assert!(store.status().is_ready());
    }

    #[test]
    fn backend_timestamps_take_precedence() {
        let store = StateStore::new();
        let epoch = store.begin_epoch();
        let fetch = store.next_revision(epoch);
        let push = store.next_revision(epoch);

        store.apply_state(
            push,
            raw(r#"{"ventana":"cerrado","updatedAt":"2024-06-04T10:00:00Z"}"#),
        );
        let outcome = store.apply_state(
            fetch,
            raw(r#"{"ventana":"abierto","updatedAt":"2024-06-04T10:00:05Z"}"#),
        );

        assert_eq!(outcome, WriteOutcome::Applied);
        assert_eq!(window(&store), Some(WindowPosition::Open));
    }

    #[test]
    fn older_timestamp_loses_even_with_higher_seq() {
        let store = StateStore::new();
        let epoch = store.begin_epoch();
        let first = store.next_revision(epoch);
        let second = store.next_revision(epoch);

        store.apply_state(
            first,
            raw(r#"{"ventana":"abierto","updatedAt":"2024-06-04T10:00:05Z"}"#),
        );
        let outcome = store.apply_state(
            second,
            raw(r#"{"ventana":"cerrado","updatedAt":"2024-06-04T10:00:00Z"}"#),
        );

        assert_eq!(outcome, WriteOutcome::Stale);
        assert_eq!(window(&store), Some(WindowPosition::Open));
    }

    #[test]
    fn sealed_epoch_rejects_writes() {
        let store = StateStore::new();
        let epoch = store.begin_epoch();
        let revision = store.next_revision(epoch);

        assert!(store.seal_epoch(epoch));
        assert!(!store.seal_epoch(epoch));
        assert_eq!(store.apply_state(revision, raw("{}")), WriteOutcome::Closed);
        assert_eq!(store.apply_error(revision, "late"), WriteOutcome::Closed);
        assert!(store.status().is_loading());
    }

    #[test]
    fn previous_epoch_rejected_after_begin() {
        let store = StateStore::new();
        let old = store.begin_epoch();
        let revision = store.next_revision(old);
        let new = store.begin_epoch();

        assert_ne!(old, new);
        assert_eq!(store.apply_state(revision, raw("{}")), WriteOutcome::Closed);
    }

    #[test]
    fn begin_epoch_resets_to_loading() {
        let store = StateStore::new();
        store.set_state(raw(r#"{"ventana":"abierto"}"#));
        store.begin_epoch();

        let snapshot = store.snapshot();
        assert!(snapshot.status.is_loading());
        assert!(snapshot.view.is_none());
    }

    #[test]
    fn set_state_makes_pending_arrivals_stale() {
        let store = StateStore::new();
        let epoch = store.begin_epoch();
        let fetch = store.next_revision(epoch);

        store.set_state(raw(r#"{"ventana":"abierto"}"#));
        assert_eq!(
            store.apply_state(fetch, raw(r#"{"ventana":"cerrado"}"#)),
            WriteOutcome::Stale
        );
    }

    #[test]
    fn callbacks_fire_after_writes() {
        let store = StateStore::new();
        let statuses = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let snapshots = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let statuses_clone = Arc::clone(&statuses);
        store.on_status_changed(move |status| statuses_clone.lock().push(status.clone()));
        let snapshots_clone = Arc::clone(&snapshots);
        store.on_snapshot_changed(move |_| {
            snapshots_clone.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        store.set_state(raw("{}"));
        store.set_state(raw(r#"{"ventana":"abierto"}"#));
        store.set_error("gone");

        assert_eq!(snapshots.load(std::sync::atomic::Ordering::SeqCst), 3);
        assert_eq!(
            *statuses.lock(),
            vec![SyncStatus::Ready, SyncStatus::Error("gone".to_string())]
        );
    }

    #[test]
    fn callback_can_read_store() {
        let store = Arc::new(StateStore::new());
        let seen = Arc::new(parking_lot::Mutex::new(None));

        let store_clone = Arc::clone(&store);
        let seen_clone = Arc::clone(&seen);
        store.on_snapshot_changed(move |_| {
            *seen_clone.lock() = Some(store_clone.status());
        });

        store.set_state(raw("{}"));
        assert_eq!(*seen.lock(), Some(SyncStatus::Ready));
    }

    #[test]
    fn slow_callback_never_ends_on_older_snapshot() {
        use std::time::Duration;

        let store = Arc::new(StateStore::new());
        let epoch = store.begin_epoch();
        let fetch = store.next_revision(epoch);
        let push = store.next_revision(epoch);

        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        store.on_snapshot_changed(move |snapshot| {
            let window = snapshot.view.as_ref().map(SemanticDeviceView::window);
            if window == Some(WindowPosition::Closed) {
                let _ = entered_tx.send(());
                std::thread::sleep(Duration::from_millis(200));
            }
            seen_clone.lock().push(window);
        });

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.apply_state(fetch, raw(r#"{"ventana":"cerrado"}"#)))
        };
        // The fetch callback is now sleeping inside delivery
        entered_rx.recv().unwrap();
        let pushed = store.apply_state(push, raw(r#"{"ventana":"abierto"}"#));
        let fetched = writer.join().unwrap();

        assert!(fetched.is_applied());
        assert!(pushed.is_applied());
        assert_eq!(window(&store), Some(WindowPosition::Open));
        assert_eq!(seen.lock().last().copied(), Some(window(&store)));
    }

    #[test]
    fn callback_may_write_to_store() {
        let store = Arc::new(StateStore::new());
        let store_clone = Arc::clone(&store);
        store.on_status_changed(move |status| {
            if status.is_ready() {
                store_clone.set_error("rejected by observer");
            }
        });

        store.set_state(raw("{}"));
        assert_eq!(store.status().error_message(), Some("rejected by observer"));
    }

    #[test]
    fn watch_receives_latest_snapshot() {
        let store = StateStore::new();
        let mut rx = store.watch();
        assert!(rx.borrow_and_update().status.is_loading());

        store.set_state(raw(r#"{"ventana":"abierto"}"#));
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().status.is_ready());
    }
}
