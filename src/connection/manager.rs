// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle of the event-stream session.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::{ProtocolError, Result};
use crate::protocol::{EventSession, UpdateReceiver, UpdateSubscriptionId};
use crate::state::{DEVICE_NOT_FOUND_MESSAGE, Epoch, Revision, StateStore, WriteOutcome};
use crate::types::DeviceId;

/// Tasks and identity of the currently open session.
struct ActiveSession {
    device_id: DeviceId,
    epoch: Epoch,
    subscription: UpdateSubscriptionId,
    pump: JoinHandle<()>,
    fetch: JoinHandle<()>,
}

/// Owns the single live event-stream session for one device.
///
/// [`open`](Self::open) subscribes to pushes before issuing the one-time
/// initial fetch, so no update published between the two is lost. Both
/// arrivals are written to the shared [`StateStore`] stamped with a
/// [`Revision`]; the store discards whichever turns out to be older.
///
/// [`close`](Self::close) seals the session's epoch in the store before
/// stopping its tasks, so a reply or push still in flight can never land
/// afterwards. Dropping the manager closes the session.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use smartview_lib::connection::ConnectionManager;
/// use smartview_lib::protocol::MqttSession;
/// use smartview_lib::state::StateStore;
/// use smartview_lib::types::DeviceId;
///
/// # async fn example() -> smartview_lib::Result<()> {
/// let session = MqttSession::builder().host("192.168.1.50").build().await?;
/// let store = Arc::new(StateStore::new());
///
/// let mut connection = ConnectionManager::new(Arc::new(session), Arc::clone(&store));
/// connection.open(DeviceId::new("ventana1")?).await?;
///
/// let mut snapshots = store.watch();
/// snapshots.changed().await.ok();
/// println!("{}", snapshots.borrow().status);
///
/// connection.close();
/// # Ok(())
/// # }
/// ```
pub struct ConnectionManager<S: EventSession> {
    session: Arc<S>,
    store: Arc<StateStore>,
    request_timeout: Option<Duration>,
    active: Option<ActiveSession>,
}

impl<S: EventSession> ConnectionManager<S> {
    /// Creates a manager writing arrivals from `session` into `store`.
    #[must_use]
    pub fn new(session: Arc<S>, store: Arc<StateStore>) -> Self {
        Self {
            session,
            store,
            request_timeout: None,
            active: None,
        }
    }

    /// Bounds the initial fetch; an expired fetch is reported as a transport
    /// failure. Unbounded by default.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Replaces the fetch timeout used by the next [`open`](Self::open).
    pub fn set_request_timeout(&mut self, timeout: Option<Duration>) {
        self.request_timeout = timeout;
    }

    /// Returns the configured fetch timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Returns `true` while a session is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Returns the device of the open session.
    #[must_use]
    pub fn device_id(&self) -> Option<&DeviceId> {
        self.active.as_ref().map(|active| &active.device_id)
    }

    /// Returns the store this manager writes to.
    #[must_use]
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Returns the underlying event session.
    #[must_use]
    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    /// Opens a session for `device_id`, replacing any open one.
    ///
    /// The store is reset to loading. Returns once the push subscription is
    /// live and the initial fetch has been issued; results arrive in the
    /// store asynchronously.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`](crate::Error::Protocol) if the push
    /// subscription fails. The store then reports the failure as
    /// [`SyncStatus::Error`](crate::state::SyncStatus::Error) and no session
    /// is open.
    pub async fn open(&mut self, device_id: DeviceId) -> Result<()> {
        self.close();

        let epoch = self.store.begin_epoch();
        tracing::info!(device = %device_id, %epoch, "Opening device session");

        let subscription = match self.session.subscribe_updates().await {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::warn!(device = %device_id, error = %e, "Push subscription failed");
                let revision = self.store.next_revision(epoch);
                self.store.apply_error(revision, e.to_string());
                self.store.seal_epoch(epoch);
                return Err(e.into());
            }
        };

        let pump = tokio::spawn(pump_updates(
            subscription.updates,
            Arc::clone(&self.store),
            device_id.clone(),
            epoch,
        ));

        let revision = self.store.next_revision(epoch);
        let fetch = tokio::spawn(fetch_initial(
            Arc::clone(&self.session),
            Arc::clone(&self.store),
            device_id.clone(),
            revision,
            self.request_timeout,
        ));

        self.active = Some(ActiveSession {
            device_id,
            epoch,
            subscription: subscription.id,
            pump,
            fetch,
        });
        Ok(())
    }

    /// Closes the open session, if any.
    ///
    /// Idempotent. After this returns, nothing from the closed session can
    /// change the store.
    pub fn close(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        self.store.seal_epoch(active.epoch);
        active.pump.abort();
        active.fetch.abort();
        self.session.release(active.subscription);

        tracing::info!(device = %active.device_id, epoch = %active.epoch, "Closed device session");
    }
}

impl<S: EventSession> Drop for ConnectionManager<S> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<S: EventSession> std::fmt::Debug for ConnectionManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("device_id", &self.device_id())
            .field("request_timeout", &self.request_timeout)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Writes pushes into the store until the subscription ends or the session
/// is closed.
async fn pump_updates(
    mut updates: UpdateReceiver,
    store: Arc<StateStore>,
    device_id: DeviceId,
    epoch: Epoch,
) {
    while let Some(state) = updates.recv().await {
        if state.names_other_device(device_id.as_str()) {
            tracing::debug!(
                device = %device_id,
                pushed = ?state.device_id,
                "Ignoring push for another device"
            );
            continue;
        }

        let revision = store.next_revision(epoch);
        match store.apply_state(revision, state) {
            WriteOutcome::Applied => {
                tracing::debug!(device = %device_id, %revision, "Applied device push");
            }
            WriteOutcome::Stale => {}
            WriteOutcome::Closed => break,
        }
    }

    tracing::debug!(device = %device_id, %epoch, "Push stream ended");
}

/// Issues the one-time fetch and records its outcome.
async fn fetch_initial<S: EventSession>(
    session: Arc<S>,
    store: Arc<StateStore>,
    device_id: DeviceId,
    revision: Revision,
    timeout: Option<Duration>,
) {
    tracing::debug!(device = %device_id, %revision, "Requesting initial device state");

    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, session.request_device(&device_id))
            .await
            .unwrap_or_else(|_| {
                Err(ProtocolError::Timeout(
                    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                ))
            }),
        None => session.request_device(&device_id).await,
    };

    let outcome = match result {
        Ok(Some(state)) => store.apply_state(revision, state),
        Ok(None) => {
            tracing::warn!(device = %device_id, "Backend has no such device");
            store.apply_error(revision, DEVICE_NOT_FOUND_MESSAGE)
        }
        Err(e) => {
            tracing::warn!(device = %device_id, error = %e, "Initial fetch failed");
            store.apply_error(revision, e.to_string())
        }
    };

    tracing::debug!(device = %device_id, %revision, ?outcome, "Initial fetch completed");
}
