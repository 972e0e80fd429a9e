// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One-device dashboard wiring.

use std::sync::Arc;
use std::time::Duration;

use crate::command::{CommandDispatcher, DeviceCommand};
use crate::connection::ConnectionManager;
use crate::error::{Error, Result};
use crate::protocol::{CommandChannel, EventSession};
use crate::state::{SemanticDeviceView, Snapshot, StateStore, SyncStatus};
use crate::subscription::{Subscribable, SubscriptionId};
use crate::types::DeviceId;

/// Observes and actuates a single window controller.
///
/// Combines a [`ConnectionManager`], a [`StateStore`] and a
/// [`CommandDispatcher`]. Toggle intents read the current view to decide
/// which command to send; the resulting state change arrives later as a push.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use smartview_lib::Dashboard;
/// use smartview_lib::protocol::{HttpConfig, MqttSession};
/// use smartview_lib::subscription::Subscribable;
/// use smartview_lib::types::DeviceId;
///
/// # async fn example() -> smartview_lib::Result<()> {
/// let session = MqttSession::builder().host("192.168.1.50").build().await?;
/// let commands = HttpConfig::new("http://192.168.1.20:3000")
///     .with_bearer_token("token")
///     .into_client()?;
///
/// let mut dashboard = Dashboard::new(DeviceId::new("ventana1")?, Arc::new(session), commands);
/// dashboard.on_snapshot_changed(|snapshot| {
///     if let Some(view) = &snapshot.view {
///         println!("window {} / mode {}", view.window(), view.mode());
///     }
/// });
///
/// dashboard.open().await?;
/// // ... once the state has loaded:
/// dashboard.toggle_mode().await?;
/// dashboard.close();
/// # Ok(())
/// # }
/// ```
pub struct Dashboard<S: EventSession, C: CommandChannel> {
    device_id: DeviceId,
    store: Arc<StateStore>,
    connection: ConnectionManager<S>,
    dispatcher: CommandDispatcher<C>,
}

impl<S: EventSession, C: CommandChannel> Dashboard<S, C> {
    /// Creates a dashboard for `device_id`. Nothing is connected until
    /// [`open`](Self::open).
    #[must_use]
    pub fn new(device_id: DeviceId, session: Arc<S>, channel: C) -> Self {
        let store = Arc::new(StateStore::new());
        Self {
            device_id,
            connection: ConnectionManager::new(session, Arc::clone(&store)),
            store,
            dispatcher: CommandDispatcher::new(channel),
        }
    }

    /// Bounds the initial fetch.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.connection.set_request_timeout(Some(timeout));
        self
    }

    /// Returns the tracked device.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Returns the shared store.
    #[must_use]
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Returns a copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Returns `true` while the event session is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    /// Opens the event session and issues the initial fetch.
    ///
    /// # Errors
    ///
    /// Returns error if the push subscription fails.
    pub async fn open(&mut self) -> Result<()> {
        self.connection.open(self.device_id.clone()).await
    }

    /// Closes the event session. Idempotent.
    pub fn close(&mut self) {
        self.connection.close();
    }

    /// Sends `command` for the tracked device.
    ///
    /// # Errors
    ///
    /// Returns error if the command channel fails.
    pub async fn send(&self, command: DeviceCommand) -> Result<()> {
        self.dispatcher.send_command(&self.device_id, command).await
    }

    /// Switches between manual and automatic mode.
    ///
    /// Returns the command that was sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoaded`] before the first state arrived, or the
    /// command channel error.
    pub async fn toggle_mode(&self) -> Result<DeviceCommand> {
        let command = DeviceCommand::toggle_mode(self.current_view()?.mode());
        self.send(command).await.map(|()| command)
    }

    /// Engages or releases the security lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoaded`] before the first state arrived, or the
    /// command channel error.
    pub async fn toggle_lock(&self) -> Result<DeviceCommand> {
        let command = DeviceCommand::toggle_lock(self.current_view()?.lock());
        self.send(command).await.map(|()| command)
    }

    /// Arms or disarms the alarm.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoaded`] before the first state arrived, or the
    /// command channel error.
    pub async fn toggle_alarm(&self) -> Result<DeviceCommand> {
        let command = DeviceCommand::toggle_alarm(self.current_view()?.alarm());
        self.send(command).await.map(|()| command)
    }

    /// Opens the window.
    ///
    /// # Errors
    ///
    /// Returns error if the command channel fails.
    pub async fn open_window(&self) -> Result<()> {
        self.send(DeviceCommand::OpenWindow).await
    }

    /// Closes the window.
    ///
    /// # Errors
    ///
    /// Returns error if the command channel fails.
    pub async fn close_window(&self) -> Result<()> {
        self.send(DeviceCommand::CloseWindow).await
    }

    fn current_view(&self) -> Result<SemanticDeviceView> {
        self.store.view().ok_or(Error::NotLoaded)
    }
}

impl<S: EventSession, C: CommandChannel> Subscribable for Dashboard<S, C> {
    fn on_snapshot_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.store.on_snapshot_changed(callback)
    }

    fn on_status_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static,
    {
        self.store.on_status_changed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}

impl<S: EventSession, C: CommandChannel> std::fmt::Debug for Dashboard<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("device_id", &self.device_id)
            .field("open", &self.is_open())
            .field("status", &self.store.status())
            .finish_non_exhaustive()
    }
}
