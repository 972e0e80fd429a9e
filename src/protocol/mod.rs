// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transports used to observe and actuate the device.
//!
//! Two independent channels are involved:
//!
//! - An **event session** ([`EventSession`]) that delivers state pushes and
//!   answers the one-time "get device" request. [`MqttSession`] implements it
//!   over an MQTT broker.
//! - A **command channel** ([`CommandChannel`]) that submits actuation
//!   requests. [`HttpCommandClient`] implements it over the backend's REST API.
//!
//! Neither channel waits on the other.

use std::future::Future;

use tokio::sync::mpsc;

use crate::command::DeviceCommand;
use crate::error::ProtocolError;
use crate::state::DeviceState;
use crate::types::DeviceId;

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "mqtt")]
mod mqtt_session;

#[cfg(feature = "http")]
pub use http::{HttpCommandClient, HttpConfig};
#[cfg(feature = "mqtt")]
pub use mqtt_session::{MqttSession, MqttSessionBuilder, MqttSessionConfig};

/// Receiving end of a push subscription.
pub type UpdateReceiver = mpsc::Receiver<DeviceState>;

/// Identifies one push subscription on an [`EventSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpdateSubscriptionId(u64);

impl UpdateSubscriptionId {
    /// Creates an id from a session-allocated number.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UpdateSubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Updates({})", self.0)
    }
}

/// A live push subscription: its id and the stream of pushes.
///
/// Several subscriptions may be open on one session at a time; each one
/// receives every push.
#[derive(Debug)]
pub struct UpdateSubscription {
    /// Pass to [`EventSession::release`] to end this subscription.
    pub id: UpdateSubscriptionId,
    /// Pushes in arrival order.
    pub updates: UpdateReceiver,
}

/// A live event-stream session with the backend.
///
/// Implementations are shared behind an `Arc` by
/// [`ConnectionManager`](crate::connection::ConnectionManager)s, each of
/// which calls [`subscribe_updates`](Self::subscribe_updates) once per opened
/// session and [`release`](Self::release) with its own id when the session
/// closes.
pub trait EventSession: Send + Sync + 'static {
    /// Subscribes to "device updated" pushes.
    ///
    /// Undecodable pushes are skipped by the implementation. The stream ends
    /// after [`release`](Self::release) is called with the returned id;
    /// other subscriptions on the same session are unaffected.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the subscription cannot be established.
    fn subscribe_updates(
        &self,
    ) -> impl Future<Output = Result<UpdateSubscription, ProtocolError>> + Send;

    /// Requests the current state of `device_id`.
    ///
    /// Resolves to `None` when the backend has no such device.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request cannot be sent or the session
    /// ends before the reply arrives.
    fn request_device(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<DeviceState>, ProtocolError>> + Send;

    /// Ends the push subscription `id`. Must be idempotent.
    fn release(&self, id: UpdateSubscriptionId);
}

/// A request channel for actuation commands.
pub trait CommandChannel: Send + Sync {
    /// Submits `command` for `device_id`.
    ///
    /// Succeeds once the backend accepted the request; the response body is
    /// not interpreted.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` on transport failure or a non-success status.
    fn send_command(
        &self,
        device_id: &DeviceId,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), ProtocolError>> + Send;
}
