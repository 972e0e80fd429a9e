// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT event session.
//!
//! The backend publishes every device change on
//! `<prefix>/events/deviceUpdate` and answers "get device" requests
//! published on `<prefix>/rpc/getDevice`. Replies are sent to the topic the
//! request names in `replyTo`, which is private to this client:
//! `<prefix>/rpc/reply/<client-id>`.
//!
//! ```text
//! request  -> <prefix>/rpc/getDevice      {"deviceId":"ventana1","requestId":"<uuid>","replyTo":"<prefix>/rpc/reply/<client-id>"}
//! reply    <- <prefix>/rpc/reply/<id>     {"requestId":"<uuid>","device":{...} | null | false}
//! push     <- <prefix>/events/deviceUpdate {...}
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use smartview_lib::protocol::{EventSession, MqttSession};
//! use smartview_lib::types::DeviceId;
//!
//! # async fn example() -> smartview_lib::Result<()> {
//! let session = MqttSession::builder()
//!     .host("192.168.1.50")
//!     .port(1883)
//!     .credentials("user", "password")
//!     .build()
//!     .await?;
//!
//! let mut subscription = session.subscribe_updates().await?;
//! let device = session.request_device(&DeviceId::new("ventana1")?).await?;
//! println!("initial state: {device:?}");
//!
//! while let Some(state) = subscription.updates.recv().await {
//!     println!("push: {state:?}");
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::error::ProtocolError;
use crate::protocol::{EventSession, UpdateSubscription, UpdateSubscriptionId};
use crate::state::DeviceState;
use crate::types::DeviceId;

/// Global counter for generating unique client IDs.
static SESSION_CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Capacity of the push channel handed to subscribers.
const UPDATE_CHANNEL_CAPACITY: usize = 32;

/// Configuration for an MQTT event session.
#[derive(Debug, Clone)]
pub struct MqttSessionConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    keep_alive: Duration,
    connection_timeout: Duration,
    topic_prefix: String,
}

impl MqttSessionConfig {
    /// Default topic prefix.
    pub const DEFAULT_TOPIC_PREFIX: &'static str = "smartview";
}

impl Default for MqttSessionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            credentials: None,
            keep_alive: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            topic_prefix: Self::DEFAULT_TOPIC_PREFIX.to_string(),
        }
    }
}

/// Reply to a "get device" request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceReply {
    request_id: Uuid,
    #[serde(default)]
    device: Value,
}

/// An event session on an MQTT broker.
///
/// Cheaply cloneable; all clones share one connection. Any number of push
/// subscriptions may be open at once and each receives every push. The
/// broker subscription is held while at least one of them is open.
#[derive(Clone)]
pub struct MqttSession {
    inner: Arc<MqttSessionInner>,
}

struct MqttSessionInner {
    client: AsyncClient,
    client_id: String,
    config: MqttSessionConfig,
    connected: AtomicBool,
    next_subscription: AtomicU64,
    /// Open push subscriptions.
    subscribers: Mutex<HashMap<UpdateSubscriptionId, mpsc::Sender<DeviceState>>>,
    /// Outstanding "get device" requests by request id.
    pending: Mutex<HashMap<Uuid, oneshot::Sender<Option<DeviceState>>>>,
}

/// Removes a pending request when its future completes or is dropped.
struct PendingRequest {
    inner: Arc<MqttSessionInner>,
    request_id: Uuid,
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        self.inner.pending.lock().remove(&self.request_id);
    }
}

impl MqttSession {
    /// Creates a new builder for configuring an MQTT session.
    #[must_use]
    pub fn builder() -> MqttSessionBuilder {
        MqttSessionBuilder::default()
    }

    fn from_parts(client: AsyncClient, client_id: String, config: MqttSessionConfig) -> Self {
        Self {
            inner: Arc::new(MqttSessionInner {
                client,
                client_id,
                config,
                connected: AtomicBool::new(false),
                next_subscription: AtomicU64::new(1),
                subscribers: Mutex::new(HashMap::new()),
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Returns the number of open push subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Returns whether the broker connection is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the MQTT client id of this session.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    /// Returns the host address of the broker.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Returns the port of the broker.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.config.port
    }

    /// Topic carrying state pushes.
    #[must_use]
    pub fn update_topic(&self) -> String {
        format!("{}/events/deviceUpdate", self.inner.config.topic_prefix)
    }

    /// Topic "get device" requests are published to.
    #[must_use]
    pub fn request_topic(&self) -> String {
        format!("{}/rpc/getDevice", self.inner.config.topic_prefix)
    }

    /// Topic this session receives replies on.
    #[must_use]
    pub fn reply_topic(&self) -> String {
        reply_topic(&self.inner.config.topic_prefix, &self.inner.client_id)
    }

    /// Returns the number of requests still waiting for a reply.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Disconnects from the broker.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );

        self.inner.subscribers.lock().clear();
        self.inner.pending.lock().clear();

        self.inner
            .client
            .disconnect()
            .await
            .map_err(ProtocolError::Mqtt)?;

        self.inner.connected.store(false, Ordering::Release);
        Ok(())
    }

    /// Routes an incoming publish to the push subscriber or a pending request.
    async fn route_message(&self, topic: &str, payload: &[u8]) {
        if topic == self.update_topic() {
            let state = match DeviceState::from_json(payload) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(topic = %topic, error = %e, "Skipping undecodable push");
                    return;
                }
            };
            let senders: Vec<_> = self.inner.subscribers.lock().values().cloned().collect();
            for tx in senders {
                // Ignore send errors - the subscriber may have gone away
                let _ = tx.send(state.clone()).await;
            }
        } else if topic == self.reply_topic() {
            self.complete_request(payload);
        }
    }

    fn complete_request(&self, payload: &[u8]) {
        let reply: DeviceReply = match serde_json::from_slice(payload) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed device reply");
                return;
            }
        };

        let Some(tx) = self.inner.pending.lock().remove(&reply.request_id) else {
            tracing::debug!(request_id = %reply.request_id, "Reply for unknown request");
            return;
        };

        let device = match reply.device {
            Value::Object(_) => match DeviceState::from_value(reply.device) {
                Ok(state) => Some(state),
                Err(e) => {
                    tracing::warn!(error = %e, "Device reply could not be decoded");
                    None
                }
            },
            _ => None,
        };

        // Ignore send errors - the requester may have been cancelled
        let _ = tx.send(device);
    }
}

impl EventSession for MqttSession {
    async fn subscribe_updates(&self) -> Result<UpdateSubscription, ProtocolError> {
        let topic = self.update_topic();
        let id = UpdateSubscriptionId::new(
            self.inner.next_subscription.fetch_add(1, Ordering::Relaxed),
        );
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);

        {
            // Broker requests are queued under the lock so a concurrent
            // last release cannot unsubscribe after this subscribe.
            let mut subscribers = self.inner.subscribers.lock();
            if subscribers.is_empty() {
                self.inner
                    .client
                    .try_subscribe(&topic, QoS::AtLeastOnce)
                    .map_err(ProtocolError::Mqtt)?;
                tracing::debug!(topic = %topic, "Subscribed to device updates");
            }
            subscribers.insert(id, tx);
        }

        tracing::debug!(subscription = %id, "Opened push subscription");
        Ok(UpdateSubscription { id, updates: rx })
    }

    async fn request_device(
        &self,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceState>, ProtocolError> {
        let request_id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().insert(request_id, tx);
        let _pending = PendingRequest {
            inner: Arc::clone(&self.inner),
            request_id,
        };

        let topic = self.request_topic();
        let payload = serde_json::json!({
            "deviceId": device_id.as_str(),
            "requestId": request_id,
            "replyTo": self.reply_topic(),
        })
        .to_string();

        tracing::debug!(topic = %topic, device = %device_id, request_id = %request_id, "Requesting device");

        self.inner
            .client
            .publish(&topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(ProtocolError::Mqtt)?;

        rx.await.map_err(|_| {
            ProtocolError::ChannelClosed("MQTT session ended before the device reply".to_string())
        })
    }

    fn release(&self, id: UpdateSubscriptionId) {
        let mut subscribers = self.inner.subscribers.lock();
        if subscribers.remove(&id).is_none() {
            return;
        }
        tracing::debug!(subscription = %id, "Released push subscription");

        if !subscribers.is_empty() {
            return;
        }
        let topic = self.update_topic();
        if let Err(e) = self.inner.client.try_unsubscribe(&topic) {
            tracing::warn!(topic = %topic, error = %e, "Failed to unsubscribe from device updates");
        } else {
            tracing::debug!(topic = %topic, "Unsubscribed from device updates");
        }
    }
}

impl std::fmt::Debug for MqttSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttSession")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("client_id", &self.inner.client_id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

fn reply_topic(prefix: &str, client_id: &str) -> String {
    format!("{prefix}/rpc/reply/{client_id}")
}

/// Builder for creating an MQTT event session.
///
/// # Examples
///
/// ```no_run
/// use smartview_lib::protocol::MqttSession;
/// use std::time::Duration;
///
/// # async fn example() -> smartview_lib::Result<()> {
/// let session = MqttSession::builder()
///     .host("192.168.1.50")
///     .port(1883)
///     .credentials("user", "password")
///     .keep_alive(Duration::from_secs(60))
///     .connection_timeout(Duration::from_secs(5))
///     .topic_prefix("home/smartview")
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MqttSessionBuilder {
    config: MqttSessionConfig,
}

impl MqttSessionBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the connection timeout (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Sets the topic prefix (default: `smartview`).
    #[must_use]
    pub fn topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.topic_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Connects to the broker and subscribes to this session's reply topic.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host is not set
    /// - Connection fails
    /// - Connection times out
    pub async fn build(self) -> Result<MqttSession, ProtocolError> {
        if self.config.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }

        let counter = SESSION_CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let client_id = format!("smartview_{}_{}", std::process::id(), counter);

        let mut mqtt_options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);
        let session = MqttSession::from_parts(client, client_id, self.config.clone());

        let session_clone = session.clone();
        let (connack_tx, connack_rx) = oneshot::channel();

        tokio::spawn(async move {
            handle_session_events(event_loop, session_clone, Some(connack_tx)).await;
        });

        let timeout = self.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    "Connected to MQTT broker"
                );
            }
            Ok(Err(_)) => {
                return Err(ProtocolError::ConnectionFailed(
                    "MQTT event loop terminated unexpectedly".to_string(),
                ));
            }
            Err(_) => {
                return Err(ProtocolError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    timeout.as_secs()
                )));
            }
        }

        let reply_topic = session.reply_topic();
        session
            .inner
            .client
            .subscribe(&reply_topic, QoS::AtLeastOnce)
            .await
            .map_err(ProtocolError::Mqtt)?;
        tracing::debug!(topic = %reply_topic, "Subscribed to reply topic");

        Ok(session)
    }
}

/// Drives the MQTT event loop for a session.
async fn handle_session_events(
    mut event_loop: EventLoop,
    session: MqttSession,
    connack_tx: Option<oneshot::Sender<()>>,
) {
    use rumqttc::{Event, Packet};

    let mut connack_tx = connack_tx;

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                session.inner.connected.store(true, Ordering::Release);
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                tracing::debug!(
                    topic = %publish.topic,
                    bytes = publish.payload.len(),
                    "MQTT message received"
                );
                session.route_message(&publish.topic, &publish.payload).await;
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                session.inner.connected.store(false, Ordering::Release);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "MQTT session event loop error");
                session.inner.connected.store(false, Ordering::Release);
                break;
            }
        }
    }

    // Wake up anyone still waiting on this connection
    session.inner.subscribers.lock().clear();
    session.inner.pending.lock().clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_default_values() {
        let builder = MqttSessionBuilder::default();
        assert_eq!(builder.config.port, 1883);
        assert!(builder.config.host.is_empty());
        assert!(builder.config.credentials.is_none());
        assert_eq!(builder.config.keep_alive, Duration::from_secs(30));
        assert_eq!(builder.config.connection_timeout, Duration::from_secs(10));
        assert_eq!(builder.config.topic_prefix, "smartview");
    }

    #[test]
    fn builder_chain() {
        let builder = MqttSessionBuilder::default()
            .host("192.168.1.50")
            .port(8883)
            .credentials("admin", "secret")
            .keep_alive(Duration::from_secs(45))
            .connection_timeout(Duration::from_secs(15))
            .topic_prefix("home/smartview/");

        assert_eq!(builder.config.host, "192.168.1.50");
        assert_eq!(builder.config.port, 8883);
        assert_eq!(
            builder.config.credentials,
            Some(("admin".to_string(), "secret".to_string()))
        );
        assert_eq!(builder.config.keep_alive, Duration::from_secs(45));
        assert_eq!(builder.config.connection_timeout, Duration::from_secs(15));
        assert_eq!(builder.config.topic_prefix, "home/smartview");
    }

    #[tokio::test]
    async fn builder_missing_host_fails() {
        let err = MqttSessionBuilder::default().build().await.unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidAddress(_)));
    }

    #[test]
    fn reply_topic_format() {
        assert_eq!(
            reply_topic("smartview", "smartview_42_0"),
            "smartview/rpc/reply/smartview_42_0"
        );
    }

    /// A session whose client is never connected; requests stay queued in
    /// the returned event loop.
    fn offline_session() -> (MqttSession, EventLoop) {
        let options = MqttOptions::new("smartview_test", "127.0.0.1", 1883);
        let (client, event_loop) = AsyncClient::new(options, 10);
        let session = MqttSession::from_parts(
            client,
            "smartview_test".to_string(),
            MqttSessionConfig::default(),
        );
        (session, event_loop)
    }

    fn pending(session: &MqttSession) -> (Uuid, oneshot::Receiver<Option<DeviceState>>) {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        session.inner.pending.lock().insert(id, tx);
        (id, rx)
    }

    #[tokio::test]
    async fn push_reaches_every_subscriber() {
        let (session, _event_loop) = offline_session();
        let mut first = session.subscribe_updates().await.unwrap();
        let mut second = session.subscribe_updates().await.unwrap();

        session
            .route_message(&session.update_topic(), br#"{"deviceId":"ventana1","ventana":"abierto"}"#)
            .await;

        for subscription in [&mut first, &mut second] {
            let state = subscription.updates.try_recv().unwrap();
            assert_eq!(state.window.as_deref(), Some("abierto"));
        }
    }

    #[tokio::test]
    async fn undecodable_push_is_skipped() {
        let (session, _event_loop) = offline_session();
        let mut subscription = session.subscribe_updates().await.unwrap();

        session.route_message(&session.update_topic(), b"[1, 2]").await;
        session.route_message(&session.update_topic(), b"not json").await;

        assert!(subscription.updates.try_recv().is_err());
    }

    #[tokio::test]
    async fn released_subscriber_gets_no_pushes() {
        let (session, _event_loop) = offline_session();
        let mut kept = session.subscribe_updates().await.unwrap();
        let mut released = session.subscribe_updates().await.unwrap();

        session.release(released.id);
        session.route_message(&session.update_topic(), br#"{"modo":"manual"}"#).await;

        assert!(kept.updates.try_recv().is_ok());
        assert!(released.updates.try_recv().is_err());
        assert_eq!(session.subscription_count(), 1);

        session.release(kept.id);
        assert_eq!(session.subscription_count(), 0);
    }

    #[tokio::test]
    async fn reply_with_device_resolves_request() {
        let (session, _event_loop) = offline_session();
        let (id, rx) = pending(&session);

        session
            .route_message(
                &session.reply_topic(),
                format!(r#"{{"requestId":"{id}","device":{{"deviceId":"ventana1","seguro":"activo"}}}}"#)
                    .as_bytes(),
            )
            .await;

        let state = rx.await.unwrap().unwrap();
        assert_eq!(state.device_id.as_deref(), Some("ventana1"));
        assert_eq!(state.lock.as_deref(), Some("activo"));
        assert_eq!(session.pending_requests(), 0);
    }

    #[tokio::test]
    async fn reply_without_device_resolves_none() {
        let (session, _event_loop) = offline_session();

        for device in [r#","device":false"#, r#","device":null"#, "", r#","device":"ventana1""#] {
            let (id, mut rx) = pending(&session);
            session.complete_request(format!(r#"{{"requestId":"{id}"{device}}}"#).as_bytes());
            assert_eq!(rx.try_recv().unwrap(), None, "device field: {device:?}");
        }
    }

    #[tokio::test]
    async fn reply_device_with_wrong_types_is_lenient() {
        let (session, _event_loop) = offline_session();
        let (id, mut rx) = pending(&session);

        session.complete_request(
            format!(r#"{{"requestId":"{id}","device":{{"ventana":5,"modo":"automatico"}}}}"#)
                .as_bytes(),
        );

        let state = rx.try_recv().unwrap().unwrap();
        assert!(state.window.is_none());
        assert_eq!(state.mode.as_deref(), Some("automatico"));
    }

    #[tokio::test]
    async fn unknown_or_malformed_reply_is_dropped() {
        let (session, _event_loop) = offline_session();
        let (id, mut rx) = pending(&session);

        let other = Uuid::new_v4();
        session.complete_request(format!(r#"{{"requestId":"{other}","device":{{}}}}"#).as_bytes());
        session.complete_request(b"not json");
        session.complete_request(format!(r#"{{"device":{{}},"requestId":"{id}-x"}}"#).as_bytes());

        assert!(rx.try_recv().is_err());
        assert_eq!(session.pending_requests(), 1);
    }

    #[test]
    fn reply_envelope_decoding() {
        let id = Uuid::new_v4();

        let found: DeviceReply = serde_json::from_str(&format!(
            r#"{{"requestId":"{id}","device":{{"deviceId":"ventana1"}}}}"#
        ))
        .unwrap();
        assert_eq!(found.request_id, id);
        assert!(found.device.is_object());

        let missing: DeviceReply =
            serde_json::from_str(&format!(r#"{{"requestId":"{id}","device":false}}"#)).unwrap();
        assert!(!missing.device.is_object());

        let absent: DeviceReply =
            serde_json::from_str(&format!(r#"{{"requestId":"{id}"}}"#)).unwrap();
        assert!(absent.device.is_null());
    }
}
