// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use smartview_lib::command::DeviceCommand;
use smartview_lib::protocol::{
    CommandChannel, EventSession, UpdateSubscription, UpdateSubscriptionId,
};
use smartview_lib::state::{DeviceState, Snapshot, StateStore};
use smartview_lib::types::DeviceId;
use smartview_lib::ProtocolError;
use tokio::sync::{mpsc, oneshot};

type Reply = Result<Option<DeviceState>, ProtocolError>;

/// Event session driven by the test: pushes and fetch replies are injected
/// explicitly, in whatever order the scenario needs.
#[derive(Default)]
pub struct ScriptedSession {
    subscribers: Mutex<HashMap<UpdateSubscriptionId, mpsc::Sender<DeviceState>>>,
    next_subscription: AtomicU64,
    pending: Mutex<VecDeque<(DeviceId, oneshot::Sender<Reply>)>>,
    fail_subscribe: AtomicBool,
    subscribes: AtomicUsize,
    requests: AtomicUsize,
    releases: AtomicUsize,
}

impl ScriptedSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes the next subscriptions fail.
    pub fn fail_subscriptions(&self) {
        self.fail_subscribe.store(true, Ordering::SeqCst);
    }

    /// Delivers a push to every subscriber; returns how many received it.
    pub async fn push_all(&self, state: DeviceState) -> usize {
        let senders: Vec<_> = self.subscribers.lock().values().cloned().collect();
        let mut delivered = 0;
        for tx in senders {
            if tx.send(state.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Delivers a push; returns `false` if nobody is subscribed.
    pub async fn push(&self, state: DeviceState) -> bool {
        self.push_all(state).await > 0
    }

    /// Waits until a fetch is outstanding and returns its device id.
    pub async fn next_request(&self) -> DeviceId {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Some((id, _)) = self.pending.lock().front() {
                    return id.clone();
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("no fetch was issued")
    }

    /// Answers the oldest outstanding fetch; returns `false` if the requester
    /// is gone.
    pub async fn reply(&self, reply: Reply) -> bool {
        self.next_request().await;
        let (_, tx) = self
            .pending
            .lock()
            .pop_front()
            .expect("pending request disappeared");
        tx.send(reply).is_ok()
    }

    pub fn subscribes(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn is_subscribed(&self) -> bool {
        !self.subscribers.lock().is_empty()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl EventSession for ScriptedSession {
    async fn subscribe_updates(&self) -> Result<UpdateSubscription, ProtocolError> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(ProtocolError::ConnectionFailed("broker unavailable".to_string()));
        }
        let id = UpdateSubscriptionId::new(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = mpsc::channel(16);
        self.subscribers.lock().insert(id, tx);
        Ok(UpdateSubscription { id, updates: rx })
    }

    async fn request_device(&self, device_id: &DeviceId) -> Reply {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().push_back((device_id.clone(), tx));
        rx.await
            .map_err(|_| ProtocolError::ChannelClosed("script dropped the request".to_string()))?
    }

    fn release(&self, id: UpdateSubscriptionId) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().remove(&id);
    }
}

/// Command channel recording what was sent.
#[derive(Default, Clone)]
pub struct RecordingChannel {
    pub sent: Arc<Mutex<Vec<(String, DeviceCommand)>>>,
    pub fail: Arc<AtomicBool>,
}

impl RecordingChannel {
    pub fn sent(&self) -> Vec<(String, DeviceCommand)> {
        self.sent.lock().clone()
    }
}

impl CommandChannel for RecordingChannel {
    async fn send_command(
        &self,
        device_id: &DeviceId,
        command: DeviceCommand,
    ) -> Result<(), ProtocolError> {
        self.sent.lock().push((device_id.to_string(), command));
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProtocolError::ConnectionFailed("HTTP 503 - Service Unavailable".to_string()));
        }
        Ok(())
    }
}

/// Parses a raw device record.
pub fn raw(json: &str) -> DeviceState {
    DeviceState::from_json(json.as_bytes()).expect("valid test payload")
}

/// Waits until the store publishes a snapshot matching `predicate`.
pub async fn wait_for<F>(store: &StateStore, predicate: F) -> Snapshot
where
    F: Fn(&Snapshot) -> bool,
{
    let mut rx = store.watch();
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if predicate(&snapshot) {
                return snapshot;
            }
            rx.changed().await.expect("store dropped");
        }
    })
    .await
    .expect("timed out waiting for snapshot")
}

/// Lets spawned tasks run to completion of their current step.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
