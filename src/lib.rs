// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `SmartView` Lib - Keep a remote window controller in sync and actuate it.
//!
//! The device (an automated window with rain, temperature and light sensors,
//! a security lock and an alarm) reports its state through a backend. This
//! library:
//!
//! - **Observes**: opens an event session, subscribes to state pushes and
//!   issues a one-time initial fetch, reconciling both so observers never see
//!   an older state replace a newer one
//! - **Translates**: maps the device's terse codes (`"abierto"`,
//!   `"ACTIVADA"`, ...) into typed, display-ready values
//! - **Actuates**: sends named commands over a separate HTTP channel that is
//!   independent of the event stream
//!
//! # Components
//!
//! - [`state::StateMapper`] - Pure translation of raw records
//! - [`state::StateStore`] - The single observable snapshot and its status
//! - [`connection::ConnectionManager`] - Event session lifecycle
//! - [`command::CommandDispatcher`] - Fire-and-forget command sending
//! - [`Dashboard`] - All of the above wired for one device
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use smartview_lib::{Dashboard, DeviceId};
//! use smartview_lib::protocol::{HttpConfig, MqttSession};
//! use smartview_lib::subscription::Subscribable;
//!
//! #[tokio::main]
//! async fn main() -> smartview_lib::Result<()> {
//!     let session = MqttSession::builder()
//!         .host("192.168.1.50")
//!         .build()
//!         .await?;
//!     let commands = HttpConfig::new("http://192.168.1.20:3000").into_client()?;
//!
//!     let mut dashboard = Dashboard::new(DeviceId::new("ventana1")?, Arc::new(session), commands);
//!     dashboard.on_status_changed(|status| println!("status: {status}"));
//!     dashboard.open().await?;
//!
//!     let mut snapshots = dashboard.store().watch();
//!     while snapshots.changed().await.is_ok() {
//!         let snapshot = snapshots.borrow_and_update().clone();
//!         if let Some(view) = snapshot.view {
//!             println!(
//!                 "window {} | mode {} | {} °C | {}",
//!                 view.window(),
//!                 view.mode(),
//!                 view.temperature_label(),
//!                 view.day_night()
//!             );
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `http` (default): [`protocol::HttpCommandClient`] over `reqwest`
//! - `mqtt` (default): [`protocol::MqttSession`] over `rumqttc`
//!
//! Both channels are traits ([`protocol::EventSession`],
//! [`protocol::CommandChannel`]), so other transports can be plugged in.

pub mod command;
pub mod connection;
mod dashboard;
pub mod error;
pub mod protocol;
pub mod state;
pub mod subscription;
pub mod types;

pub use command::{CommandDispatcher, DeviceCommand};
pub use connection::ConnectionManager;
pub use dashboard::Dashboard;
pub use error::{Error, ParseError, ProtocolError, Result, ValueError};
pub use protocol::{CommandChannel, EventSession};
#[cfg(feature = "http")]
pub use protocol::{HttpCommandClient, HttpConfig};
#[cfg(feature = "mqtt")]
pub use protocol::{MqttSession, MqttSessionBuilder};
pub use state::{DeviceState, SemanticDeviceView, Snapshot, StateMapper, StateStore, SyncStatus};
pub use subscription::{CallbackRegistry, Subscribable, SubscriptionId};
pub use types::{
    AlarmState, DayPhase, DeviceId, LockState, OperatingMode, RainState, Temperature,
    TemperatureBand, WindowPosition,
};
