// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fire-and-forget command dispatch.

use crate::error::Result;
use crate::protocol::CommandChannel;
use crate::types::DeviceId;

use super::DeviceCommand;

/// Sends actuation commands over a [`CommandChannel`].
///
/// The dispatcher neither reads nor writes device state: a command's effect
/// becomes visible only through a later push. Each call issues exactly one
/// request; nothing is retried.
///
/// # Examples
///
/// ```no_run
/// use smartview_lib::command::{CommandDispatcher, DeviceCommand};
/// use smartview_lib::protocol::HttpConfig;
/// use smartview_lib::types::DeviceId;
///
/// # async fn example() -> smartview_lib::Result<()> {
/// let client = HttpConfig::new("http://192.168.1.20:3000")
///     .with_bearer_token("token")
///     .into_client()?;
/// let dispatcher = CommandDispatcher::new(client);
///
/// let device = DeviceId::new("ventana1")?;
/// dispatcher.send_command(&device, DeviceCommand::OpenWindow).await?;
/// dispatcher.send_named(&device, "enable-alarm").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CommandDispatcher<C> {
    channel: C,
}

impl<C: CommandChannel> CommandDispatcher<C> {
    /// Creates a dispatcher sending through `channel`.
    #[must_use]
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    /// Returns the underlying channel.
    #[must_use]
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Sends `command` to `device_id`.
    ///
    /// Returns once the backend accepted the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`](crate::Error::Protocol) if the request
    /// could not be sent or was answered with a non-success status.
    pub async fn send_command(&self, device_id: &DeviceId, command: DeviceCommand) -> Result<()> {
        tracing::debug!(device = %device_id, command = %command, "Sending command");

        match self.channel.send_command(device_id, command).await {
            Ok(()) => {
                tracing::debug!(device = %device_id, command = %command, "Command accepted");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    device = %device_id,
                    command = %command,
                    error = %e,
                    "Command failed"
                );
                Err(e.into())
            }
        }
    }

    /// Parses `name` and sends the resulting command.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnknownCommand`](crate::ValueError::UnknownCommand)
    /// if `name` is not in the command vocabulary, without sending anything.
    pub async fn send_named(&self, device_id: &DeviceId, name: &str) -> Result<()> {
        let command = name.parse::<DeviceCommand>()?;
        self.send_command(device_id, command).await
    }
}
