// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Window controller commands.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `open-window` | Opens the window |
//! | `close-window` | Closes the window |
//! | `set-mode-manual` | Switches to manual mode |
//! | `set-mode-automatic` | Switches to automatic mode |
//! | `enable-lock` / `disable-lock` | Engages or releases the security lock |
//! | `enable-alarm` / `disable-alarm` | Arms or disarms the alarm |
//!
//! Commands are sent by a [`CommandDispatcher`]; their outcome is observed
//! through the next device push, never through the command response.
//!
//! # Examples
//!
//! ```
//! use smartview_lib::command::DeviceCommand;
//! use smartview_lib::types::LockState;
//!
//! let cmd = DeviceCommand::toggle_lock(LockState::Engaged);
//! assert_eq!(cmd.name(), "disable-lock");
//! ```

mod device_command;
mod dispatcher;

pub use device_command::{CommandBody, DeviceCommand};
pub use dispatcher::CommandDispatcher;
