// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP command channel.

use std::time::Duration;

use reqwest::Client;

use crate::command::DeviceCommand;
use crate::error::ProtocolError;
use crate::protocol::CommandChannel;
use crate::types::DeviceId;

// ============================================================================
// HttpConfig - Configuration for the backend REST API
// ============================================================================

/// Configuration for the backend's command endpoint.
///
/// # Examples
///
/// ```
/// use smartview_lib::protocol::HttpConfig;
/// use std::time::Duration;
///
/// // Scheme defaults to http
/// let config = HttpConfig::new("192.168.1.20:3000");
/// assert_eq!(config.base_url(), "http://192.168.1.20:3000");
///
/// // With all options
/// let config = HttpConfig::new("https://api.example.com/")
///     .with_bearer_token("eyJhbGciOi...")
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(config.base_url(), "https://api.example.com");
/// assert!(config.bearer_token().is_some());
/// ```
#[derive(Clone)]
pub struct HttpConfig {
    base_url: String,
    bearer_token: Option<String>,
    timeout: Duration,
}

impl HttpConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the backend at `base_url`.
    ///
    /// `http://` is assumed when no scheme is given; a trailing slash is
    /// removed.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim().trim_end_matches('/');
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url.to_string()
        } else {
            format!("http://{base_url}")
        };

        Self {
            base_url,
            bearer_token: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the token sent as `Authorization: Bearer <token>`.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the bearer token if set.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates an [`HttpCommandClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL has no host or the HTTP client cannot be
    /// created.
    pub fn into_client(self) -> Result<HttpCommandClient, ProtocolError> {
        let host = self
            .base_url
            .split_once("://")
            .map_or("", |(_, rest)| rest);
        if host.is_empty() {
            return Err(ProtocolError::InvalidAddress(format!(
                "missing host in {}",
                self.base_url
            )));
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(HttpCommandClient {
            base_url: self.base_url,
            client,
            bearer_token: self.bearer_token,
        })
    }
}

impl std::fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfig")
            .field("base_url", &self.base_url)
            .field("has_bearer_token", &self.bearer_token.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// HttpCommandClient
// ============================================================================

/// Sends commands to `POST <base>/products/devices/<deviceId>/command`.
///
/// # Examples
///
/// ```no_run
/// use smartview_lib::command::DeviceCommand;
/// use smartview_lib::protocol::{CommandChannel, HttpCommandClient};
/// use smartview_lib::types::DeviceId;
///
/// # async fn example() -> smartview_lib::Result<()> {
/// let client = HttpCommandClient::new("http://192.168.1.20:3000")?;
/// let device = DeviceId::new("ventana1")?;
/// client.send_command(&device, DeviceCommand::CloseWindow).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpCommandClient {
    base_url: String,
    client: Client,
    bearer_token: Option<String>,
}

impl HttpCommandClient {
    /// Creates a client with the default configuration for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProtocolError> {
        HttpConfig::new(base_url).into_client()
    }

    /// Returns the base URL of the backend.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the command URL for a device.
    fn command_url(&self, device_id: &DeviceId) -> String {
        format!(
            "{}/products/devices/{}/command",
            self.base_url,
            urlencoding::encode(device_id.as_str())
        )
    }
}

impl std::fmt::Debug for HttpCommandClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCommandClient")
            .field("base_url", &self.base_url)
            .field("has_bearer_token", &self.bearer_token.is_some())
            .finish_non_exhaustive()
    }
}

impl CommandChannel for HttpCommandClient {
    async fn send_command(
        &self,
        device_id: &DeviceId,
        command: DeviceCommand,
    ) -> Result<(), ProtocolError> {
        let url = self.command_url(device_id);

        tracing::debug!(url = %url, command = %command, "Sending HTTP command");

        let mut request = self.client.post(&url).json(&command.request_body());
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(ProtocolError::Http)?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProtocolError::AuthenticationFailed);
        }

        if !response.status().is_success() {
            return Err(ProtocolError::ConnectionFailed(format!(
                "HTTP {} - {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        tracing::debug!(status = %response.status(), "Command accepted by backend");

        Ok(())
    }
}
