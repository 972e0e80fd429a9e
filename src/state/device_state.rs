// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raw device record as produced by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ParseError;
use crate::types::Temperature;

/// Raw state record of the window controller.
///
/// Field names on the wire are the backend's (`ventana`, `modo`, `seguro`,
/// ...). Every field is optional and decoding is lenient: a value of an
/// unexpected JSON type is treated as absent, so a partially malformed push
/// still produces a record. The record is never edited in place; a new
/// arrival replaces it wholesale.
///
/// # Examples
///
/// ```
/// use smartview_lib::state::DeviceState;
///
/// let state = DeviceState::from_json(br#"{"deviceId":"ventana1","ventana":"abierto","temperatura":"21.5"}"#)
///     .unwrap();
/// assert_eq!(state.device_id.as_deref(), Some("ventana1"));
/// assert_eq!(state.window.as_deref(), Some("abierto"));
/// assert_eq!(state.temperature, Some(21.5));
///
/// // A non-object payload is rejected
/// assert!(DeviceState::from_json(b"[1, 2]").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Identifier of the device (`deviceId`).
    #[serde(
        rename = "deviceId",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_id: Option<String>,

    /// Backend record identifier (`_id`).
    #[serde(
        rename = "_id",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub record_id: Option<String>,

    /// Rain sensor code (`lluvia`).
    #[serde(
        rename = "lluvia",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub rain: Option<String>,

    /// Alarm code (`alarma`).
    #[serde(
        rename = "alarma",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub alarm: Option<String>,

    /// Day/night text (`diaNoche`).
    #[serde(
        rename = "diaNoche",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub day_night: Option<String>,

    /// Temperature in degrees Celsius (`temperatura`).
    #[serde(
        rename = "temperatura",
        default,
        deserialize_with = "lenient_temperature",
        skip_serializing_if = "Option::is_none"
    )]
    pub temperature: Option<f64>,

    /// Window position code (`ventana`).
    #[serde(
        rename = "ventana",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub window: Option<String>,

    /// Operating mode code (`modo`).
    #[serde(
        rename = "modo",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub mode: Option<String>,

    /// Lock code (`seguro`).
    #[serde(
        rename = "seguro",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub lock: Option<String>,

    /// Backend modification time (`updatedAt`).
    #[serde(
        rename = "updatedAt",
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DeviceState {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a record from a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] if the payload is not valid JSON and
    /// [`ParseError::UnexpectedFormat`] if it is not a JSON object.
    pub fn from_json(payload: &[u8]) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_slice(payload)?;
        Self::from_value(value)
    }

    /// Decodes a record from an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnexpectedFormat`] if the value is not an object.
    pub fn from_value(value: Value) -> Result<Self, ParseError> {
        if !value.is_object() {
            return Err(ParseError::UnexpectedFormat(format!(
                "expected a JSON object, got {}",
                json_type_name(&value)
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Returns `true` if this record names a device other than `device_id`.
    ///
    /// A record without an identifier matches any device.
    #[must_use]
    pub fn names_other_device(&self, device_id: &str) -> bool {
        self.device_id
            .as_deref()
            .map(str::trim)
            .is_some_and(|id| !id.is_empty() && id != device_id)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_temperature<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let reading = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().and_then(Temperature::new),
        Value::String(s) => Temperature::parse(&s),
        _ => None,
    };
    Ok(reading.map(|t| t.celsius()))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    })
}
