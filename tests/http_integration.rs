// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the HTTP command channel using wiremock.

use std::time::Duration;

use smartview_lib::command::{CommandDispatcher, DeviceCommand};
use smartview_lib::protocol::{CommandChannel, HttpCommandClient, HttpConfig};
use smartview_lib::types::DeviceId;
use smartview_lib::{Error, ProtocolError, ValueError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMMAND_PATH: &str = "/products/devices/ventana1/command";

fn ventana1() -> DeviceId {
    DeviceId::new("ventana1").unwrap()
}

// ============================================================================
// HttpCommandClient Tests
// ============================================================================

mod http_command_client {
    use super::*;

    #[tokio::test]
    async fn posts_command_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(COMMAND_PATH))
            .and(body_json(serde_json::json!({"command": "open-window"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Comando enviado"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpCommandClient::new(mock_server.uri()).unwrap();
        client
            .send_command(&ventana1(), DeviceCommand::OpenWindow)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(COMMAND_PATH))
            .and(header("Authorization", "Bearer session-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpConfig::new(mock_server.uri())
            .with_bearer_token("session-token")
            .into_client()
            .unwrap();

        client
            .send_command(&ventana1(), DeviceCommand::EnableLock)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn ignores_response_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(COMMAND_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
            .mount(&mock_server)
            .await;

        let client = HttpCommandClient::new(mock_server.uri()).unwrap();
        let result = client
            .send_command(&ventana1(), DeviceCommand::DisableAlarm)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication_failed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let client = HttpCommandClient::new(mock_server.uri()).unwrap();
        let err = client
            .send_command(&ventana1(), DeviceCommand::CloseWindow)
            .await
            .unwrap_err();

        assert!(matches!(err, ProtocolError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn server_error_maps_to_connection_failed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = HttpCommandClient::new(mock_server.uri()).unwrap();
        let err = client
            .send_command(&ventana1(), DeviceCommand::CloseWindow)
            .await
            .unwrap_err();

        match err {
            ProtocolError::ConnectionFailed(message) => {
                assert_eq!(message, "HTTP 500 - Internal Server Error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn not_found_maps_to_connection_failed() {
        let mock_server = MockServer::start().await;

        let client = HttpCommandClient::new(mock_server.uri()).unwrap();
        let err = client
            .send_command(&ventana1(), DeviceCommand::OpenWindow)
            .await
            .unwrap_err();

        assert!(matches!(err, ProtocolError::ConnectionFailed(ref m) if m.starts_with("HTTP 404")));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let client = HttpConfig::new(mock_server.uri())
            .with_timeout(Duration::from_millis(100))
            .into_client()
            .unwrap();
        let err = client
            .send_command(&ventana1(), DeviceCommand::OpenWindow)
            .await
            .unwrap_err();

        assert!(matches!(err, ProtocolError::Http(ref e) if e.is_timeout()));
    }
}

// ============================================================================
// CommandDispatcher over HTTP
// ============================================================================

mod dispatcher {
    use super::*;

    #[tokio::test]
    async fn send_named_posts_exact_name() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(COMMAND_PATH))
            .and(body_json(serde_json::json!({"command": "set-mode-automatic"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dispatcher = CommandDispatcher::new(HttpCommandClient::new(mock_server.uri()).unwrap());
        dispatcher
            .send_named(&ventana1(), "set-mode-automatic")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_name_sends_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let dispatcher = CommandDispatcher::new(HttpCommandClient::new(mock_server.uri()).unwrap());
        let err = dispatcher
            .send_named(&ventana1(), "reboot")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Value(ValueError::UnknownCommand(ref name)) if name == "reboot"
        ));
    }

    #[tokio::test]
    async fn failure_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dispatcher = CommandDispatcher::new(HttpCommandClient::new(mock_server.uri()).unwrap());
        let err = dispatcher
            .send_command(&ventana1(), DeviceCommand::EnableAlarm)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Protocol(ProtocolError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn every_command_reaches_backend() {
        let mock_server = MockServer::start().await;

        for command in DeviceCommand::ALL {
            Mock::given(method("POST"))
                .and(path(COMMAND_PATH))
                .and(body_json(serde_json::json!({"command": command.name()})))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let dispatcher = CommandDispatcher::new(HttpCommandClient::new(mock_server.uri()).unwrap());
        for command in DeviceCommand::ALL {
            dispatcher.send_command(&ventana1(), command).await.unwrap();
        }
    }
}
