// SPDX-License-Identifier: MPL-2.0

//! Demo program: Watch a window controller and send one command.
//!
//! Connects to the MQTT broker the backend publishes device updates on,
//! prints every snapshot, and optionally sends a command through the
//! backend's REST API once the state has loaded.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example dashboard -- <mqtt-host> <backend-url> <device-id> [command] [token]
//! ```
//!
//! # Example
//!
//! ```bash
//! RUST_LOG=smartview_lib=debug \
//!     cargo run --example dashboard -- 192.168.1.50 http://192.168.1.20:3000 ventana1 toggle-mode
//! ```
//!
//! `command` is any command name (`open-window`, `enable-alarm`, ...) or one of
//! the toggles `toggle-mode`, `toggle-lock`, `toggle-alarm`.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use smartview_lib::protocol::{HttpConfig, MqttSession};
use smartview_lib::subscription::Subscribable;
use smartview_lib::{Dashboard, DeviceCommand, DeviceId, SyncStatus};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartview_lib=info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 4 || args.len() > 6 {
        eprintln!(
            "Usage: {} <mqtt-host> <backend-url> <device-id> [command] [token]",
            args[0]
        );
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --example dashboard -- 192.168.1.50 http://192.168.1.20:3000 ventana1");
        std::process::exit(1);
    }

    let mqtt_host = &args[1];
    let backend_url = &args[2];
    let device_id = DeviceId::new(args[3].as_str())?;
    let command = args.get(4).cloned();
    let token = args.get(5).cloned();

    println!("Connecting to MQTT broker {mqtt_host}...");
    let session = MqttSession::builder().host(mqtt_host).build().await?;

    let mut http = HttpConfig::new(backend_url.as_str());
    if let Some(token) = token {
        http = http.with_bearer_token(token);
    }

    let mut dashboard = Dashboard::new(device_id, Arc::new(session), http.into_client()?)
        .with_request_timeout(Duration::from_secs(10));

    dashboard.on_status_changed(|status| match status {
        SyncStatus::Loading => println!("Loading..."),
        SyncStatus::Ready => println!("Device ready"),
        SyncStatus::Error(message) => println!("Error: {message}"),
    });
    dashboard.on_snapshot_changed(|snapshot| {
        if let Some(view) = &snapshot.view {
            println!(
                "window: {:<6} mode: {:<9} lock: {:<10} alarm: {:<8} rain: {:<3} temp: {} °C ({}) day/night: {} [{}]",
                view.window(),
                view.mode(),
                view.lock(),
                view.alarm(),
                view.rain(),
                view.temperature_label(),
                view.temperature_band().map_or("--", |band| band.label()),
                view.day_night(),
                view.day_phase(),
            );
        }
    });

    dashboard.open().await?;

    let mut snapshots = dashboard.store().watch();
    let loaded = tokio::time::timeout(
        Duration::from_secs(15),
        snapshots.wait_for(|snapshot| !snapshot.status.is_loading()),
    )
    .await
    .is_ok_and(|result| result.is_ok());
    if !loaded {
        println!("No state received, giving up");
        dashboard.close();
        return Ok(());
    }

    if let Some(command) = command {
        let sent = match command.as_str() {
            "toggle-mode" => dashboard.toggle_mode().await?,
            "toggle-lock" => dashboard.toggle_lock().await?,
            "toggle-alarm" => dashboard.toggle_alarm().await?,
            name => {
                let command = name.parse::<DeviceCommand>()?;
                dashboard.send(command).await?;
                command
            }
        };
        println!("Sent {sent}");
    }

    println!("Watching for updates, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    dashboard.close();
    println!("Done!");
    Ok(())
}
