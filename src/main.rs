// Copyright 2026 Airtype Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Airtype daemon: a BLE HID keyboard driven from stdin commands.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use airtype::bluetooth::BleHidKeyboard;
use airtype::config::Config;
use airtype::hid::{KeyCode, MediaKey};
use airtype::keyboard::{ConnectionObserver, KeyboardSession, StateSink};

/// How often the connection observer polls and republishes.
const OBSERVER_PERIOD: Duration = Duration::from_secs(5);

/// Sink logging connection-state samples.
struct LogSink;

impl StateSink for LogSink {
    fn publish(&self, connected: bool) {
        debug!("Connection state: {}", connected);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;
    info!("Starting airtype as '{}'", config.device_name);

    let transport = Arc::new(BleHidKeyboard::new(config.advertise_on_start).await?);
    let session = KeyboardSession::new(transport.clone(), config.identity(), config.behavior());

    // Identity first, GATT registration and advertising after, so the
    // services and the advertisement carry the configured name.
    session.setup().await;
    transport.start().await?;

    let observer = ConnectionObserver::with_sink(session.clone(), Arc::new(LogSink));
    tokio::spawn(async move { observer.run(OBSERVER_PERIOD).await });

    print_help();
    run_command_loop(&session).await?;

    session.stop().await;
    info!("Bye");
    Ok(())
}

fn print_help() {
    println!("commands:");
    println!("  type <text>     type a string on the peer");
    println!("  key <name>      tap a named key (enter, esc, up, ...)");
    println!("  hold <name>     press a named key until 'release'");
    println!("  media <name>    tap a media key (playpause, volup, ...)");
    println!("  release         release all held keys");
    println!("  status          show connection state");
    println!("  stop            stop the keyboard");
    println!("  quit            stop and exit");
}

async fn run_command_loop(session: &KeyboardSession) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

        match command {
            "" => {}
            "type" => session.type_text(rest).await,
            "key" => match KeyCode::from_name(rest) {
                Some(key) => session.press(key, true).await,
                None => warn!("Unknown key: {}", rest),
            },
            "hold" => match KeyCode::from_name(rest) {
                Some(key) => session.press(key, false).await,
                None => warn!("Unknown key: {}", rest),
            },
            "media" => match MediaKey::from_name(rest) {
                Some(key) => session.press(key, true).await,
                None => warn!("Unknown media key: {}", rest),
            },
            "release" => session.release().await,
            "status" => println!("connected: {}", session.is_connected().await),
            "stop" => session.stop().await,
            "quit" | "exit" => break,
            other => warn!("Unknown command: {}", other),
        }
    }

    Ok(())
}
