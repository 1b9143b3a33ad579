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

//! The capability set the session drives on its BLE HID peripheral.

use anyhow::Result;
use async_trait::async_trait;

use super::KeyboardIdentity;

/// A BLE HID keyboard peripheral as seen by the session.
///
/// Stack bring-up, GATT registration and advertising are the host's
/// responsibility; the session only configures the logical keyboard on an
/// already-running transport and forwards key events to it.
#[async_trait]
pub trait KeyboardTransport: Send + Sync {
    /// Configure name, manufacturer, battery level and pairing code.
    async fn set_identity(&self, identity: &KeyboardIdentity) -> Result<()>;

    /// Release every held key on both the keyboard and consumer pages.
    async fn release_all(&self) -> Result<()>;

    /// Whether a peer is currently connected.
    async fn is_connected(&self) -> bool;

    /// Press a key on the Keyboard/Keypad usage page.
    async fn press_key(&self, code: u8) -> Result<()>;

    /// Press a media key on the Consumer usage page.
    async fn press_media(&self, usage: u16) -> Result<()>;

    /// Type a run of characters, press-and-release per character.
    async fn send_text_chunk(&self, text: &str) -> Result<()>;

    /// Control whether the peripheral resumes advertising after a link drop.
    async fn set_advertise_on_disconnect(&self, enabled: bool) -> Result<()>;
}
