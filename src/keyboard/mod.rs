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

//! The keyboard session core: lifecycle state machine, auto-release timer,
//! chunked typing, and connection observation.

mod observer;
mod session;
mod transport;

pub use observer::{ConnectionObserver, StateSink};
pub use session::KeyboardSession;
pub use transport::KeyboardTransport;

use std::time::Duration;

use crate::hid::{KeyCode, MediaKey};

/// Logical keyboard identity, written into the transport during setup.
/// Immutable afterwards.
#[derive(Debug, Clone)]
pub struct KeyboardIdentity {
    /// Device name shown to peers.
    pub name: String,
    /// Manufacturer string for the Device Information service.
    pub manufacturer: String,
    /// Numeric pairing code displayed to the user during bonding.
    pub pairing_code: u32,
    /// Reported battery level, 0-100.
    pub battery_level: u8,
}

/// Session behavior knobs, fixed before setup.
#[derive(Debug, Clone)]
pub struct BehaviorConfig {
    /// Keep the peripheral discoverable after a link drop.
    pub reconnect: bool,
    /// Advertise as soon as the transport starts.
    pub advertise_on_start: bool,
    /// How long a timed press is held before auto-release.
    pub release_delay: Duration,
    /// Pause between text chunks.
    pub default_delay: Duration,
}

/// A pressable key, either on the standard keyboard page or the consumer
/// (media) page. Both kinds share the press/auto-release logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Raw HID usage code on the Keyboard/Keypad page.
    Code(u8),
    /// Media key on the Consumer page.
    Media(MediaKey),
}

impl From<KeyCode> for Key {
    fn from(key: KeyCode) -> Self {
        Key::Code(key.code())
    }
}

impl From<MediaKey> for Key {
    fn from(key: MediaKey) -> Self {
        Key::Media(key)
    }
}

impl From<u8> for Key {
    fn from(code: u8) -> Self {
        Key::Code(code)
    }
}
