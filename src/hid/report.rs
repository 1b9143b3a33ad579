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

//! Boot-protocol HID input reports.
//!
//! Keyboard report layout (8 bytes):
//! ```text
//! Byte 0: Modifier keys (bitfield)
//!         Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
//!         Bit 2 = Left Alt,   Bit 3 = Left GUI,
//!         Bit 4 = Right Ctrl, Bit 5 = Right Shift,
//!         Bit 6 = Right Alt,  Bit 7 = Right GUI
//! Byte 1: Reserved (0x00)
//! Byte 2-7: Up to 6 simultaneous key codes (HID usage codes)
//! ```
//!
//! Consumer (media) report layout: a single 16-bit usage, little-endian.

/// Keyboard report size in bytes.
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Consumer report size in bytes.
pub const CONSUMER_REPORT_SIZE: usize = 2;

/// Left Shift modifier bit.
pub const MOD_LEFT_SHIFT: u8 = 0x02;

/// Standard HID boot-protocol keyboard report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct KeyboardReport {
    /// Modifier key bitfield.
    pub modifier: u8,
    /// Reserved byte (always 0x00 per HID spec).
    pub reserved: u8,
    /// Up to 6 simultaneously pressed key codes.
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    /// Create an empty (all-keys-released) report.
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keycodes: [0; 6],
        }
    }

    /// Report with a single key pressed, optionally shifted.
    pub const fn single(keycode: u8, shift: bool) -> Self {
        Self {
            modifier: if shift { MOD_LEFT_SHIFT } else { 0 },
            reserved: 0,
            keycodes: [keycode, 0, 0, 0, 0, 0],
        }
    }

    /// Serialise for transmission over the input report characteristic.
    pub fn to_bytes(&self) -> [u8; KEYBOARD_REPORT_SIZE] {
        let mut buf = [0u8; KEYBOARD_REPORT_SIZE];
        buf[0] = self.modifier;
        buf[1] = self.reserved;
        buf[2..8].copy_from_slice(&self.keycodes);
        buf
    }

    /// Returns `true` if no keys are pressed (release event).
    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|&k| k == 0)
    }
}

/// Consumer Control (media key) report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct ConsumerReport {
    /// Consumer usage code (Usage Page 0x0C), 0 = released.
    pub usage: u16,
}

impl ConsumerReport {
    /// Report with no usage active (media key released).
    pub const fn empty() -> Self {
        Self { usage: 0 }
    }

    /// Report with the given usage active.
    pub const fn new(usage: u16) -> Self {
        Self { usage }
    }

    /// Serialise little-endian for the consumer input report.
    pub fn to_bytes(&self) -> [u8; CONSUMER_REPORT_SIZE] {
        self.usage.to_le_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_report_empty_is_all_zero() {
        let report = KeyboardReport::empty();
        assert!(report.is_empty());
        assert_eq!(report.to_bytes(), [0u8; 8]);
    }

    #[test]
    fn test_keyboard_report_single_key_layout() {
        let report = KeyboardReport::single(0x04, false); // 'a'
        assert!(!report.is_empty());
        assert_eq!(report.to_bytes(), [0x00, 0x00, 0x04, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_keyboard_report_shifted_key_sets_modifier() {
        let report = KeyboardReport::single(0x04, true); // 'A'
        assert_eq!(report.modifier, MOD_LEFT_SHIFT);
        assert_eq!(report.to_bytes(), [0x02, 0x00, 0x04, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_consumer_report_little_endian() {
        let report = ConsumerReport::new(0x00E9); // Volume Up
        assert_eq!(report.to_bytes(), [0xE9, 0x00]);
        assert_eq!(ConsumerReport::empty().to_bytes(), [0x00, 0x00]);
    }
}
