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

//! Assigned numbers for the HID over GATT profile.

use uuid::Uuid;

/// Expand a 16-bit assigned number into the Bluetooth base UUID.
const fn ble_uuid(short: u32) -> Uuid {
    Uuid::from_u128(((short as u128) << 96) | 0x0000_1000_8000_00805f9b34fb)
}

pub const HID_SERVICE_UUID: Uuid = ble_uuid(0x1812);
pub const BATTERY_SERVICE_UUID: Uuid = ble_uuid(0x180F);
pub const DEVICE_INFO_SERVICE_UUID: Uuid = ble_uuid(0x180A);

pub const HID_INFORMATION_UUID: Uuid = ble_uuid(0x2A4A);
pub const HID_REPORT_MAP_UUID: Uuid = ble_uuid(0x2A4B);
pub const HID_CONTROL_POINT_UUID: Uuid = ble_uuid(0x2A4C);
pub const HID_REPORT_UUID: Uuid = ble_uuid(0x2A4D);
pub const HID_PROTOCOL_MODE_UUID: Uuid = ble_uuid(0x2A4E);

pub const BATTERY_LEVEL_UUID: Uuid = ble_uuid(0x2A19);
pub const MANUFACTURER_NAME_UUID: Uuid = ble_uuid(0x2A29);
pub const MODEL_NUMBER_UUID: Uuid = ble_uuid(0x2A24);

/// Report Reference descriptor.
pub const REPORT_REFERENCE_UUID: Uuid = ble_uuid(0x2908);

/// GAP appearance: keyboard.
pub const APPEARANCE_KEYBOARD: u16 = 0x03C1;

/// Report IDs, matching the report map below.
pub const KEYBOARD_REPORT_ID: u8 = 0x01;
pub const CONSUMER_REPORT_ID: u8 = 0x02;

/// Report Reference descriptor type: input report.
pub const REPORT_TYPE_INPUT: u8 = 0x01;
/// Report Reference descriptor type: output report.
pub const REPORT_TYPE_OUTPUT: u8 = 0x02;

/// HID Information: bcdHID 1.11, no country code, normally connectable +
/// remote wake.
pub const HID_INFORMATION: [u8; 4] = [0x11, 0x01, 0x00, 0x03];

/// Protocol mode: report protocol.
pub const PROTOCOL_MODE_REPORT: u8 = 0x01;

/// HID report map: a boot-compatible keyboard (report ID 1, with LED
/// output) and a consumer control (report ID 2, single 16-bit usage).
pub const REPORT_MAP: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x01, //   Report ID (1)
    //   Modifier keys (8 bits)
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (Left Control)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //   Reserved byte
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)
    //   LED output (5 bits + 3 padding)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x05, //   Usage Maximum (Kana)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant)
    //   Key codes (6 bytes)
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0xFF, //   Usage Maximum (255)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
    //
    0x05, 0x0C, // Usage Page (Consumer)
    0x09, 0x01, // Usage (Consumer Control)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x02, //   Report ID (2)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x03, // Logical Maximum (0x3FF)
    0x19, 0x00, //   Usage Minimum (0)
    0x2A, 0xFF, 0x03, // Usage Maximum (0x3FF)
    0x75, 0x10, //   Report Size (16)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_uuids_expand_to_the_bluetooth_base() {
        assert_eq!(
            HID_SERVICE_UUID.to_string(),
            "00001812-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            REPORT_REFERENCE_UUID.to_string(),
            "00002908-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_report_map_collections_are_balanced() {
        let opens = REPORT_MAP.windows(2).filter(|w| w == &[0xA1, 0x01]).count();
        let closes = REPORT_MAP.iter().filter(|&&b| b == 0xC0).count();
        assert_eq!(opens, closes);
    }
}
