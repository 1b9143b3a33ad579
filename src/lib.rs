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

//! Airtype emulates a Bluetooth LE HID keyboard: press and release keys,
//! tap media keys, and type text on a connected peer.
//!
//! The [`keyboard`] module is the core: a session state machine driving a
//! narrow [`keyboard::KeyboardTransport`] interface, with a timer-based
//! auto-release and chunked text transmission. The [`bluetooth`] module
//! provides the BlueZ HID-over-GATT implementation of that interface.

pub mod bluetooth;
pub mod config;
pub mod hid;
pub mod keyboard;
