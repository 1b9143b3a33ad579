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

//! BLE HID-over-GATT keyboard peripheral backed by BlueZ.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bluer::adv::{Advertisement, AdvertisementHandle};
use bluer::gatt::local::{
    Application, ApplicationHandle, Characteristic, CharacteristicNotify,
    CharacteristicNotifyMethod, CharacteristicRead, CharacteristicWrite,
    CharacteristicWriteMethod, Descriptor, DescriptorRead, Service,
};
use bluer::Adapter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::ble_constants::*;
use crate::hid::{char_to_keycode, ConsumerReport, KeyboardReport};
use crate::keyboard::{KeyboardIdentity, KeyboardTransport};

/// How often the link monitor polls BlueZ for the connection state.
const MONITOR_PERIOD: Duration = Duration::from_secs(2);

/// Queue depth for input report notifications.
const REPORT_QUEUE_DEPTH: usize = 32;

type ReportSlot = Arc<Mutex<Option<mpsc::Sender<Vec<u8>>>>>;

struct ServerState {
    device_name: String,
    manufacturer: String,
    battery_level: u8,
    adv_handle: Option<AdvertisementHandle>,
    app_handle: Option<ApplicationHandle>,
}

/// A BLE HID keyboard served over BlueZ.
///
/// Exposes the HID service (report map, protocol mode, control point,
/// keyboard and consumer input reports), the Battery service and the Device
/// Information service, and manages LE advertising including the
/// advertise-on-disconnect behavior.
pub struct BleHidKeyboard {
    adapter: Adapter,
    advertise_on_start: bool,
    /// Re-advertise after a link drop. Cleared via the transport interface
    /// when the host is shutting down.
    auto_advertise: Arc<AtomicBool>,
    state: Arc<RwLock<ServerState>>,
    keyboard_tx: ReportSlot,
    consumer_tx: ReportSlot,
}

impl BleHidKeyboard {
    /// Open the default adapter and power it on.
    pub async fn new(advertise_on_start: bool) -> Result<Self> {
        info!("Initializing BLE HID keyboard...");

        let session = bluer::Session::new().await?;
        let adapter = session.default_adapter().await?;
        info!("Using Bluetooth adapter: {}", adapter.name());

        if !adapter.is_powered().await? {
            info!("Powering on Bluetooth adapter...");
            adapter.set_powered(true).await?;
        }

        Ok(Self {
            adapter,
            advertise_on_start,
            auto_advertise: Arc::new(AtomicBool::new(true)),
            state: Arc::new(RwLock::new(ServerState {
                device_name: String::new(),
                manufacturer: String::new(),
                battery_level: 100,
                adv_handle: None,
                app_handle: None,
            })),
            keyboard_tx: Arc::new(Mutex::new(None)),
            consumer_tx: Arc::new(Mutex::new(None)),
        })
    }

    /// Register the GATT application and begin advertising (when configured
    /// to advertise on start). Spawns the link monitor.
    pub async fn start(&self) -> Result<()> {
        self.register_gatt_application().await?;

        if self.advertise_on_start {
            self.start_advertising().await?;
        }

        self.start_link_monitor();

        info!("BLE HID keyboard started");
        Ok(())
    }

    /// Whether any BlueZ device currently holds a connection to us.
    async fn any_device_connected(adapter: &Adapter) -> bool {
        match adapter.device_addresses().await {
            Ok(addresses) => {
                for addr in addresses {
                    if let Ok(device) = adapter.device(addr) {
                        if device.is_connected().await.unwrap_or(false) {
                            return true;
                        }
                    }
                }
                false
            }
            Err(e) => {
                error!("Failed to query device addresses: {}", e);
                false
            }
        }
    }

    /// Periodically reconcile advertising with the link state: re-advertise
    /// after a drop while auto-advertise is on, stop being discoverable once
    /// it has been turned off.
    fn start_link_monitor(&self) {
        let adapter = self.adapter.clone();
        let state = self.state.clone();
        let auto_advertise = self.auto_advertise.clone();

        tokio::spawn(async move {
            debug!("Link monitor started");
            loop {
                tokio::time::sleep(MONITOR_PERIOD).await;

                let connected = Self::any_device_connected(&adapter).await;
                if connected {
                    continue;
                }

                let mut state = state.write().await;
                if auto_advertise.load(Ordering::SeqCst) {
                    if state.adv_handle.is_none() {
                        info!("Link down, resuming advertising");
                        match Self::advertise(&adapter, &state.device_name).await {
                            Ok(handle) => state.adv_handle = Some(handle),
                            Err(e) => error!("Failed to resume advertising: {}", e),
                        }
                    }
                } else if state.adv_handle.take().is_some() {
                    info!("Link down and advertise-on-disconnect off, going dark");
                }
            }
        });
    }

    async fn advertise(adapter: &Adapter, name: &str) -> Result<AdvertisementHandle> {
        let adv = Advertisement {
            service_uuids: vec![HID_SERVICE_UUID].into_iter().collect(),
            appearance: Some(APPEARANCE_KEYBOARD),
            discoverable: Some(true),
            local_name: Some(name.to_string()),
            ..Default::default()
        };
        let handle = adapter.advertise(adv).await?;
        info!("BLE advertising started as '{}'", name);
        Ok(handle)
    }

    async fn start_advertising(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let handle = Self::advertise(&self.adapter, &state.device_name).await?;
        state.adv_handle = Some(handle);
        Ok(())
    }

    /// Read-only characteristic serving a fixed value.
    fn const_read_characteristic(uuid: uuid::Uuid, value: Vec<u8>) -> Characteristic {
        Characteristic {
            uuid,
            read: Some(CharacteristicRead {
                read: true,
                fun: Box::new(move |_req| {
                    let value = value.clone();
                    Box::pin(async move { Ok(value) })
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Report Reference descriptor ([report ID, report type]).
    fn report_reference(report_id: u8, report_type: u8) -> Descriptor {
        Descriptor {
            uuid: REPORT_REFERENCE_UUID,
            read: Some(DescriptorRead {
                read: true,
                fun: Box::new(move |_req| {
                    Box::pin(async move { Ok(vec![report_id, report_type]) })
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// An input report characteristic: notify-only, fed from a queue slot.
    ///
    /// The notify session going away is how we learn the subscriber is gone;
    /// the queue sender is replaced on every (re)subscription.
    fn input_report_characteristic(report_id: u8, slot: ReportSlot) -> Characteristic {
        let empty_len = if report_id == KEYBOARD_REPORT_ID { 8 } else { 2 };

        Characteristic {
            uuid: HID_REPORT_UUID,
            read: Some(CharacteristicRead {
                read: true,
                fun: Box::new(move |_req| {
                    Box::pin(async move { Ok(vec![0u8; empty_len]) })
                }),
                ..Default::default()
            }),
            notify: Some(CharacteristicNotify {
                notify: true,
                method: CharacteristicNotifyMethod::Fun(Box::new(move |mut notifier| {
                    let slot = slot.clone();
                    Box::pin(async move {
                        debug!("Input report {} subscribed", report_id);
                        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(REPORT_QUEUE_DEPTH);
                        *slot.lock().await = Some(tx);

                        while let Some(data) = rx.recv().await {
                            if let Err(e) = notifier.notify(data).await {
                                warn!("Input report {} notify failed: {}", report_id, e);
                                break;
                            }
                        }

                        *slot.lock().await = None;
                        debug!("Input report {} notify session ended", report_id);
                    })
                })),
                ..Default::default()
            }),
            descriptors: vec![Self::report_reference(report_id, REPORT_TYPE_INPUT)],
            ..Default::default()
        }
    }

    async fn register_gatt_application(&self) -> Result<()> {
        let state = self.state.read().await;
        let battery_level = state.battery_level;
        let manufacturer = state.manufacturer.clone();
        drop(state);

        // HID control point: suspend/resume hints from the host.
        let control_point_char = Characteristic {
            uuid: HID_CONTROL_POINT_UUID,
            write: Some(CharacteristicWrite {
                write_without_response: true,
                method: CharacteristicWriteMethod::Fun(Box::new(move |data, _req| {
                    Box::pin(async move {
                        match data.first() {
                            Some(0x00) => debug!("HID host requested suspend"),
                            Some(0x01) => debug!("HID host left suspend"),
                            other => debug!("HID control point write: {:?}", other),
                        }
                        Ok(())
                    })
                })),
                ..Default::default()
            }),
            ..Default::default()
        };

        // Protocol mode: we only do report protocol; log a boot-mode request
        // but stay in report mode.
        let protocol_mode_char = Characteristic {
            uuid: HID_PROTOCOL_MODE_UUID,
            read: Some(CharacteristicRead {
                read: true,
                fun: Box::new(move |_req| {
                    Box::pin(async move { Ok(vec![PROTOCOL_MODE_REPORT]) })
                }),
                ..Default::default()
            }),
            write: Some(CharacteristicWrite {
                write_without_response: true,
                method: CharacteristicWriteMethod::Fun(Box::new(move |data, _req| {
                    Box::pin(async move {
                        if data.first() != Some(&PROTOCOL_MODE_REPORT) {
                            warn!("Peer requested boot protocol, staying in report mode");
                        }
                        Ok(())
                    })
                })),
                ..Default::default()
            }),
            ..Default::default()
        };

        // LED output report from the host (caps lock and friends).
        let output_report_char = Characteristic {
            uuid: HID_REPORT_UUID,
            write: Some(CharacteristicWrite {
                write: true,
                write_without_response: true,
                method: CharacteristicWriteMethod::Fun(Box::new(move |data, _req| {
                    Box::pin(async move {
                        debug!("LED output report: {}", hex::encode(&data));
                        Ok(())
                    })
                })),
                ..Default::default()
            }),
            descriptors: vec![Self::report_reference(
                KEYBOARD_REPORT_ID,
                REPORT_TYPE_OUTPUT,
            )],
            ..Default::default()
        };

        let hid_service = Service {
            uuid: HID_SERVICE_UUID,
            primary: true,
            characteristics: vec![
                Self::const_read_characteristic(HID_INFORMATION_UUID, HID_INFORMATION.to_vec()),
                Self::const_read_characteristic(HID_REPORT_MAP_UUID, REPORT_MAP.to_vec()),
                control_point_char,
                protocol_mode_char,
                Self::input_report_characteristic(KEYBOARD_REPORT_ID, self.keyboard_tx.clone()),
                Self::input_report_characteristic(CONSUMER_REPORT_ID, self.consumer_tx.clone()),
                output_report_char,
            ],
            ..Default::default()
        };

        let battery_service = Service {
            uuid: BATTERY_SERVICE_UUID,
            primary: true,
            characteristics: vec![Self::const_read_characteristic(
                BATTERY_LEVEL_UUID,
                vec![battery_level],
            )],
            ..Default::default()
        };

        let device_info_service = Service {
            uuid: DEVICE_INFO_SERVICE_UUID,
            primary: true,
            characteristics: vec![
                Self::const_read_characteristic(
                    MANUFACTURER_NAME_UUID,
                    manufacturer.into_bytes(),
                ),
                Self::const_read_characteristic(
                    MODEL_NUMBER_UUID,
                    b"airtype".to_vec(),
                ),
            ],
            ..Default::default()
        };

        let app = Application {
            services: vec![hid_service, battery_service, device_info_service],
            ..Default::default()
        };

        let handle = self.adapter.serve_gatt_application(app).await?;
        self.state.write().await.app_handle = Some(handle);

        info!("HID GATT application registered");
        Ok(())
    }

    /// Queue an input report for notification. Reports sent while nobody is
    /// subscribed are dropped, and so are reports to a stalled peer whose
    /// queue has filled up; a press is only meaningful to a live peer.
    ///
    /// The sender is cloned out of the slot so the lock is never held
    /// across an await: the notify loop needs that lock to clear the slot
    /// when the session ends.
    async fn queue_report(slot: &ReportSlot, bytes: Vec<u8>) -> Result<()> {
        debug!("Input report: {}", hex::encode(&bytes));
        let tx = match slot.lock().await.as_ref() {
            Some(tx) => tx.clone(),
            None => {
                debug!("No input report subscriber, dropping report");
                return Ok(());
            }
        };
        match tx.try_send(bytes) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Input report queue full, dropping report");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(anyhow!("input report queue closed"))
            }
        }
    }

    async fn send_keyboard_report(&self, report: KeyboardReport) -> Result<()> {
        Self::queue_report(&self.keyboard_tx, report.to_bytes().to_vec())
            .await
            .context("keyboard report")
    }

    async fn send_consumer_report(&self, report: ConsumerReport) -> Result<()> {
        Self::queue_report(&self.consumer_tx, report.to_bytes().to_vec())
            .await
            .context("consumer report")
    }
}

#[async_trait]
impl KeyboardTransport for BleHidKeyboard {
    async fn set_identity(&self, identity: &KeyboardIdentity) -> Result<()> {
        self.adapter
            .set_alias(identity.name.clone())
            .await
            .context("setting adapter alias")?;

        let mut state = self.state.write().await;
        state.device_name = identity.name.clone();
        state.manufacturer = identity.manufacturer.clone();
        state.battery_level = identity.battery_level.min(100);

        info!(
            "Keyboard identity set: '{}' by '{}', battery {}%, pairing code {:06}",
            identity.name, identity.manufacturer, state.battery_level, identity.pairing_code
        );
        Ok(())
    }

    async fn release_all(&self) -> Result<()> {
        self.send_keyboard_report(KeyboardReport::empty()).await?;
        self.send_consumer_report(ConsumerReport::empty()).await
    }

    async fn is_connected(&self) -> bool {
        Self::any_device_connected(&self.adapter).await
    }

    async fn press_key(&self, code: u8) -> Result<()> {
        self.send_keyboard_report(KeyboardReport::single(code, false))
            .await
    }

    async fn press_media(&self, usage: u16) -> Result<()> {
        self.send_consumer_report(ConsumerReport::new(usage)).await
    }

    async fn send_text_chunk(&self, text: &str) -> Result<()> {
        for ch in text.chars() {
            let Some((code, shift)) = char_to_keycode(ch) else {
                warn!("No keycode for {:?}, skipping", ch);
                continue;
            };
            self.send_keyboard_report(KeyboardReport::single(code, shift))
                .await?;
            self.send_keyboard_report(KeyboardReport::empty()).await?;
        }
        Ok(())
    }

    async fn set_advertise_on_disconnect(&self, enabled: bool) -> Result<()> {
        debug!("advertise_on_disconnect({})", enabled);
        self.auto_advertise.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_with_capacity(capacity: usize) -> (ReportSlot, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Arc::new(Mutex::new(Some(tx))), rx)
    }

    #[tokio::test]
    async fn test_reports_without_a_subscriber_are_dropped() {
        let slot: ReportSlot = Arc::new(Mutex::new(None));
        assert!(BleHidKeyboard::queue_report(&slot, vec![0x01])
            .await
            .is_ok());
    }

    // A stalled peer fills the queue; further reports must be dropped
    // without parking, and the slot lock must stay free so the notify loop
    // can still clear the slot when the link drops.
    #[tokio::test]
    async fn test_full_queue_drops_the_report_and_leaves_the_slot_free() {
        let (slot, mut rx) = slot_with_capacity(2);

        for byte in 0..3u8 {
            BleHidKeyboard::queue_report(&slot, vec![byte])
                .await
                .unwrap();
        }

        assert!(slot.try_lock().is_ok());
        assert_eq!(rx.recv().await, Some(vec![0]));
        assert_eq!(rx.recv().await, Some(vec![1]));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_queue_is_an_error() {
        let (slot, rx) = slot_with_capacity(1);
        drop(rx);
        assert!(BleHidKeyboard::queue_report(&slot, vec![0x01])
            .await
            .is_err());
    }
}
