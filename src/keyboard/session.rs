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

//! The keyboard session state machine.
//!
//! Every operation is a guarded pass-through to the transport plus
//! release-timer bookkeeping. Invalid-state conditions degrade to a logged
//! warning and a no-op; transport failures are logged and swallowed here
//! since there is no retry or recovery contract.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{BehaviorConfig, Key, KeyboardIdentity, KeyboardTransport};

/// Text longer than this is split into runs of this many characters, with a
/// pause between runs, to respect the transport's per-report throughput.
const TEXT_CHUNK_LEN: usize = 5;

struct Shared {
    /// Set once by `setup()`; never cleared, not even by `stop()`.
    ready: bool,
    /// At most one deferred auto-release is in flight. Arming a new one
    /// aborts whatever was here before.
    pending_release: Option<JoinHandle<()>>,
}

/// A BLE HID keyboard session.
///
/// Cheap to clone; clones share lifecycle state and the release-timer slot.
#[derive(Clone)]
pub struct KeyboardSession {
    transport: Arc<dyn KeyboardTransport>,
    identity: KeyboardIdentity,
    behavior: BehaviorConfig,
    shared: Arc<Mutex<Shared>>,
}

impl KeyboardSession {
    /// Create a session over an already-running transport.
    pub fn new(
        transport: Arc<dyn KeyboardTransport>,
        identity: KeyboardIdentity,
        behavior: BehaviorConfig,
    ) -> Self {
        Self {
            transport,
            identity,
            behavior,
            shared: Arc::new(Mutex::new(Shared {
                ready: false,
                pending_release: None,
            })),
        }
    }

    /// Configure the logical keyboard and become ready.
    ///
    /// Idempotent: a second call while ready logs a warning and does
    /// nothing. The BLE stack itself is the host's to bring up; this only
    /// writes the identity and starts from a clean all-released state.
    pub async fn setup(&self) {
        let mut shared = self.shared.lock().await;
        if shared.ready {
            warn!("Keyboard session already set up");
            return;
        }
        info!("Setting up keyboard session for '{}'", self.identity.name);
        if let Err(e) = self.transport.set_identity(&self.identity).await {
            error!("Failed to write keyboard identity: {}", e);
        }
        // Start clean: no key may be considered held from a previous run.
        if let Err(e) = self.transport.release_all().await {
            error!("Failed to release keys during setup: {}", e);
        }
        shared.ready = true;
    }

    /// Shut the keyboard down for the caller's teardown.
    ///
    /// Leaves the session ready (guards keep passing afterwards); only stops
    /// re-advertising when configured to reconnect, and releases every key
    /// as a final safety action.
    pub async fn stop(&self) {
        if !self.guard_ready("stop").await {
            return;
        }
        debug!("stop()");
        self.cancel_release_timer().await;
        if self.behavior.reconnect {
            debug!("Disabling advertise-on-disconnect");
            if let Err(e) = self.transport.set_advertise_on_disconnect(false).await {
                error!("Failed to disable advertising: {}", e);
            }
        }
        if let Err(e) = self.transport.release_all().await {
            error!("Failed to release keys during stop: {}", e);
        }
    }

    /// Whether a peer is connected. Safe at any lifecycle state; queries the
    /// transport directly every time.
    pub async fn is_connected(&self) -> bool {
        if !self.transport.is_connected().await {
            info!("Disconnected");
            return false;
        }
        true
    }

    /// Press a key (standard or media).
    ///
    /// With `with_timer`, the single-slot auto-release timer is rearmed so
    /// the press becomes a tap after `release_delay`; without it, the key is
    /// held until an explicit `release()`. Presses while disconnected are
    /// dropped silently: queuing for a future peer is out of scope.
    pub async fn press(&self, key: impl Into<Key>, with_timer: bool) {
        let key = key.into();
        if !self.guard_ready("press").await {
            return;
        }
        if !self.is_connected().await {
            return;
        }
        if with_timer {
            self.rearm_release_timer().await;
        }
        let result = match key {
            Key::Code(code) => self.transport.press_key(code).await,
            Key::Media(media) => self.transport.press_media(media.usage()).await,
        };
        if let Err(e) = result {
            error!("Failed to press {:?}: {}", key, e);
        }
    }

    /// Type a string.
    ///
    /// Messages of fewer than 5 characters go out as a single chunk with no
    /// pause. Longer messages are split into 5-character runs sent strictly
    /// in order, each followed by a `default_delay` pause (the last one
    /// included). The pause is a cooperative sleep, never a thread block.
    pub async fn type_text(&self, message: &str) {
        if !self.guard_ready("type_text").await {
            return;
        }
        if !self.is_connected().await {
            return;
        }
        let chars: Vec<char> = message.chars().collect();
        if chars.len() < TEXT_CHUNK_LEN {
            if let Err(e) = self.transport.send_text_chunk(message).await {
                error!("Failed to send text: {}", e);
            }
            return;
        }
        for run in chars.chunks(TEXT_CHUNK_LEN) {
            let chunk: String = run.iter().collect();
            if let Err(e) = self.transport.send_text_chunk(&chunk).await {
                error!("Failed to send text chunk: {}", e);
                break;
            }
            tokio::time::sleep(self.behavior.default_delay).await;
        }
    }

    /// Release all held keys, superseding any pending auto-release.
    pub async fn release(&self) {
        if !self.guard_ready("release").await {
            return;
        }
        if !self.is_connected().await {
            return;
        }
        self.cancel_release_timer().await;
        if let Err(e) = self.transport.release_all().await {
            error!("Failed to release keys: {}", e);
        }
    }

    async fn guard_ready(&self, op: &str) -> bool {
        let ready = self.shared.lock().await.ready;
        if !ready {
            warn!("{} called without setup, not doing anything", op);
        }
        ready
    }

    /// Arm the auto-release timer, cancelling any previous one. Last writer
    /// wins: there is never more than one release in flight.
    async fn rearm_release_timer(&self) {
        let session = self.clone();
        let delay = self.behavior.release_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            session.auto_release().await;
        });
        let mut shared = self.shared.lock().await;
        if let Some(previous) = shared.pending_release.replace(handle) {
            previous.abort();
        }
    }

    /// Timer-expiry release path. Clears the slot by taking it instead of
    /// aborting: the abort would cancel this very task before the release
    /// reaches the transport.
    async fn auto_release(&self) {
        self.shared.lock().await.pending_release.take();
        if !self.is_connected().await {
            return;
        }
        debug!("Auto-release after {:?}", self.behavior.release_delay);
        if let Err(e) = self.transport.release_all().await {
            error!("Failed to auto-release keys: {}", e);
        }
    }

    async fn cancel_release_timer(&self) {
        if let Some(handle) = self.shared.lock().await.pending_release.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::MediaKey;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        SetIdentity(String),
        ReleaseAll,
        PressKey(u8),
        PressMedia(u16),
        Chunk(String),
        AdvertiseOnDisconnect(bool),
    }

    #[derive(Default)]
    struct MockTransport {
        connected: AtomicBool,
        calls: StdMutex<Vec<Call>>,
    }

    impl MockTransport {
        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn take_calls(&self) -> Vec<Call> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }

        fn set_connected(&self, connected: bool) {
            self.connected.store(connected, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl KeyboardTransport for MockTransport {
        async fn set_identity(&self, identity: &KeyboardIdentity) -> Result<()> {
            self.record(Call::SetIdentity(identity.name.clone()));
            Ok(())
        }

        async fn release_all(&self) -> Result<()> {
            self.record(Call::ReleaseAll);
            Ok(())
        }

        async fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        async fn press_key(&self, code: u8) -> Result<()> {
            self.record(Call::PressKey(code));
            Ok(())
        }

        async fn press_media(&self, usage: u16) -> Result<()> {
            self.record(Call::PressMedia(usage));
            Ok(())
        }

        async fn send_text_chunk(&self, text: &str) -> Result<()> {
            self.record(Call::Chunk(text.to_string()));
            Ok(())
        }

        async fn set_advertise_on_disconnect(&self, enabled: bool) -> Result<()> {
            self.record(Call::AdvertiseOnDisconnect(enabled));
            Ok(())
        }
    }

    const RELEASE_DELAY: Duration = Duration::from_millis(100);
    const CHUNK_DELAY: Duration = Duration::from_millis(8);

    fn session_with(reconnect: bool) -> (KeyboardSession, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::default());
        let identity = KeyboardIdentity {
            name: "Test Keyboard".to_string(),
            manufacturer: "Test".to_string(),
            pairing_code: 123456,
            battery_level: 100,
        };
        let behavior = BehaviorConfig {
            reconnect,
            advertise_on_start: true,
            release_delay: RELEASE_DELAY,
            default_delay: CHUNK_DELAY,
        };
        let session = KeyboardSession::new(transport.clone(), identity, behavior);
        (session, transport)
    }

    async fn ready_session(connected: bool) -> (KeyboardSession, Arc<MockTransport>) {
        let (session, transport) = session_with(true);
        session.setup().await;
        transport.set_connected(connected);
        transport.take_calls();
        (session, transport)
    }

    fn release_count(transport: &MockTransport) -> usize {
        transport
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == Call::ReleaseAll)
            .count()
    }

    #[tokio::test]
    async fn test_operations_before_setup_touch_nothing() {
        let (session, transport) = session_with(true);
        transport.set_connected(true);

        session.press(0x04u8, true).await;
        session.press(MediaKey::VolumeUp, false).await;
        session.type_text("hello world").await;
        session.release().await;
        session.stop().await;

        assert!(transport.take_calls().is_empty());
    }

    #[tokio::test]
    async fn test_second_setup_is_a_noop() {
        let (session, transport) = session_with(true);

        session.setup().await;
        session.setup().await;

        assert_eq!(
            transport.take_calls(),
            vec![
                Call::SetIdentity("Test Keyboard".to_string()),
                Call::ReleaseAll
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_text_is_one_chunk_with_no_pause() {
        let (session, transport) = ready_session(true).await;

        let before = Instant::now();
        session.type_text("hey").await;

        assert_eq!(before.elapsed(), Duration::ZERO);
        assert_eq!(transport.take_calls(), vec![Call::Chunk("hey".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_text_goes_out_in_ordered_runs_of_five() {
        let (session, transport) = ready_session(true).await;

        let before = Instant::now();
        session.type_text("hello friend").await; // 12 chars

        // A pause follows every chunk, the last one included.
        assert_eq!(before.elapsed(), CHUNK_DELAY * 3);
        assert_eq!(
            transport.take_calls(),
            vec![
                Call::Chunk("hello".to_string()),
                Call::Chunk(" frie".to_string()),
                Call::Chunk("nd".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exactly_five_chars_takes_the_chunked_path() {
        let (session, transport) = ready_session(true).await;

        let before = Instant::now();
        session.type_text("fiver").await;

        assert_eq!(before.elapsed(), CHUNK_DELAY);
        assert_eq!(
            transport.take_calls(),
            vec![Call::Chunk("fiver".to_string())]
        );
    }

    #[tokio::test]
    async fn test_typing_while_disconnected_is_silent() {
        let (session, transport) = ready_session(false).await;

        session.type_text("hello").await;
        session.press(0x04u8, true).await;
        session.release().await;

        assert!(transport.take_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_press_auto_releases_exactly_once() {
        let (session, transport) = ready_session(true).await;

        session.press(0x04u8, true).await;
        assert_eq!(transport.calls.lock().unwrap().len(), 1); // the press

        tokio::time::sleep(RELEASE_DELAY * 3).await;
        assert_eq!(release_count(&transport), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_untimed_press_never_auto_releases() {
        let (session, transport) = ready_session(true).await;

        session.press(0x04u8, false).await;
        tokio::time::sleep(RELEASE_DELAY * 3).await;

        assert_eq!(release_count(&transport), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearming_cancels_the_first_timer() {
        let (session, transport) = ready_session(true).await;

        session.press(0x04u8, true).await;
        tokio::time::sleep(RELEASE_DELAY / 2).await;
        session.press(0x05u8, true).await;

        // Past the first press's deadline: its timer must not have fired.
        tokio::time::sleep(RELEASE_DELAY * 7 / 10).await;
        assert_eq!(release_count(&transport), 0);

        // Past the second press's deadline: exactly one release.
        tokio::time::sleep(RELEASE_DELAY).await;
        assert_eq!(release_count(&transport), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_release_supersedes_the_timer() {
        let (session, transport) = ready_session(true).await;

        session.press(0x04u8, true).await;
        session.release().await;
        assert_eq!(release_count(&transport), 1);

        tokio::time::sleep(RELEASE_DELAY * 3).await;
        assert_eq!(release_count(&transport), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_media_press_shares_the_timer_logic() {
        let (session, transport) = ready_session(true).await;

        session.press(MediaKey::PlayPause, true).await;
        tokio::time::sleep(RELEASE_DELAY * 2).await;

        let calls = transport.take_calls();
        assert_eq!(
            calls,
            vec![Call::PressMedia(0x00CD), Call::ReleaseAll]
        );
    }

    #[tokio::test]
    async fn test_stop_disables_advertising_only_when_reconnect_is_set() {
        let (session, transport) = session_with(true);
        session.setup().await;
        transport.set_connected(true);
        transport.take_calls();

        session.stop().await;
        assert_eq!(
            transport.take_calls(),
            vec![Call::AdvertiseOnDisconnect(false), Call::ReleaseAll]
        );

        let (session, transport) = session_with(false);
        session.setup().await;
        transport.set_connected(true);
        transport.take_calls();

        session.stop().await;
        assert_eq!(transport.take_calls(), vec![Call::ReleaseAll]);
    }

    #[tokio::test]
    async fn test_stop_releases_even_while_disconnected() {
        let (session, transport) = ready_session(false).await;

        session.stop().await;

        assert_eq!(release_count(&transport), 1);
    }

    #[tokio::test]
    async fn test_is_connected_reflects_the_transport_live() {
        let (session, transport) = ready_session(false).await;

        assert!(!session.is_connected().await);
        transport.set_connected(true);
        assert!(session.is_connected().await);
        transport.set_connected(false);
        assert!(!session.is_connected().await);
    }

    // stop() intentionally leaves the session ready: there is no reset
    // contract, and operations afterwards keep reaching the transport.
    #[tokio::test]
    async fn test_operations_after_stop_still_pass_the_guards() {
        let (session, transport) = ready_session(true).await;

        session.stop().await;
        transport.take_calls();

        session.press(0x04u8, false).await;
        assert_eq!(transport.take_calls(), vec![Call::PressKey(0x04)]);
    }
}
