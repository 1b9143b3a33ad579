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

//! Periodic poll-and-publish of the connection state.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::KeyboardSession;

/// Consumer of connection-state updates (telemetry, a status line, ...).
pub trait StateSink: Send + Sync {
    fn publish(&self, connected: bool);
}

/// Polls the session's connection state and republishes it to a sink.
///
/// Stateless between invocations; whatever the sink retains is its own
/// business.
pub struct ConnectionObserver {
    session: KeyboardSession,
    sink: Option<Arc<dyn StateSink>>,
}

impl ConnectionObserver {
    /// Observer without a sink; `update()` is a no-op until one exists.
    pub fn new(session: KeyboardSession) -> Self {
        Self {
            session,
            sink: None,
        }
    }

    /// Observer publishing to the given sink.
    pub fn with_sink(session: KeyboardSession, sink: Arc<dyn StateSink>) -> Self {
        Self {
            session,
            sink: Some(sink),
        }
    }

    /// One poll-and-publish round.
    pub async fn update(&self) {
        if let Some(sink) = &self.sink {
            sink.publish(self.session.is_connected().await);
        }
    }

    /// Drive `update()` on a fixed period, forever.
    pub async fn run(&self, period: Duration) {
        debug!("Connection observer polling every {:?}", period);
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            self.update().await;
        }
    }
}
