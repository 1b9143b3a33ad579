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

//! Configuration file handling.
//!
//! Everything is fixed before setup; there is no runtime reconfiguration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::keyboard::{BehaviorConfig, KeyboardIdentity};

/// Airtype configuration, loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device name shown to peers.
    pub device_name: String,
    /// Manufacturer string for the Device Information service.
    pub manufacturer: String,
    /// Numeric pairing code shown to the user during bonding.
    pub pairing_code: u32,
    /// Reported battery level, 0-100.
    pub battery_level: u8,
    /// Keep the peripheral discoverable after a link drop.
    pub reconnect: bool,
    /// Advertise as soon as the transport starts.
    pub advertise_on_start: bool,
    /// How long a timed press is held before auto-release, in milliseconds.
    pub release_delay_ms: u64,
    /// Pause between text chunks, in milliseconds.
    pub default_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_name: "Airtype Keyboard".to_string(),
            manufacturer: "Airtype".to_string(),
            pairing_code: 123456,
            battery_level: 100,
            reconnect: true,
            advertise_on_start: true,
            release_delay_ms: 8,
            default_delay_ms: 8,
        }
    }
}

impl Config {
    /// Default config file location: `<config dir>/airtype/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("No config directory available")?;
        Ok(base.join("airtype").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from a specific path, falling back to defaults when the file
    /// does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// The keyboard identity written into the transport during setup.
    pub fn identity(&self) -> KeyboardIdentity {
        KeyboardIdentity {
            name: self.device_name.clone(),
            manufacturer: self.manufacturer.clone(),
            pairing_code: self.pairing_code,
            battery_level: self.battery_level.min(100),
        }
    }

    /// The session behavior knobs.
    pub fn behavior(&self) -> BehaviorConfig {
        BehaviorConfig {
            reconnect: self.reconnect,
            advertise_on_start: self.advertise_on_start,
            release_delay: Duration::from_millis(self.release_delay_ms),
            default_delay: Duration::from_millis(self.default_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = Config::load_from(&temp_dir.path().join("config.toml"))?;
        assert_eq!(config.device_name, "Airtype Keyboard");
        assert!(config.reconnect);
        Ok(())
    }

    #[test]
    fn test_partial_file_fills_in_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "device_name = \"Desk Remote\"\nreconnect = false\n")?;

        let config = Config::load_from(&path)?;
        assert_eq!(config.device_name, "Desk Remote");
        assert!(!config.reconnect);
        assert_eq!(config.release_delay_ms, 8);
        Ok(())
    }

    #[test]
    fn test_durations_come_from_millis() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "release_delay_ms = 250\ndefault_delay_ms = 15\n")?;

        let behavior = Config::load_from(&path)?.behavior();
        assert_eq!(behavior.release_delay, Duration::from_millis(250));
        assert_eq!(behavior.default_delay, Duration::from_millis(15));
        Ok(())
    }

    #[test]
    fn test_battery_level_is_clamped() {
        let config = Config {
            battery_level: 140,
            ..Config::default()
        };
        assert_eq!(config.identity().battery_level, 100);
    }

    #[test]
    fn test_invalid_toml_is_an_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "device_name = [not toml")?;
        assert!(Config::load_from(&path).is_err());
        Ok(())
    }
}
