// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is stored in `config.toml` under the user's config directory
//! (`~/.config/courier/` on Linux) and includes:
//! - `hub_url`: WebSocket endpoint of the messaging hub
//! - `api_url`: base URL of the request/response API
//! - reconnect and typing timer settings

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CONFIG_DIR_NAME: &str = "courier";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Client configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// WebSocket URL of the messaging hub.
    #[serde(default = "default_hub_url")]
    pub hub_url: String,
    /// Base URL of the request/response API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Delays between reconnect attempts in milliseconds. The last entry is
    /// held once the sequence is exhausted.
    #[serde(default = "default_reconnect_delays_ms")]
    pub reconnect_delays_ms: Vec<u64>,
    /// Inactivity timeout after which a peer's typing state lapses.
    #[serde(default = "default_typing_timeout_ms")]
    pub typing_timeout_ms: u64,
    /// Quiet period after the last local keystroke before a stop is sent.
    #[serde(default = "default_typing_quiet_ms")]
    pub typing_quiet_ms: u64,
    /// Messages fetched per conversation snapshot.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Depth of the session command queue.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

fn default_hub_url() -> String {
    "ws://localhost:5000/hubs/chat".to_string()
}

fn default_api_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_reconnect_delays_ms() -> Vec<u64> {
    vec![0, 2_000, 10_000, 30_000]
}

fn default_typing_timeout_ms() -> u64 {
    3_000
}

fn default_typing_quiet_ms() -> u64 {
    500
}

fn default_page_size() -> u32 {
    50
}

fn default_command_buffer() -> usize {
    64
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hub_url: default_hub_url(),
            api_url: default_api_url(),
            reconnect_delays_ms: default_reconnect_delays_ms(),
            typing_timeout_ms: default_typing_timeout_ms(),
            typing_quiet_ms: default_typing_quiet_ms(),
            page_size: default_page_size(),
            command_buffer: default_command_buffer(),
        }
    }
}

impl Config {
    /// Returns the default config file location, if a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads and validates configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Loads the file at `path` if it exists, otherwise returns defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Parses and validates configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.reconnect_delays_ms.is_empty() {
            return Err(Error::Config(
                "reconnect_delays_ms must contain at least one delay".to_string(),
            ));
        }
        if self.typing_timeout_ms == 0 || self.typing_quiet_ms == 0 {
            return Err(Error::Config(
                "typing timers must be greater than zero".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be greater than zero".to_string()));
        }
        if self.command_buffer == 0 {
            return Err(Error::Config(
                "command_buffer must be greater than zero".to_string(),
            ));
        }
        if !(self.hub_url.starts_with("ws://") || self.hub_url.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "invalid hub_url '{}': must be ws:// or wss://",
                self.hub_url
            )));
        }
        Ok(())
    }

    pub fn reconnect_delays(&self) -> Vec<Duration> {
        self.reconnect_delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }

    pub fn typing_timeout(&self) -> Duration {
        Duration::from_millis(self.typing_timeout_ms)
    }

    pub fn typing_quiet(&self) -> Duration {
        Duration::from_millis(self.typing_quiet_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
