//! livespec configuration management.
//!
//! Handles the configuration file at:
//! - Linux: ~/.config/livespec/config.toml
//! - macOS: ~/Library/Application Support/livespec/config.toml
//! - Windows: %APPDATA%\livespec\config.toml
//!
//! A missing file yields defaults; every section and key is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::LiveSpecError;
use crate::fs_utils;

pub const DEFAULT_WS_PORT: u16 = 3899;
pub const DEFAULT_HTTP_PORT: u16 = 3900;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// livespec configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LiveSpecConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub watcher: WatcherSettings,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Transport and content server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_ws_port() -> u16 {
    DEFAULT_WS_PORT
}

fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            ws_port: DEFAULT_WS_PORT,
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

/// Directory watcher settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatcherSettings {
    /// Stability window for coalescing write bursts
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// How often the event loop checks for settled events
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
    /// Directory names never reported
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_poll_ms() -> u64 {
    50
}

fn default_ignored_dirs() -> Vec<String> {
    ["node_modules", ".git", ".vscode", "dist", "build", "out", "target"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            poll_ms: default_poll_ms(),
            ignored_dirs: default_ignored_dirs(),
        }
    }
}

impl WatcherSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

/// Bridge client settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    /// Packaged location of `client.js`; development candidates are tried when unset
    #[serde(default)]
    pub script_path: Option<PathBuf>,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// 0 means unlimited
    #[serde(default)]
    pub max_reconnect_attempts: u32,
    /// Host origins allowed to send commands into guest pages
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            script_path: None,
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_attempts: 0,
            allowed_origins: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LiveSpecConfig {
    /// Default configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("livespec").join("config.toml"))
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self, LiveSpecError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, LiveSpecError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| LiveSpecError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| LiveSpecError::ConfigError {
            message: format!("Failed to parse config: {}", e),
        })
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<(), LiveSpecError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| LiveSpecError::IoError {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| LiveSpecError::ConfigError {
            message: format!("Failed to serialize config: {}", e),
        })?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content).map_err(|e| LiveSpecError::IoError {
            path: temp_path.clone(),
            message: e.to_string(),
        })?;

        fs_utils::atomic_rename(&temp_path, path).map_err(|e| LiveSpecError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get a configuration value by key path (e.g., "server.ws_port")
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "ws_port"] => Some(self.server.ws_port.to_string()),
            ["server", "http_port"] => Some(self.server.http_port.to_string()),
            ["watcher", "debounce_ms"] => Some(self.watcher.debounce_ms.to_string()),
            ["watcher", "poll_ms"] => Some(self.watcher.poll_ms.to_string()),
            ["bridge", "script_path"] => self
                .bridge
                .script_path
                .as_ref()
                .map(|p| p.display().to_string()),
            ["bridge", "reconnect_delay_ms"] => Some(self.bridge.reconnect_delay_ms.to_string()),
            ["bridge", "max_reconnect_attempts"] => {
                Some(self.bridge.max_reconnect_attempts.to_string())
            }
            ["bridge", "allowed_origins"] => Some(self.bridge.allowed_origins.join(", ")),
            ["logging", "level"] => Some(self.logging.level.clone()),
            _ => None,
        }
    }

    /// Set a configuration value by key path
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), LiveSpecError> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["server", "host"] => self.server.host = value.to_string(),
            ["server", "ws_port"] => self.server.ws_port = parse_number(key, value)?,
            ["server", "http_port"] => self.server.http_port = parse_number(key, value)?,
            ["watcher", "debounce_ms"] => self.watcher.debounce_ms = parse_number(key, value)?,
            ["watcher", "poll_ms"] => self.watcher.poll_ms = parse_number(key, value)?,
            ["bridge", "script_path"] => {
                self.bridge.script_path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            ["bridge", "reconnect_delay_ms"] => {
                self.bridge.reconnect_delay_ms = parse_number(key, value)?
            }
            ["bridge", "max_reconnect_attempts"] => {
                self.bridge.max_reconnect_attempts = parse_number(key, value)?
            }
            ["bridge", "allowed_origins"] => {
                self.bridge.allowed_origins = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            ["logging", "level"] => {
                if !LOG_LEVELS.contains(&value) {
                    return Err(LiveSpecError::ConfigError {
                        message: format!(
                            "Invalid log level: {}. Must be one of: {}",
                            value,
                            LOG_LEVELS.join(", ")
                        ),
                    });
                }
                self.logging.level = value.to_string();
            }
            _ => {
                return Err(LiveSpecError::ConfigError {
                    message: format!("Unknown configuration key: {}", key),
                });
            }
        }
        Ok(())
    }

    /// Reset configuration to defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Display configuration as TOML
    pub fn display(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|e| format!("# failed to render: {}", e))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, LiveSpecError> {
    value.parse().map_err(|_| LiveSpecError::ConfigError {
        message: format!("Invalid value for {}: {}", key, value),
    })
}
