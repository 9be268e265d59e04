//! Core `Config` struct, path helpers, and YAML persistence.

use crate::error::ConfigError;
use crate::types::{KeyboardMode, LogLevel};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Smallest fraction of the viewport the left panel may occupy.
pub const DIVIDER_RATIO_MIN: f32 = 0.2;
/// Largest fraction of the viewport the left panel may occupy.
pub const DIVIDER_RATIO_MAX: f32 = 0.8;

/// Client configuration loaded from `~/.config/panemux/config.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // ========================================================================
    // Connection
    // ========================================================================
    /// Base URL of the attach server (`ws://` or `wss://`)
    #[serde(default = "crate::defaults::server_url")]
    pub server_url: String,

    /// Path of the attach endpoint on the server
    #[serde(default = "crate::defaults::attach_path")]
    pub attach_path: String,

    /// First reconnect delay in milliseconds; doubles per failed attempt
    #[serde(default = "crate::defaults::reconnect_base_ms")]
    pub reconnect_base_ms: u64,

    /// Upper bound for the reconnect delay in milliseconds
    #[serde(default = "crate::defaults::reconnect_max_ms")]
    pub reconnect_max_ms: u64,

    // ========================================================================
    // Layout
    // ========================================================================
    /// Viewport width (px) below which a split layout collapses to the focused panel
    #[serde(default = "crate::defaults::narrow_viewport_px")]
    pub narrow_viewport_px: u32,

    /// Divider ratio used when no ratio has been persisted yet
    #[serde(default = "crate::defaults::divider_ratio")]
    pub default_divider_ratio: f32,

    /// Initial terminal columns before the first fit
    #[serde(default = "crate::defaults::cols")]
    pub default_cols: u16,

    /// Initial terminal rows before the first fit
    #[serde(default = "crate::defaults::rows")]
    pub default_rows: u16,

    // ========================================================================
    // UI preferences (initial values for the shared preferences record)
    // ========================================================================
    #[serde(default = "crate::defaults::bool_true")]
    pub toolbar_visible: bool,

    #[serde(default)]
    pub keyboard_mode: KeyboardMode,

    // ========================================================================
    // Debug Logging
    // ========================================================================
    /// Log level written to the debug log file
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: crate::defaults::server_url(),
            attach_path: crate::defaults::attach_path(),
            reconnect_base_ms: crate::defaults::reconnect_base_ms(),
            reconnect_max_ms: crate::defaults::reconnect_max_ms(),
            narrow_viewport_px: crate::defaults::narrow_viewport_px(),
            default_divider_ratio: crate::defaults::divider_ratio(),
            default_cols: crate::defaults::cols(),
            default_rows: crate::defaults::rows(),
            toolbar_visible: true,
            keyboard_mode: KeyboardMode::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating it with defaults if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        log::info!("Config path: {:?}", config_path);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            log::info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            if let Err(e) = config.save() {
                log::error!("Failed to save default config: {}", e);
                return Err(e);
            }
            Ok(config)
        }
    }

    /// Load and validate configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        log::info!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path).map_err(ConfigError::from)?;
        let config: Config = serde_yaml_ng::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml_ng::to_string(self)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconnect_base_ms == 0 {
            return Err(ConfigError::Validation(
                "reconnect_base_ms must be greater than zero".to_string(),
            ));
        }
        if self.reconnect_max_ms < self.reconnect_base_ms {
            return Err(ConfigError::Validation(format!(
                "reconnect_max_ms ({}) must not be below reconnect_base_ms ({})",
                self.reconnect_max_ms, self.reconnect_base_ms
            )));
        }
        if !(DIVIDER_RATIO_MIN..=DIVIDER_RATIO_MAX).contains(&self.default_divider_ratio) {
            return Err(ConfigError::Validation(format!(
                "default_divider_ratio {} is outside [{DIVIDER_RATIO_MIN}, {DIVIDER_RATIO_MAX}]",
                self.default_divider_ratio
            )));
        }
        if !self.server_url.starts_with("ws://") && !self.server_url.starts_with("wss://") {
            return Err(ConfigError::Validation(format!(
                "server_url must use ws:// or wss://, got {}",
                self.server_url
            )));
        }
        Ok(())
    }

    /// Get the configuration directory path (using XDG convention)
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join("panemux")
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join("panemux")
            } else {
                PathBuf::from(".")
            }
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Get the persisted layout state file path
    pub fn state_path() -> PathBuf {
        Self::config_dir().join("state.yaml")
    }
}
