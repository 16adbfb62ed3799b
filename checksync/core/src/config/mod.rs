//! TOML Configuration File Support
//!
//! Centralized configuration for the device core, loaded from
//! `~/.config/checksync/device.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables (`CHECKSYNC_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [status]
//! transition_ms = 200
//! hide_delay_ms = 400
//!
//! [progress]
//! sweep_ms = 1000
//! easing = "ease_in_out"
//!
//! [list]
//! max_items = 256
//! title_max = 63
//!
//! [layout]
//! width = 144
//! height = 16
//!
//! [channel]
//! inbox_size = 1024
//! outbox_size = 64
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::list::ListLimits;
use crate::presentation::{EasingFunction, PresentationConfig};

/// Default inbound buffer size in bytes
pub const DEFAULT_INBOX_SIZE: usize = 1024;

/// Default outbound buffer size in bytes
pub const DEFAULT_OUTBOX_SIZE: usize = 64;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Status line section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusToml {
    /// Slide duration in milliseconds
    pub transition_ms: Option<u64>,

    /// Grace period before a cleared status slides out, in milliseconds
    pub hide_delay_ms: Option<u64>,
}

/// Progress sweep section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressToml {
    /// Duration of one sweep in milliseconds
    pub sweep_ms: Option<u64>,

    /// Easing curve for both animated elements
    pub easing: Option<EasingFunction>,
}

/// List store section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListToml {
    /// Largest accepted item count
    pub max_items: Option<usize>,

    /// Maximum title length in bytes
    pub title_max: Option<usize>,
}

/// Status bar geometry section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutToml {
    /// Status bar width in pixels
    pub width: Option<i32>,

    /// Status bar height in pixels
    pub height: Option<i32>,
}

/// Message buffer section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelToml {
    /// Largest inbound message in bytes
    pub inbox_size: Option<usize>,

    /// Largest outbound message in bytes
    pub outbox_size: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceToml {
    /// Status line section
    pub status: StatusToml,

    /// Progress section
    pub progress: ProgressToml,

    /// List section
    pub list: ListToml,

    /// Layout section
    pub layout: LayoutToml,

    /// Channel section
    pub channel: ChannelToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved device configuration
#[derive(Clone, Debug)]
pub struct DeviceConfig {
    /// Status bar geometry and animation timing
    pub presentation: PresentationConfig,

    /// List store bounds
    pub list: ListLimits,

    /// Largest inbound message in bytes
    pub inbox_size: usize,

    /// Largest outbound message in bytes
    pub outbox_size: usize,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            presentation: PresentationConfig::default(),
            list: ListLimits::default(),
            inbox_size: DEFAULT_INBOX_SIZE,
            outbox_size: DEFAULT_OUTBOX_SIZE,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl DeviceConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check that every value is usable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timing = &self.presentation.timing;
        let layout = &self.presentation.layout;

        if timing.status_transition.is_zero() {
            return Err(ConfigError::ValidationError(
                "status transition must be longer than 0 ms".to_string(),
            ));
        }
        if timing.sweep.is_zero() {
            return Err(ConfigError::ValidationError(
                "sweep duration must be longer than 0 ms".to_string(),
            ));
        }
        if layout.width < 4 || layout.height < 4 {
            return Err(ConfigError::ValidationError(format!(
                "status bar {}x{} is too small",
                layout.width, layout.height
            )));
        }
        if self.list.max_items == 0 {
            return Err(ConfigError::ValidationError(
                "max_items must be at least 1".to_string(),
            ));
        }
        if self.outbox_size == 0 || self.inbox_size == 0 {
            return Err(ConfigError::ValidationError(
                "message buffers must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/checksync/device.toml` or
/// `~/.config/checksync/device.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("checksync").join("device.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resulting configuration is invalid. A missing config file is not an
/// error (defaults are used).
pub fn load_config() -> Result<DeviceConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resulting configuration is invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<DeviceConfig, ConfigError> {
    let mut config = load_file(path)?;
    apply_env_config(&mut config, |name| std::env::var(name).ok());
    config.validate()?;
    Ok(config)
}

fn load_file(path: Option<PathBuf>) -> Result<DeviceConfig, ConfigError> {
    let mut config = DeviceConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: DeviceToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut DeviceConfig, toml: &DeviceToml) {
    let timing = &mut config.presentation.timing;
    if let Some(ms) = toml.status.transition_ms {
        timing.status_transition = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.status.hide_delay_ms {
        timing.hide_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.progress.sweep_ms {
        timing.sweep = Duration::from_millis(ms);
    }
    if let Some(easing) = toml.progress.easing {
        timing.easing = easing;
    }

    if let Some(max) = toml.list.max_items {
        config.list.max_items = max;
    }
    if let Some(max) = toml.list.title_max {
        config.list.title_max = max;
    }

    let layout = &mut config.presentation.layout;
    if let Some(width) = toml.layout.width {
        layout.width = width;
    }
    if let Some(height) = toml.layout.height {
        layout.height = height;
    }

    if let Some(size) = toml.channel.inbox_size {
        config.inbox_size = size;
    }
    if let Some(size) = toml.channel.outbox_size {
        config.outbox_size = size;
    }
}

/// Apply environment variable overrides to the config
///
/// `lookup` resolves a variable name; values that do not parse are ignored.
fn apply_env_config<F>(config: &mut DeviceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let millis = |name: &str| {
        lookup(name)
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
    };

    if let Some(d) = millis("CHECKSYNC_STATUS_TRANSITION_MS") {
        config.presentation.timing.status_transition = d;
        config.source = ConfigSource::Env;
    }
    if let Some(d) = millis("CHECKSYNC_HIDE_DELAY_MS") {
        config.presentation.timing.hide_delay = d;
        config.source = ConfigSource::Env;
    }
    if let Some(d) = millis("CHECKSYNC_SWEEP_MS") {
        config.presentation.timing.sweep = d;
        config.source = ConfigSource::Env;
    }
    if let Some(n) = lookup("CHECKSYNC_MAX_ITEMS").and_then(|v| v.parse::<usize>().ok()) {
        config.list.max_items = n;
        config.source = ConfigSource::Env;
    }
    if let Some(w) = lookup("CHECKSYNC_SCREEN_WIDTH").and_then(|v| v.parse::<i32>().ok()) {
        config.presentation.layout.width = w;
        config.source = ConfigSource::Env;
    }
    if let Some(h) = lookup("CHECKSYNC_BAR_HEIGHT").and_then(|v| v.parse::<i32>().ok()) {
        config.presentation.layout.height = h;
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Sweep duration override (milliseconds)
    pub sweep_ms: Option<u64>,

    /// Hide delay override (milliseconds)
    pub hide_delay_ms: Option<u64>,

    /// Item limit override
    pub max_items: Option<usize>,

    /// Outbox size override (bytes)
    pub outbox_size: Option<usize>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set sweep duration override
    #[must_use]
    pub fn with_sweep_ms(mut self, ms: u64) -> Self {
        self.sweep_ms = Some(ms);
        self
    }

    /// Set hide delay override
    #[must_use]
    pub fn with_hide_delay_ms(mut self, ms: u64) -> Self {
        self.hide_delay_ms = Some(ms);
        self
    }

    /// Set item limit override
    #[must_use]
    pub fn with_max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Set outbox size override
    #[must_use]
    pub fn with_outbox_size(mut self, size: usize) -> Self {
        self.outbox_size = Some(size);
        self
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if an override makes the
    /// configuration unusable.
    pub fn apply(&self, config: &mut DeviceConfig) -> Result<(), ConfigError> {
        if self.sweep_ms.is_some()
            || self.hide_delay_ms.is_some()
            || self.max_items.is_some()
            || self.outbox_size.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ms) = self.sweep_ms {
            config.presentation.timing.sweep = Duration::from_millis(ms);
        }
        if let Some(ms) = self.hide_delay_ms {
            config.presentation.timing.hide_delay = Duration::from_millis(ms);
        }
        if let Some(max) = self.max_items {
            config.list.max_items = max;
        }
        if let Some(size) = self.outbox_size {
            config.outbox_size = size;
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
