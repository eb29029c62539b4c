//! Configuration loading and config file resolution
//!
//! Bootstrap configuration lives in a small TOML file:
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [bridge]
//! idle_timeout_ms = 3000
//! autoplay_max_attempts = 3
//! ```
//!
//! Missing files are not fatal unless the path was given explicitly on the
//! command line: a warning is logged and compiled defaults are used.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PLAYDECK_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Controller tuning (optional)
    #[serde(default)]
    pub bridge: BridgeSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Controller tuning values
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Inactivity before `idle` becomes true
    pub idle_timeout_ms: u64,
    /// Automatic playback attempts before giving up (last one forces mute)
    pub autoplay_max_attempts: u32,
    /// Delay between automatic playback attempts
    pub autoplay_retry_delay_ms: u64,
    /// Broadcast buffer for notifications
    pub notification_capacity: usize,
    /// Scheduler yields before a controls-visibility flip takes effect
    pub settle_ticks: u32,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 2000,
            autoplay_max_attempts: 3,
            autoplay_retry_delay_ms: 250,
            notification_capacity: 100,
            settle_ticks: 1,
        }
    }
}

impl BridgeSettings {
    /// Reject values the controller cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout_ms == 0 {
            return Err(Error::Config("bridge.idle_timeout_ms must be greater than 0".to_string()));
        }
        if self.autoplay_max_attempts == 0 {
            return Err(Error::Config(
                "bridge.autoplay_max_attempts must be at least 1".to_string(),
            ));
        }
        if self.notification_capacity == 0 {
            return Err(Error::Config(
                "bridge.notification_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.bridge.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Where a config path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine,
    Environment,
    UserConfigDir,
}

/// Config file resolution following priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. User config directory (`~/.config/playdeck/config.toml`)
///
/// Returns `None` when no candidate exists; callers fall back to defaults.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
) -> Option<(PathBuf, ConfigSource)> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some((path.to_path_buf(), ConfigSource::CommandLine));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some((PathBuf::from(path), ConfigSource::Environment));
        }
    }

    // Priority 3: User config directory
    default_config_path()
        .filter(|path| path.exists())
        .map(|path| (path, ConfigSource::UserConfigDir))
}

/// Platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("playdeck").join("config.toml"))
}

/// Resolve and load configuration with graceful degradation
///
/// An explicit command-line path must exist and parse. Any other missing
/// file yields defaults with a warning.
pub fn load_config(cli_arg: Option<&Path>, env_var_name: &str) -> Result<TomlConfig> {
    let Some((path, source)) = resolve_config_path(cli_arg, env_var_name) else {
        info!("No config file found, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        if source == ConfigSource::CommandLine {
            return Err(Error::Config(format!("Config file not found: {}", path.display())));
        }
        warn!(
            "Config file {} ({:?}) does not exist, using compiled defaults",
            path.display(),
            source
        );
        return Ok(TomlConfig::default());
    }

    let config = TomlConfig::load(&path)?;
    info!("Loaded configuration from {} ({:?})", path.display(), source);
    Ok(config)
}
