//! Controller runtime settings
//!
//! Converts the `[bridge]` section of the bootstrap TOML file into typed
//! durations for the controller.

use playdeck_common::config::BridgeSettings;
use playdeck_common::time::millis_to_duration;
use std::time::Duration;

/// Controller tuning
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Inactivity before `idle` becomes true
    pub idle_timeout: Duration,
    pub autoplay_max_attempts: u32,
    pub autoplay_retry_delay: Duration,
    /// Broadcast buffer for notifications
    pub notification_capacity: usize,
    /// Scheduler yields before a controls-visibility flip is applied
    pub settle_ticks: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::from(&BridgeSettings::default())
    }
}

impl From<&BridgeSettings> for ControllerConfig {
    fn from(settings: &BridgeSettings) -> Self {
        Self {
            idle_timeout: millis_to_duration(settings.idle_timeout_ms),
            autoplay_max_attempts: settings.autoplay_max_attempts.max(1),
            autoplay_retry_delay: millis_to_duration(settings.autoplay_retry_delay_ms),
            notification_capacity: settings.notification_capacity.max(1),
            settle_ticks: settings.settle_ticks,
        }
    }
}
