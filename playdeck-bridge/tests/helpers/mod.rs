//! Test helper modules for PlayDeck bridge integration tests
//!
//! - RecordingAdapter: adapter that records every call and can be told to fail
//! - NotificationLog: collects notifications broadcast by a scope

#![allow(dead_code)]

pub mod notification_log;
pub mod recording_adapter;

pub use notification_log::NotificationLog;
pub use recording_adapter::RecordingAdapter;

use playdeck_bridge::{ControllerConfig, PlayerScope};
use std::time::Duration;

/// Config with short timers so tests stay quick
pub fn fast_config() -> ControllerConfig {
    ControllerConfig {
        idle_timeout: Duration::from_millis(200),
        autoplay_max_attempts: 3,
        autoplay_retry_delay: Duration::from_millis(20),
        notification_capacity: 4096,
        ..ControllerConfig::default()
    }
}

pub fn scope() -> PlayerScope {
    PlayerScope::new(fast_config())
}
