//! Request vocabulary issued by descendant controls

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Intent to change playback state, issued by a control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "kebab-case")]
pub enum MediaRequest {
    Play,
    Pause,
    Mute,
    Unmute,
    /// Seek to an absolute time in seconds
    Seek(f64),
    /// Scrubbing preview at a time in seconds (no engine seek yet)
    Seeking(f64),
    /// Requested volume; clamped to 0.0 - 1.0 by the controller
    VolumeChange(f64),
    EnterFullscreen,
    ExitFullscreen,
    ShowControls,
    HideControls,
    ResumeIdleTracking,
    PauseIdleTracking,
}

impl MediaRequest {
    /// Request event name, e.g. `volume-change`
    pub fn name(&self) -> &'static str {
        match self {
            MediaRequest::Play => "play",
            MediaRequest::Pause => "pause",
            MediaRequest::Mute => "mute",
            MediaRequest::Unmute => "unmute",
            MediaRequest::Seek(_) => "seek",
            MediaRequest::Seeking(_) => "seeking",
            MediaRequest::VolumeChange(_) => "volume-change",
            MediaRequest::EnterFullscreen => "enter-fullscreen",
            MediaRequest::ExitFullscreen => "exit-fullscreen",
            MediaRequest::ShowControls => "show-controls",
            MediaRequest::HideControls => "hide-controls",
            MediaRequest::ResumeIdleTracking => "resume-idle-tracking",
            MediaRequest::PauseIdleTracking => "pause-idle-tracking",
        }
    }

    /// Semantic field key under which the request is queued
    ///
    /// Requests sharing a key collapse to the latest while the engine is not
    /// ready. `None` for requests handled by the controller itself.
    pub fn queue_key(&self) -> Option<&'static str> {
        match self {
            MediaRequest::Play | MediaRequest::Pause => Some("paused"),
            MediaRequest::Mute | MediaRequest::Unmute => Some("muted"),
            MediaRequest::Seek(_) => Some("time"),
            MediaRequest::Seeking(_) => Some("seeking"),
            MediaRequest::VolumeChange(_) => Some("volume"),
            MediaRequest::EnterFullscreen | MediaRequest::ExitFullscreen => Some("fullscreen"),
            MediaRequest::ShowControls
            | MediaRequest::HideControls
            | MediaRequest::ResumeIdleTracking
            | MediaRequest::PauseIdleTracking => None,
        }
    }
}

impl std::fmt::Display for MediaRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-request", self.name())
    }
}

/// Provenance of a request (the user event that triggered it)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOrigin {
    /// Originating event kind, e.g. `pointerup`, `keydown:k`
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl RequestOrigin {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            timestamp: crate::time::now(),
        }
    }
}

/// User activity that resets idle detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserActivity {
    Pointer,
    Keyboard,
    Touch,
}
