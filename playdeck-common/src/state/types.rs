//! Enumerated playback-state value types

use serde::{Deserialize, Serialize};

/// How the current media is presented
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ViewType {
    /// Not yet known (no source loaded)
    #[default]
    Unknown,
    /// Audio-only presentation (poster or visualizer)
    Audio,
    /// Video surface
    Video,
}

impl std::fmt::Display for ViewType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewType::Unknown => write!(f, "unknown"),
            ViewType::Audio => write!(f, "audio"),
            ViewType::Video => write!(f, "video"),
        }
    }
}

/// Kind of media resource behind the current source
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MediaType {
    #[default]
    Unknown,
    Audio,
    Video,
    /// Live stream with no fixed end
    LiveVideo,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Unknown => write!(f, "unknown"),
            MediaType::Audio => write!(f, "audio"),
            MediaType::Video => write!(f, "video"),
            MediaType::LiveVideo => write!(f, "live-video"),
        }
    }
}

/// Classification of a recorded media failure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MediaErrorKind {
    /// Fetching was aborted by the engine
    Aborted,
    /// Network failure while fetching
    Network,
    /// Engine could not decode the resource
    Decode,
    /// Source format or URL not supported
    SourceNotSupported,
    /// Adapter operation rejected (play, setter, fullscreen)
    Provider,
    /// Automatic playback was refused
    Autoplay,
    Unknown,
}

impl std::fmt::Display for MediaErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaErrorKind::Aborted => write!(f, "aborted"),
            MediaErrorKind::Network => write!(f, "network"),
            MediaErrorKind::Decode => write!(f, "decode"),
            MediaErrorKind::SourceNotSupported => write!(f, "source-not-supported"),
            MediaErrorKind::Provider => write!(f, "provider"),
            MediaErrorKind::Autoplay => write!(f, "autoplay"),
            MediaErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Media failure recorded into the `error` / `autoplay-error` fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaError {
    pub kind: MediaErrorKind,
    pub message: String,
}

impl MediaError {
    pub fn new(kind: MediaErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Adapter operation failure
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(MediaErrorKind::Provider, message)
    }

    /// Refused automatic playback
    pub fn autoplay(message: impl Into<String>) -> Self {
        Self::new(MediaErrorKind::Autoplay, message)
    }
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
