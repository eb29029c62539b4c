//! Semantic events emitted by an engine adapter
//!
//! These are the inputs of the playback state machine. Adapters translate
//! their engine's native notifications into these variants.

use serde::{Deserialize, Serialize};

use crate::state::{MediaError, MediaType, TimeRanges, ViewType};

/// Engine-originated semantic event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MediaEvent {
    // === Playback phases ===
    /// Source selected and fetching started
    Loading {
        src: String,
        poster: String,
        media_type: MediaType,
        view_type: ViewType,
    },
    /// Source resolved
    Loaded { src: String },
    /// Loading aborted
    Abort { error: MediaError },
    /// Enough data to start playback
    CanPlay { duration: f64 },
    /// Automatic playback attempt started
    Autoplay,
    /// Automatic playback refused
    AutoplayFail { error: MediaError },
    /// Play requested (optimistic)
    Play,
    /// Play request rejected
    PlayFail { error: MediaError },
    /// Frames are advancing
    Playing,
    TimeUpdate { current_time: f64 },
    Seeking { time: f64 },
    /// Paused; `seeked_to` is set when the pause completes a seek
    Pause { seeked_to: Option<f64> },
    Ended,
    /// Stalled waiting for data
    Waiting,
    /// A new source replaced the current one
    SrcChange { src: String },
    Progress { buffered: TimeRanges, seekable: TimeRanges },

    // === Property changes (orthogonal to phase) ===
    VolumeChange { volume: f64, muted: bool },
    Error { error: MediaError },
    FullscreenSupportChange { supported: bool },
    FullscreenChange { fullscreen: bool },
    PosterChange { poster: String },
    LoopChange { looping: bool },
    PlaysinlineChange { playsinline: bool },
    ControlsChange { controls: bool },
    AutoplayChange { autoplay: bool },
    IdleChange { idle: bool },
    DurationChange { duration: f64 },
    CanPlayThrough,
}

impl MediaEvent {
    /// Kebab-case event name, e.g. `can-play`
    pub fn name(&self) -> &'static str {
        match self {
            MediaEvent::Loading { .. } => "loading",
            MediaEvent::Loaded { .. } => "loaded",
            MediaEvent::Abort { .. } => "abort",
            MediaEvent::CanPlay { .. } => "can-play",
            MediaEvent::Autoplay => "autoplay",
            MediaEvent::AutoplayFail { .. } => "autoplay-fail",
            MediaEvent::Play => "play",
            MediaEvent::PlayFail { .. } => "play-fail",
            MediaEvent::Playing => "playing",
            MediaEvent::TimeUpdate { .. } => "time-update",
            MediaEvent::Seeking { .. } => "seeking",
            MediaEvent::Pause { .. } => "pause",
            MediaEvent::Ended => "ended",
            MediaEvent::Waiting => "waiting",
            MediaEvent::SrcChange { .. } => "src-change",
            MediaEvent::Progress { .. } => "progress",
            MediaEvent::VolumeChange { .. } => "volume-change",
            MediaEvent::Error { .. } => "error",
            MediaEvent::FullscreenSupportChange { .. } => "fullscreen-support-change",
            MediaEvent::FullscreenChange { .. } => "fullscreen-change",
            MediaEvent::PosterChange { .. } => "poster-change",
            MediaEvent::LoopChange { .. } => "loop-change",
            MediaEvent::PlaysinlineChange { .. } => "playsinline-change",
            MediaEvent::ControlsChange { .. } => "controls-change",
            MediaEvent::AutoplayChange { .. } => "autoplay-change",
            MediaEvent::IdleChange { .. } => "idle-change",
            MediaEvent::DurationChange { .. } => "duration-change",
            MediaEvent::CanPlayThrough => "can-play-through",
        }
    }

    /// Property changes patch one field and never change the playback phase
    pub fn is_property_change(&self) -> bool {
        matches!(
            self,
            MediaEvent::VolumeChange { .. }
                | MediaEvent::Error { .. }
                | MediaEvent::FullscreenSupportChange { .. }
                | MediaEvent::FullscreenChange { .. }
                | MediaEvent::PosterChange { .. }
                | MediaEvent::LoopChange { .. }
                | MediaEvent::PlaysinlineChange { .. }
                | MediaEvent::ControlsChange { .. }
                | MediaEvent::AutoplayChange { .. }
                | MediaEvent::IdleChange { .. }
                | MediaEvent::DurationChange { .. }
                | MediaEvent::CanPlayThrough
        )
    }
}

impl std::fmt::Display for MediaEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
