//! Playback state record
//!
//! [`PlaybackState`] is the single record every control observes. Base fields
//! are plain data; derived fields (`is-audio-view`, `buffered-amount`, ...)
//! are computed on read so they can never go stale relative to the fields
//! they depend on.

mod field;
mod ranges;
mod types;

pub use field::{FieldValue, MediaField};
pub use ranges::TimeRanges;
pub use types::{MediaError, MediaErrorKind, MediaType, ViewType};

use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// Clamp a volume into 0.0 - 1.0; NaN maps to silence
pub fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Full playback-state record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub paused: bool,
    pub muted: bool,
    /// 0.0 - 1.0
    pub volume: f64,
    pub current_time: f64,
    /// NaN until the engine reports it
    pub duration: f64,
    pub buffered: TimeRanges,
    pub seekable: TimeRanges,
    pub played: TimeRanges,
    pub seeking: bool,
    pub waiting: bool,
    pub ended: bool,
    pub started: bool,
    pub playing: bool,
    pub fullscreen: bool,
    pub view_type: ViewType,
    pub media_type: MediaType,
    pub error: Option<MediaError>,
    pub autoplay_error: Option<MediaError>,
    pub controls: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub playsinline: bool,
    pub autoplay: bool,
    pub idle: bool,
    pub can_play: bool,
    pub can_play_through: bool,
    pub can_request_fullscreen: bool,
    pub current_src: String,
    pub current_poster: String,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            paused: true,
            muted: false,
            volume: 1.0,
            current_time: 0.0,
            duration: f64::NAN,
            buffered: TimeRanges::new(),
            seekable: TimeRanges::new(),
            played: TimeRanges::new(),
            seeking: false,
            waiting: false,
            ended: false,
            started: false,
            playing: false,
            fullscreen: false,
            view_type: ViewType::Unknown,
            media_type: MediaType::Unknown,
            error: None,
            autoplay_error: None,
            controls: false,
            looping: false,
            playsinline: false,
            autoplay: false,
            idle: false,
            can_play: false,
            can_play_through: false,
            can_request_fullscreen: false,
            current_src: String::new(),
            current_poster: String::new(),
        }
    }
}

impl PlaybackState {
    pub fn is_audio_view(&self) -> bool {
        self.view_type == ViewType::Audio
    }

    pub fn is_video_view(&self) -> bool {
        self.view_type == ViewType::Video
    }

    pub fn is_live_video(&self) -> bool {
        self.media_type == MediaType::LiveVideo
    }

    /// End of buffered media, clamped to a known duration
    pub fn buffered_amount(&self) -> f64 {
        clamp_to_duration(self.buffered.last_end(), self.duration)
    }

    /// End of seekable media, clamped to a known duration
    pub fn seekable_amount(&self) -> f64 {
        clamp_to_duration(self.seekable.last_end(), self.duration)
    }

    /// Read one field (base or derived)
    pub fn get(&self, field: MediaField) -> FieldValue {
        match field {
            MediaField::Paused => self.paused.into(),
            MediaField::Muted => self.muted.into(),
            MediaField::Volume => self.volume.into(),
            MediaField::CurrentTime => self.current_time.into(),
            MediaField::Duration => self.duration.into(),
            MediaField::Buffered => self.buffered.clone().into(),
            MediaField::Seekable => self.seekable.clone().into(),
            MediaField::Played => self.played.clone().into(),
            MediaField::Seeking => self.seeking.into(),
            MediaField::Waiting => self.waiting.into(),
            MediaField::Ended => self.ended.into(),
            MediaField::Started => self.started.into(),
            MediaField::Playing => self.playing.into(),
            MediaField::Fullscreen => self.fullscreen.into(),
            MediaField::ViewType => self.view_type.into(),
            MediaField::MediaType => self.media_type.into(),
            MediaField::Error => self.error.clone().into(),
            MediaField::AutoplayError => self.autoplay_error.clone().into(),
            MediaField::Controls => self.controls.into(),
            MediaField::Loop => self.looping.into(),
            MediaField::Playsinline => self.playsinline.into(),
            MediaField::Autoplay => self.autoplay.into(),
            MediaField::Idle => self.idle.into(),
            MediaField::CanPlay => self.can_play.into(),
            MediaField::CanPlayThrough => self.can_play_through.into(),
            MediaField::CanRequestFullscreen => self.can_request_fullscreen.into(),
            MediaField::CurrentSrc => self.current_src.clone().into(),
            MediaField::CurrentPoster => self.current_poster.clone().into(),
            MediaField::IsAudioView => self.is_audio_view().into(),
            MediaField::IsVideoView => self.is_video_view().into(),
            MediaField::IsLiveVideo => self.is_live_video().into(),
            MediaField::BufferedAmount => self.buffered_amount().into(),
            MediaField::SeekableAmount => self.seekable_amount().into(),
        }
    }

    /// Write one base field
    ///
    /// Fails on derived fields and on a value of the wrong type; the record
    /// is left unchanged on failure.
    pub fn set(&mut self, field: MediaField, value: FieldValue) -> Result<(), StateError> {
        if field.is_derived() {
            return Err(StateError::ReadOnlyField(field));
        }

        let mismatch = |expected: &'static str, value: &FieldValue| StateError::FieldTypeMismatch {
            field,
            expected,
            actual: value.type_name(),
        };

        match (field, value) {
            (MediaField::Paused, FieldValue::Bool(v)) => self.paused = v,
            (MediaField::Muted, FieldValue::Bool(v)) => self.muted = v,
            (MediaField::Volume, FieldValue::Number(v)) => self.volume = clamp_volume(v),
            (MediaField::CurrentTime, FieldValue::Number(v)) => self.current_time = v.max(0.0),
            (MediaField::Duration, FieldValue::Number(v)) => self.duration = v,
            (MediaField::Buffered, FieldValue::Ranges(v)) => self.buffered = v,
            (MediaField::Seekable, FieldValue::Ranges(v)) => self.seekable = v,
            (MediaField::Played, FieldValue::Ranges(v)) => self.played = v,
            (MediaField::Seeking, FieldValue::Bool(v)) => self.seeking = v,
            (MediaField::Waiting, FieldValue::Bool(v)) => self.waiting = v,
            (MediaField::Ended, FieldValue::Bool(v)) => self.ended = v,
            (MediaField::Started, FieldValue::Bool(v)) => self.started = v,
            (MediaField::Playing, FieldValue::Bool(v)) => self.playing = v,
            (MediaField::Fullscreen, FieldValue::Bool(v)) => self.fullscreen = v,
            (MediaField::ViewType, FieldValue::ViewType(v)) => self.view_type = v,
            (MediaField::MediaType, FieldValue::MediaType(v)) => self.media_type = v,
            (MediaField::Error, FieldValue::Error(v)) => self.error = v,
            (MediaField::AutoplayError, FieldValue::Error(v)) => self.autoplay_error = v,
            (MediaField::Controls, FieldValue::Bool(v)) => self.controls = v,
            (MediaField::Loop, FieldValue::Bool(v)) => self.looping = v,
            (MediaField::Playsinline, FieldValue::Bool(v)) => self.playsinline = v,
            (MediaField::Autoplay, FieldValue::Bool(v)) => self.autoplay = v,
            (MediaField::Idle, FieldValue::Bool(v)) => self.idle = v,
            (MediaField::CanPlay, FieldValue::Bool(v)) => self.can_play = v,
            (MediaField::CanPlayThrough, FieldValue::Bool(v)) => self.can_play_through = v,
            (MediaField::CanRequestFullscreen, FieldValue::Bool(v)) => {
                self.can_request_fullscreen = v
            }
            (MediaField::CurrentSrc, FieldValue::Text(v)) => self.current_src = v,
            (MediaField::CurrentPoster, FieldValue::Text(v)) => self.current_poster = v,
            (_, value) => return Err(mismatch(expected_type(field), &value)),
        }
        Ok(())
    }

    /// State after a source change: defaults, except the preserved set
    pub fn soft_reset(&self) -> PlaybackState {
        let mut next = PlaybackState::default();
        for field in MediaField::SOFT_RESET_PRESERVED {
            // Preserved fields are base fields, so the write cannot fail
            let _ = next.set(field, self.get(field));
        }
        next
    }

    /// Fields (base and derived) whose value differs in `other`, with the new value
    pub fn diff(&self, other: &PlaybackState) -> Vec<(MediaField, FieldValue)> {
        MediaField::ALL
            .iter()
            .filter_map(|&field| {
                let next = other.get(field);
                if self.get(field) == next {
                    None
                } else {
                    Some((field, next))
                }
            })
            .collect()
    }
}

fn clamp_to_duration(amount: f64, duration: f64) -> f64 {
    if duration.is_finite() {
        amount.min(duration).max(0.0)
    } else {
        amount.max(0.0)
    }
}

fn expected_type(field: MediaField) -> &'static str {
    match field {
        MediaField::Volume | MediaField::CurrentTime | MediaField::Duration => "number",
        MediaField::Buffered | MediaField::Seekable | MediaField::Played => "ranges",
        MediaField::ViewType => "view-type",
        MediaField::MediaType => "media-type",
        MediaField::Error | MediaField::AutoplayError => "error",
        MediaField::CurrentSrc | MediaField::CurrentPoster => "text",
        _ => "bool",
    }
}
