//! Field keys and dynamically-typed field values

use serde::{Deserialize, Serialize};

use super::ranges::TimeRanges;
use super::types::{MediaError, MediaType, ViewType};

/// Key of a single playback-state cell
///
/// Base fields are writable through the playback machine; the five derived
/// fields at the end are computed from base fields and are read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaField {
    Paused,
    Muted,
    Volume,
    CurrentTime,
    Duration,
    Buffered,
    Seekable,
    Played,
    Seeking,
    Waiting,
    Ended,
    Started,
    Playing,
    Fullscreen,
    ViewType,
    MediaType,
    Error,
    AutoplayError,
    Controls,
    Loop,
    Playsinline,
    Autoplay,
    Idle,
    CanPlay,
    CanPlayThrough,
    CanRequestFullscreen,
    CurrentSrc,
    CurrentPoster,
    // Derived
    IsAudioView,
    IsVideoView,
    IsLiveVideo,
    BufferedAmount,
    SeekableAmount,
}

impl MediaField {
    /// Every field, base fields first
    pub const ALL: [MediaField; 33] = [
        MediaField::Paused,
        MediaField::Muted,
        MediaField::Volume,
        MediaField::CurrentTime,
        MediaField::Duration,
        MediaField::Buffered,
        MediaField::Seekable,
        MediaField::Played,
        MediaField::Seeking,
        MediaField::Waiting,
        MediaField::Ended,
        MediaField::Started,
        MediaField::Playing,
        MediaField::Fullscreen,
        MediaField::ViewType,
        MediaField::MediaType,
        MediaField::Error,
        MediaField::AutoplayError,
        MediaField::Controls,
        MediaField::Loop,
        MediaField::Playsinline,
        MediaField::Autoplay,
        MediaField::Idle,
        MediaField::CanPlay,
        MediaField::CanPlayThrough,
        MediaField::CanRequestFullscreen,
        MediaField::CurrentSrc,
        MediaField::CurrentPoster,
        MediaField::IsAudioView,
        MediaField::IsVideoView,
        MediaField::IsLiveVideo,
        MediaField::BufferedAmount,
        MediaField::SeekableAmount,
    ];

    /// Fields kept across a soft reset (source change)
    pub const SOFT_RESET_PRESERVED: [MediaField; 7] = [
        MediaField::Autoplay,
        MediaField::Controls,
        MediaField::Playsinline,
        MediaField::ViewType,
        MediaField::CurrentPoster,
        MediaField::Loop,
        MediaField::Volume,
    ];

    pub fn is_derived(self) -> bool {
        matches!(
            self,
            MediaField::IsAudioView
                | MediaField::IsVideoView
                | MediaField::IsLiveVideo
                | MediaField::BufferedAmount
                | MediaField::SeekableAmount
        )
    }

    /// Kebab-case name, e.g. `current-time`
    pub fn name(self) -> &'static str {
        match self {
            MediaField::Paused => "paused",
            MediaField::Muted => "muted",
            MediaField::Volume => "volume",
            MediaField::CurrentTime => "current-time",
            MediaField::Duration => "duration",
            MediaField::Buffered => "buffered",
            MediaField::Seekable => "seekable",
            MediaField::Played => "played",
            MediaField::Seeking => "seeking",
            MediaField::Waiting => "waiting",
            MediaField::Ended => "ended",
            MediaField::Started => "started",
            MediaField::Playing => "playing",
            MediaField::Fullscreen => "fullscreen",
            MediaField::ViewType => "view-type",
            MediaField::MediaType => "media-type",
            MediaField::Error => "error",
            MediaField::AutoplayError => "autoplay-error",
            MediaField::Controls => "controls",
            MediaField::Loop => "loop",
            MediaField::Playsinline => "playsinline",
            MediaField::Autoplay => "autoplay",
            MediaField::Idle => "idle",
            MediaField::CanPlay => "can-play",
            MediaField::CanPlayThrough => "can-play-through",
            MediaField::CanRequestFullscreen => "can-request-fullscreen",
            MediaField::CurrentSrc => "current-src",
            MediaField::CurrentPoster => "current-poster",
            MediaField::IsAudioView => "is-audio-view",
            MediaField::IsVideoView => "is-video-view",
            MediaField::IsLiveVideo => "is-live-video",
            MediaField::BufferedAmount => "buffered-amount",
            MediaField::SeekableAmount => "seekable-amount",
        }
    }

    /// Notification name emitted when this field changes, e.g. `volume-change`
    ///
    /// `controls-change` is taken by custom-controls visibility, so the
    /// native controls attribute reports as `controls-attribute-change`.
    pub fn change_event_name(self) -> String {
        match self {
            MediaField::Controls => "controls-attribute-change".to_string(),
            _ => format!("{}-change", self.name()),
        }
    }
}

impl std::fmt::Display for MediaField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of a single field, as carried across the store and notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Ranges(TimeRanges),
    Text(String),
    ViewType(ViewType),
    MediaType(MediaType),
    Error(Option<MediaError>),
}

impl FieldValue {
    /// Short type label used in mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Number(_) => "number",
            FieldValue::Ranges(_) => "ranges",
            FieldValue::Text(_) => "text",
            FieldValue::ViewType(_) => "view-type",
            FieldValue::MediaType(_) => "media-type",
            FieldValue::Error(_) => "error",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ranges(&self) -> Option<&TimeRanges> {
        match self {
            FieldValue::Ranges(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<Option<&MediaError>> {
        match self {
            FieldValue::Error(v) => Some(v.as_ref()),
            _ => None,
        }
    }
}

// NaN == NaN here: a duration that stays unknown is not a change.
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Number(a), FieldValue::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (FieldValue::Ranges(a), FieldValue::Ranges(b)) => a == b,
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::ViewType(a), FieldValue::ViewType(b)) => a == b,
            (FieldValue::MediaType(a), FieldValue::MediaType(b)) => a == b,
            (FieldValue::Error(a), FieldValue::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<TimeRanges> for FieldValue {
    fn from(value: TimeRanges) -> Self {
        FieldValue::Ranges(value)
    }
}

impl From<ViewType> for FieldValue {
    fn from(value: ViewType) -> Self {
        FieldValue::ViewType(value)
    }
}

impl From<MediaType> for FieldValue {
    fn from(value: MediaType) -> Self {
        FieldValue::MediaType(value)
    }
}

impl From<Option<MediaError>> for FieldValue {
    fn from(value: Option<MediaError>) -> Self {
        FieldValue::Error(value)
    }
}

impl From<MediaError> for FieldValue {
    fn from(value: MediaError) -> Self {
        FieldValue::Error(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_contains_every_field_once() {
        let mut fields = MediaField::ALL.to_vec();
        fields.sort();
        fields.dedup();
        assert_eq!(fields.len(), MediaField::ALL.len());
    }

    #[test]
    fn test_derived_fields() {
        let derived: Vec<_> = MediaField::ALL.iter().filter(|f| f.is_derived()).collect();
        assert_eq!(derived.len(), 5);
        assert!(!MediaField::Volume.is_derived());
    }

    #[test]
    fn test_change_event_name() {
        assert_eq!(MediaField::Volume.change_event_name(), "volume-change");
        assert_eq!(MediaField::CurrentTime.change_event_name(), "current-time-change");
        assert_eq!(MediaField::Controls.change_event_name(), "controls-attribute-change");
    }

    #[test]
    fn test_serde_name_matches_name() {
        for field in MediaField::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.name()));
        }
    }

    #[test]
    fn test_nan_numbers_compare_equal() {
        assert_eq!(FieldValue::Number(f64::NAN), FieldValue::Number(f64::NAN));
        assert_ne!(FieldValue::Number(1.0), FieldValue::Number(f64::NAN));
        assert_ne!(FieldValue::Bool(true), FieldValue::Number(1.0));
    }
}
