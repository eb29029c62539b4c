//! # PlayDeck Common Library
//!
//! Shared vocabulary for the PlayDeck playback bridge:
//! - Playback state record, field keys and value types
//! - Event types (requests, engine events, notifications)
//! - Configuration loading
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod events;
pub mod state;
pub mod time;

pub use error::{Error, Result, StateError};
pub use state::{
    FieldValue, MediaError, MediaErrorKind, MediaField, MediaType, PlaybackState, TimeRanges,
    ViewType,
};
