//! Common error types for PlayDeck

use thiserror::Error;

use crate::state::MediaField;

/// Common result type for PlayDeck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across PlayDeck crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error (wraps toml::de::Error)
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Playback state field error
    #[error("State error: {0}")]
    State(#[from] StateError),
}

/// Errors raised when writing a field of [`PlaybackState`](crate::PlaybackState)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// Value variant does not match the field's type
    #[error("field '{field}' expects {expected}, got {actual}")]
    FieldTypeMismatch {
        field: MediaField,
        expected: &'static str,
        actual: &'static str,
    },

    /// Derived fields are computed, never written
    #[error("field '{0}' is derived and cannot be written")]
    ReadOnlyField(MediaField),
}
