//! Error types for playdeck-bridge
//!
//! Defines bridge-specific error types using thiserror. Every variant carries
//! owned strings so a failure can be handed both to the original requester
//! and to the controller's error reporting.

use playdeck_common::{MediaError, MediaErrorKind, StateError};
use thiserror::Error;

/// Main error type for playdeck-bridge
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An adapter method rejected the operation
    #[error("Provider operation '{operation}' failed: {message}")]
    ProviderOperation { operation: String, message: String },

    /// Automatic playback refused after every attempt
    #[error("Autoplay failed after {attempts} attempt(s): {message}")]
    Autoplay { attempts: u32, message: String },

    /// Something without the required capabilities was offered as an adapter
    #[error("Connection integrity error: {0}")]
    ConnectionIntegrity(String),

    /// A queued command failed while the queue was being flushed
    #[error("Queued request '{key}' failed during flush: {message}")]
    QueueReplay { key: String, message: String },

    /// The request queue was destroyed with its host
    #[error("Request queue destroyed")]
    QueueDestroyed,

    /// No adapter is attached
    #[error("No media adapter connected")]
    NotConnected,

    /// The request was superseded by a newer one of the same kind, or dropped
    #[error("Request discarded before execution")]
    RequestDiscarded,

    /// The controller loop is no longer running
    #[error("Controller closed")]
    ControllerClosed,

    /// A cleanup callback failed
    #[error("Disposal error: {0}")]
    Disposal(String),

    /// Invalid playback-state write
    #[error("Invalid state: {0}")]
    InvalidState(#[from] StateError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for adapter implementations
    pub fn provider(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ProviderOperation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Store-level record of this failure
    pub fn to_media_error(&self) -> MediaError {
        let kind = match self {
            Error::ProviderOperation { .. } | Error::NotConnected => MediaErrorKind::Provider,
            Error::Autoplay { .. } => MediaErrorKind::Autoplay,
            _ => MediaErrorKind::Unknown,
        };
        MediaError::new(kind, self.to_string())
    }
}

impl From<playdeck_common::Error> for Error {
    fn from(err: playdeck_common::Error) -> Self {
        match err {
            playdeck_common::Error::State(e) => Error::InvalidState(e),
            other => Error::Config(other.to_string()),
        }
    }
}

/// Convenience Result type using playdeck-bridge Error
pub type Result<T> = std::result::Result<T, Error>;
