//! Event types for the PlayDeck bridge
//!
//! Three directions of traffic:
//! - [`MediaRequest`]: control → controller (intent)
//! - [`MediaEvent`]: adapter → controller (engine facts, machine input)
//! - [`Notification`]: controller → host page (observability, `*-change`)

mod media_types;
mod request_types;

pub use media_types::MediaEvent;
pub use request_types::{MediaRequest, RequestOrigin, UserActivity};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::{FieldValue, MediaErrorKind, MediaField};

/// Notification broadcast by a controller
///
/// Dispatched only on an actual change; a repeated identical write produces
/// nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Notification {
    /// A forwarded playback-state field changed
    StateChange {
        field: MediaField,
        value: FieldValue,
        timestamp: DateTime<Utc>,
    },

    /// Custom controls were shown or hidden
    ControlsChange {
        visible: bool,
        timestamp: DateTime<Utc>,
    },

    /// Generic failure signal for host-page observability
    Error {
        kind: MediaErrorKind,
        message: String,
        /// Request event that failed, if any
        request: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// An engine adapter connected
    AdapterConnected {
        connection_id: Uuid,
        adapter: String,
        timestamp: DateTime<Utc>,
    },

    /// The engine adapter disconnected; the store has been hard-reset
    AdapterDisconnected {
        connection_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl Notification {
    pub fn state_change(field: MediaField, value: FieldValue) -> Self {
        Notification::StateChange {
            field,
            value,
            timestamp: crate::time::now(),
        }
    }

    pub fn controls_change(visible: bool) -> Self {
        Notification::ControlsChange {
            visible,
            timestamp: crate::time::now(),
        }
    }

    pub fn error(kind: MediaErrorKind, message: impl Into<String>, request: Option<&str>) -> Self {
        Notification::Error {
            kind,
            message: message.into(),
            request: request.map(str::to_string),
            timestamp: crate::time::now(),
        }
    }

    /// Event name a host would listen for, e.g. `volume-change`
    pub fn event_name(&self) -> String {
        match self {
            Notification::StateChange { field, .. } => field.change_event_name(),
            Notification::ControlsChange { .. } => "controls-change".to_string(),
            Notification::Error { .. } => "error".to_string(),
            Notification::AdapterConnected { .. } => "adapter-connected".to_string(),
            Notification::AdapterDisconnected { .. } => "adapter-disconnected".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let n = Notification::state_change(MediaField::Idle, FieldValue::Bool(true));
        assert_eq!(n.event_name(), "idle-change");
        assert_eq!(Notification::controls_change(false).event_name(), "controls-change");
    }

    #[test]
    fn test_controls_attribute_and_visibility_names_differ() {
        let attribute = Notification::state_change(MediaField::Controls, FieldValue::Bool(true));
        let visibility = Notification::controls_change(true);
        assert_ne!(attribute.event_name(), visibility.event_name());
    }

    #[test]
    fn test_notification_serialization() {
        let n = Notification::state_change(MediaField::Volume, FieldValue::Number(0.5));
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "state-change");
        assert_eq!(json["field"], "volume");
        assert_eq!(json["value"]["type"], "number");
        assert_eq!(json["value"]["value"], 0.5);
    }

    #[test]
    fn test_error_notification_carries_request() {
        let n = Notification::error(MediaErrorKind::Provider, "boom", Some("play"));
        match n {
            Notification::Error { request, message, .. } => {
                assert_eq!(request.as_deref(), Some("play"));
                assert_eq!(message, "boom");
            }
            _ => panic!("Expected Error variant"),
        }
    }
}
