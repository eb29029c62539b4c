//! Media engine adapter contract
//!
//! An adapter wraps one concrete engine. It receives commands through the
//! async methods below and reports what the engine did by emitting
//! [`MediaEvent`]s through the [`MediaEventSink`] it is handed on attach.

use async_trait::async_trait;
use playdeck_common::events::MediaEvent;
use playdeck_common::MediaField;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::controller::ControlMsg;
use crate::error::{Error, Result};
use crate::store::StoreReader;

/// Operations an adapter supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub play: bool,
    pub pause: bool,
    pub volume: bool,
    pub seek: bool,
    pub mute: bool,
    pub fullscreen: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            play: true,
            pause: true,
            volume: true,
            seek: true,
            mute: true,
            fullscreen: true,
        }
    }
}

impl Capabilities {
    /// Required operations the adapter lacks
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.play {
            missing.push("play");
        }
        if !self.pause {
            missing.push("pause");
        }
        missing
    }
}

/// Answer to a media type probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayTypeSupport {
    No,
    Maybe,
    Probably,
}

/// Channel an attached adapter reports engine events through
///
/// Holds the controller's sender weakly: an attached adapter never keeps a
/// controller alive once every scope handle is gone.
#[derive(Clone)]
pub struct MediaEventSink {
    connection_id: Uuid,
    tx: mpsc::WeakUnboundedSender<ControlMsg>,
}

impl MediaEventSink {
    pub(crate) fn new(connection_id: Uuid, tx: mpsc::WeakUnboundedSender<ControlMsg>) -> Self {
        Self { connection_id, tx }
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Report an engine event; returns `false` once the controller is gone
    pub fn emit(&self, event: MediaEvent) -> bool {
        let Some(tx) = self.tx.upgrade() else {
            return false;
        };
        tx.send(ControlMsg::Media {
            connection_id: self.connection_id,
            event,
        })
        .is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.upgrade().map_or(true, |tx| tx.is_closed())
    }
}

impl std::fmt::Debug for MediaEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaEventSink")
            .field("connection_id", &self.connection_id)
            .finish()
    }
}

/// Everything an adapter receives when the controller attaches it
#[derive(Debug, Clone)]
pub struct AdapterContext {
    pub store: StoreReader,
    pub events: MediaEventSink,
}

/// Media engine adapter
#[async_trait]
pub trait MediaAdapter: Send + Sync {
    /// Name used in logs and notifications
    fn name(&self) -> &str {
        "media-adapter"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Fields whose changes the controller re-broadcasts as `*-change`
    fn forwarded_fields(&self) -> Vec<MediaField> {
        MediaField::ALL.to_vec()
    }

    /// Called once per connection, before any command
    fn attach(&self, context: AdapterContext) -> Result<()>;

    /// Called when the connection is torn down
    fn detach(&self) {}

    /// Probe whether the engine can play a MIME type
    fn can_play_type(&self, mime: &str) -> PlayTypeSupport;

    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn set_volume(&self, volume: f64) -> Result<()>;

    async fn set_current_time(&self, time: f64) -> Result<()>;

    async fn set_muted(&self, muted: bool) -> Result<()>;

    async fn enter_fullscreen(&self) -> Result<()> {
        Err(Error::provider("enter-fullscreen", "fullscreen not supported"))
    }

    async fn exit_fullscreen(&self) -> Result<()> {
        Err(Error::provider("exit-fullscreen", "fullscreen not supported"))
    }
}
