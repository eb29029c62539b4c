//! Adapter that records calls instead of driving an engine

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use playdeck_bridge::{
    AdapterContext, Capabilities, Error, MediaAdapter, MediaEventSink, PlayTypeSupport, Result,
};
use playdeck_common::events::MediaEvent;
use playdeck_common::MediaField;

#[derive(Default)]
struct Recorded {
    calls: Vec<String>,
    failures: HashMap<String, String>,
    sink: Option<MediaEventSink>,
    attaches: usize,
    detaches: usize,
}

pub struct RecordingAdapter {
    name: String,
    capabilities: Capabilities,
    forwarded: Option<Vec<MediaField>>,
    inner: Mutex<Recorded>,
}

impl RecordingAdapter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            capabilities: Capabilities::default(),
            forwarded: None,
            inner: Mutex::new(Recorded::default()),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_forwarded(mut self, fields: Vec<MediaField>) -> Self {
        self.forwarded = Some(fields);
        self
    }

    /// Make `operation` (e.g. "play", "set-volume") fail with `message`
    pub fn fail(&self, operation: &str, message: &str) {
        self.inner
            .lock()
            .unwrap()
            .failures
            .insert(operation.to_string(), message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn attaches(&self) -> usize {
        self.inner.lock().unwrap().attaches
    }

    pub fn detaches(&self) -> usize {
        self.inner.lock().unwrap().detaches
    }

    /// Sink from the latest attach, kept alive past detach if cloned
    pub fn sink(&self) -> Option<MediaEventSink> {
        self.inner.lock().unwrap().sink.clone()
    }

    /// Emit engine events through the sink handed over on attach
    pub fn emit(&self, events: impl IntoIterator<Item = MediaEvent>) -> bool {
        let Some(sink) = self.inner.lock().unwrap().sink.clone() else {
            return false;
        };
        events.into_iter().all(|event| sink.emit(event))
    }

    /// The usual load sequence ending in `can-play`
    pub fn load(&self, src: &str, duration: f64) -> bool {
        self.emit([
            MediaEvent::SrcChange { src: src.to_string() },
            MediaEvent::Loading {
                src: src.to_string(),
                poster: String::new(),
                media_type: playdeck_common::MediaType::Video,
                view_type: playdeck_common::ViewType::Video,
            },
            MediaEvent::Loaded { src: src.to_string() },
            MediaEvent::CanPlay { duration },
        ])
    }

    fn record(&self, call: String, operation: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);
        match inner.failures.get(operation) {
            Some(message) => Err(Error::provider(operation, message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MediaAdapter for RecordingAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn forwarded_fields(&self) -> Vec<MediaField> {
        self.forwarded.clone().unwrap_or_else(|| MediaField::ALL.to_vec())
    }

    fn attach(&self, context: AdapterContext) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(message) = inner.failures.get("attach") {
            return Err(Error::provider("attach", message.clone()));
        }
        inner.sink = Some(context.events);
        inner.attaches += 1;
        Ok(())
    }

    fn detach(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.sink = None;
        inner.detaches += 1;
    }

    fn can_play_type(&self, mime: &str) -> PlayTypeSupport {
        if mime.starts_with("video/") {
            PlayTypeSupport::Maybe
        } else {
            PlayTypeSupport::No
        }
    }

    async fn play(&self) -> Result<()> {
        self.record("play".to_string(), "play")
    }

    async fn pause(&self) -> Result<()> {
        self.record("pause".to_string(), "pause")
    }

    async fn set_volume(&self, volume: f64) -> Result<()> {
        self.record(format!("set-volume:{}", volume), "set-volume")
    }

    async fn set_current_time(&self, time: f64) -> Result<()> {
        self.record(format!("set-current-time:{}", time), "set-current-time")
    }

    async fn set_muted(&self, muted: bool) -> Result<()> {
        self.record(format!("set-muted:{}", muted), "set-muted")
    }

    async fn enter_fullscreen(&self) -> Result<()> {
        self.record("enter-fullscreen".to_string(), "enter-fullscreen")
    }

    async fn exit_fullscreen(&self) -> Result<()> {
        self.record("exit-fullscreen".to_string(), "exit-fullscreen")
    }
}
