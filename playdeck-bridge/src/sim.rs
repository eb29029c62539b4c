//! Simulated media engine
//!
//! An in-memory adapter that behaves like a small media element: it loads a
//! source of known duration, advances time on [`SimulatedAdapter::tick`] and
//! reports everything through the event sink. An optional autoplay policy
//! rejects unmuted playback, which is how browsers usually block autoplay.

use std::sync::Mutex;

use async_trait::async_trait;
use playdeck_common::events::MediaEvent;
use playdeck_common::{MediaType, TimeRanges, ViewType};
use tracing::{debug, info};

use crate::adapter::{AdapterContext, MediaAdapter, MediaEventSink, PlayTypeSupport};
use crate::error::{Error, Result};

/// Whether unmuted playback is allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoplayPolicy {
    #[default]
    Allow,
    /// `play()` fails unless muted
    RequireMuted,
}

#[derive(Debug)]
struct SimState {
    sink: Option<MediaEventSink>,
    src: String,
    duration: f64,
    current_time: f64,
    playing: bool,
    volume: f64,
    muted: bool,
    fullscreen: bool,
    autoplay: bool,
    policy: AutoplayPolicy,
}

/// Adapter over a simulated engine
#[derive(Debug)]
pub struct SimulatedAdapter {
    name: String,
    state: Mutex<SimState>,
}

impl SimulatedAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(SimState {
                sink: None,
                src: String::new(),
                duration: f64::NAN,
                current_time: 0.0,
                playing: false,
                volume: 1.0,
                muted: false,
                fullscreen: false,
                autoplay: false,
                policy: AutoplayPolicy::Allow,
            }),
        }
    }

    /// Declare the `autoplay` attribute, reported on attach
    pub fn with_autoplay(self, autoplay: bool) -> Self {
        self.lock().autoplay = autoplay;
        self
    }

    pub fn with_policy(self, policy: AutoplayPolicy) -> Self {
        self.lock().policy = policy;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Emit while not holding the state lock
    fn emit_all(sink: Option<MediaEventSink>, events: Vec<MediaEvent>) {
        if let Some(sink) = sink {
            for event in events {
                sink.emit(event);
            }
        }
    }

    /// Replace the source and run the load sequence up to `can-play`
    pub fn load(&self, src: &str, duration: f64) {
        let (sink, events) = {
            let mut state = self.lock();
            state.src = src.to_string();
            state.duration = duration;
            state.current_time = 0.0;
            state.playing = false;
            let loaded = TimeRanges::from_ranges(vec![(0.0, duration)]);
            (
                state.sink.clone(),
                vec![
                    MediaEvent::SrcChange { src: src.to_string() },
                    MediaEvent::Loading {
                        src: src.to_string(),
                        poster: String::new(),
                        media_type: MediaType::Video,
                        view_type: ViewType::Video,
                    },
                    MediaEvent::Loaded { src: src.to_string() },
                    MediaEvent::Progress {
                        buffered: loaded.clone(),
                        seekable: loaded,
                    },
                    MediaEvent::CanPlay { duration },
                    MediaEvent::CanPlayThrough,
                ],
            )
        };
        info!(adapter = %self.name, src, duration, "Simulated source loaded");
        Self::emit_all(sink, events);
    }

    /// Advance playback by `seconds`
    pub fn tick(&self, seconds: f64) {
        let (sink, events) = {
            let mut state = self.lock();
            if !state.playing {
                return;
            }
            state.current_time += seconds.max(0.0);
            let mut events = Vec::new();
            if state.duration.is_finite() && state.current_time >= state.duration {
                state.current_time = state.duration;
                state.playing = false;
                events.push(MediaEvent::TimeUpdate {
                    current_time: state.current_time,
                });
                events.push(MediaEvent::Ended);
            } else {
                events.push(MediaEvent::TimeUpdate {
                    current_time: state.current_time,
                });
            }
            (state.sink.clone(), events)
        };
        Self::emit_all(sink, events);
    }

    /// Engine-side stall
    pub fn stall(&self) {
        let sink = self.lock().sink.clone();
        Self::emit_all(sink, vec![MediaEvent::Waiting]);
    }

    pub fn current_time(&self) -> f64 {
        self.lock().current_time
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    pub fn is_muted(&self) -> bool {
        self.lock().muted
    }

    pub fn volume(&self) -> f64 {
        self.lock().volume
    }
}

#[async_trait]
impl MediaAdapter for SimulatedAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn attach(&self, context: AdapterContext) -> Result<()> {
        let (sink, events) = {
            let mut state = self.lock();
            state.sink = Some(context.events.clone());
            let mut events = vec![
                MediaEvent::VolumeChange {
                    volume: state.volume,
                    muted: state.muted,
                },
                MediaEvent::FullscreenSupportChange { supported: true },
            ];
            if state.autoplay {
                events.push(MediaEvent::AutoplayChange { autoplay: true });
            }
            (state.sink.clone(), events)
        };
        debug!(
            adapter = %self.name,
            connection_id = %context.events.connection_id(),
            "Simulated engine attached"
        );
        Self::emit_all(sink, events);
        Ok(())
    }

    fn detach(&self) {
        let mut state = self.lock();
        state.sink = None;
        state.playing = false;
        debug!(adapter = %self.name, "Simulated engine detached");
    }

    fn can_play_type(&self, mime: &str) -> PlayTypeSupport {
        match mime {
            "video/mp4" | "video/webm" | "audio/mpeg" | "audio/ogg" => PlayTypeSupport::Probably,
            m if m.starts_with("video/") || m.starts_with("audio/") => PlayTypeSupport::Maybe,
            _ => PlayTypeSupport::No,
        }
    }

    async fn play(&self) -> Result<()> {
        let sink = {
            let mut state = self.lock();
            if state.src.is_empty() {
                return Err(Error::provider("play", "no source loaded"));
            }
            if state.policy == AutoplayPolicy::RequireMuted && !state.muted {
                return Err(Error::provider("play", "unmuted playback not allowed"));
            }
            state.playing = true;
            if state.duration.is_finite() && state.current_time >= state.duration {
                state.current_time = 0.0;
            }
            state.sink.clone()
        };
        Self::emit_all(sink, vec![MediaEvent::Play, MediaEvent::Playing]);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        let sink = {
            let mut state = self.lock();
            state.playing = false;
            state.sink.clone()
        };
        Self::emit_all(sink, vec![MediaEvent::Pause { seeked_to: None }]);
        Ok(())
    }

    async fn set_volume(&self, volume: f64) -> Result<()> {
        let (sink, muted) = {
            let mut state = self.lock();
            state.volume = volume;
            (state.sink.clone(), state.muted)
        };
        Self::emit_all(sink, vec![MediaEvent::VolumeChange { volume, muted }]);
        Ok(())
    }

    async fn set_current_time(&self, time: f64) -> Result<()> {
        let (sink, events) = {
            let mut state = self.lock();
            let time = if state.duration.is_finite() {
                time.min(state.duration)
            } else {
                time
            };
            state.current_time = time;
            let events = if state.playing {
                vec![
                    MediaEvent::Seeking { time },
                    MediaEvent::Playing,
                    MediaEvent::TimeUpdate { current_time: time },
                ]
            } else {
                vec![MediaEvent::Seeking { time }, MediaEvent::Pause { seeked_to: Some(time) }]
            };
            (state.sink.clone(), events)
        };
        Self::emit_all(sink, events);
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> Result<()> {
        let (sink, volume) = {
            let mut state = self.lock();
            state.muted = muted;
            (state.sink.clone(), state.volume)
        };
        Self::emit_all(sink, vec![MediaEvent::VolumeChange { volume, muted }]);
        Ok(())
    }

    async fn enter_fullscreen(&self) -> Result<()> {
        let sink = {
            let mut state = self.lock();
            state.fullscreen = true;
            state.sink.clone()
        };
        Self::emit_all(sink, vec![MediaEvent::FullscreenChange { fullscreen: true }]);
        Ok(())
    }

    async fn exit_fullscreen(&self) -> Result<()> {
        let sink = {
            let mut state = self.lock();
            state.fullscreen = false;
            state.sink.clone()
        };
        Self::emit_all(sink, vec![MediaEvent::FullscreenChange { fullscreen: false }]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControlMsg;
    use crate::store::MediaStore;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    /// The returned sender keeps the channel open for the weak sink
    fn attached(
        adapter: &SimulatedAdapter,
    ) -> (mpsc::UnboundedReceiver<ControlMsg>, mpsc::UnboundedSender<ControlMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = MediaStore::new();
        adapter
            .attach(AdapterContext {
                store: store.reader(),
                events: MediaEventSink::new(Uuid::new_v4(), tx.downgrade()),
            })
            .unwrap();
        (rx, tx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ControlMsg>) -> Vec<&'static str> {
        let mut names = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            if let ControlMsg::Media { event, .. } = msg {
                names.push(event.name());
            }
        }
        names
    }

    #[tokio::test]
    async fn test_load_sequence() {
        let adapter = SimulatedAdapter::new("sim");
        let (mut rx, _tx) = attached(&adapter);
        drain(&mut rx);

        adapter.load("a.mp4", 10.0);
        assert_eq!(
            drain(&mut rx),
            vec!["src-change", "loading", "loaded", "progress", "can-play", "can-play-through"]
        );
    }

    #[tokio::test]
    async fn test_tick_reaches_end() {
        let adapter = SimulatedAdapter::new("sim");
        let (mut rx, _tx) = attached(&adapter);
        adapter.load("a.mp4", 2.0);
        adapter.play().await.unwrap();
        drain(&mut rx);

        adapter.tick(1.5);
        adapter.tick(1.5);
        assert_eq!(drain(&mut rx), vec!["time-update", "time-update", "ended"]);
        assert!(!adapter.is_playing());
        assert_eq!(adapter.current_time(), 2.0);
    }

    #[tokio::test]
    async fn test_require_muted_policy() {
        let adapter = SimulatedAdapter::new("sim").with_policy(AutoplayPolicy::RequireMuted);
        let (_rx, _tx) = attached(&adapter);
        adapter.load("a.mp4", 5.0);

        assert!(adapter.play().await.is_err());
        adapter.set_muted(true).await.unwrap();
        assert!(adapter.play().await.is_ok());
    }

    #[tokio::test]
    async fn test_seek_while_paused_completes_with_pause() {
        let adapter = SimulatedAdapter::new("sim");
        let (mut rx, _tx) = attached(&adapter);
        adapter.load("a.mp4", 60.0);
        drain(&mut rx);

        adapter.set_current_time(90.0).await.unwrap();
        assert_eq!(drain(&mut rx), vec!["seeking", "pause"]);
        assert_eq!(adapter.current_time(), 60.0);
    }

    #[test]
    fn test_can_play_type() {
        let adapter = SimulatedAdapter::new("sim");
        assert_eq!(adapter.can_play_type("video/mp4"), PlayTypeSupport::Probably);
        assert_eq!(adapter.can_play_type("video/x-custom"), PlayTypeSupport::Maybe);
        assert_eq!(adapter.can_play_type("text/html"), PlayTypeSupport::No);
    }
}
