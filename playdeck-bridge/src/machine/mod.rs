//! Playback state machine
//!
//! Authoritative model of playback phases and the single writer of the
//! [`MediaStore`]. Adapter events and controller decisions arrive as
//! [`MediaEvent`]s; an event valid in the current phase moves the machine and
//! commits its effect to the store in one step, an invalid one is dropped.

mod transitions;

pub use transitions::{apply, next_state};

use playdeck_common::events::MediaEvent;
use playdeck_common::MediaField;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::store::{MediaStore, StoreReader};

/// Playback phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MachineState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Paused,
    Autoplay,
    AutoplayFail,
    Play,
    Playing,
    Seeking,
    Waiting,
    Ended,
    Aborted,
}

impl MachineState {
    pub const ALL: [MachineState; 12] = [
        MachineState::Idle,
        MachineState::Loading,
        MachineState::Loaded,
        MachineState::Paused,
        MachineState::Autoplay,
        MachineState::AutoplayFail,
        MachineState::Play,
        MachineState::Playing,
        MachineState::Seeking,
        MachineState::Waiting,
        MachineState::Ended,
        MachineState::Aborted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MachineState::Idle => "idle",
            MachineState::Loading => "loading",
            MachineState::Loaded => "loaded",
            MachineState::Paused => "paused",
            MachineState::Autoplay => "autoplay",
            MachineState::AutoplayFail => "autoplay-fail",
            MachineState::Play => "play",
            MachineState::Playing => "playing",
            MachineState::Seeking => "seeking",
            MachineState::Waiting => "waiting",
            MachineState::Ended => "ended",
            MachineState::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for MachineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an accepted event
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: MachineState,
    pub to: MachineState,
    /// Store fields the event changed
    pub changed: Vec<MediaField>,
}

impl Transition {
    pub fn changed_phase(&self) -> bool {
        self.from != self.to
    }
}

/// Phase tracker owning the writable store
#[derive(Debug)]
pub struct PlaybackMachine {
    state: MachineState,
    store: MediaStore,
}

impl PlaybackMachine {
    pub fn new() -> Self {
        Self::with_store(MediaStore::new())
    }

    pub fn with_store(store: MediaStore) -> Self {
        Self {
            state: MachineState::Idle,
            store,
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn reader(&self) -> StoreReader {
        self.store.reader()
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    /// Feed one event; `None` when it is not valid in the current phase
    pub fn send(&mut self, event: &MediaEvent) -> Option<Transition> {
        let from = self.state;
        let Some(to) = next_state(from, event) else {
            debug!(state = %from, event = %event, "Ignoring event not valid in current state");
            return None;
        };

        self.state = to;
        let changed = self.store.commit(|record| apply(record, event));

        if from != to {
            debug!(from = %from, to = %to, event = %event, "Playback state transition");
        } else {
            trace!(state = %to, event = %event, changed = changed.len(), "Event applied");
        }

        Some(Transition { from, to, changed })
    }

    /// Engine disconnected: hard-reset the store and return to idle
    pub fn reset(&mut self) -> Vec<MediaField> {
        if self.state != MachineState::Idle {
            debug!(from = %self.state, "Playback machine reset");
        }
        self.state = MachineState::Idle;
        self.store.hard_reset()
    }
}

impl Default for PlaybackMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playdeck_common::{FieldValue, MediaError, MediaErrorKind, MediaType, ViewType};
    use std::sync::{Arc, Mutex};

    fn loaded_machine() -> PlaybackMachine {
        let mut machine = PlaybackMachine::new();
        machine.send(&MediaEvent::Loading {
            src: "movie.mp4".into(),
            poster: "poster.jpg".into(),
            media_type: MediaType::Video,
            view_type: ViewType::Video,
        });
        machine.send(&MediaEvent::CanPlay { duration: 120.0 });
        machine
    }

    #[test]
    fn test_starts_idle() {
        let machine = PlaybackMachine::new();
        assert_eq!(machine.state(), MachineState::Idle);
        assert!(machine.store().snapshot().paused);
    }

    #[test]
    fn test_load_to_paused() {
        let machine = loaded_machine();
        assert_eq!(machine.state(), MachineState::Paused);
        let state = machine.store().snapshot();
        assert!(state.can_play);
        assert_eq!(state.duration, 120.0);
        assert_eq!(state.current_src, "movie.mp4");
        assert!(state.is_video_view());
    }

    #[test]
    fn test_pause_after_seek_commits_time() {
        let mut machine = loaded_machine();
        machine.send(&MediaEvent::Play);
        machine.send(&MediaEvent::Playing);
        assert_eq!(machine.state(), MachineState::Playing);

        let transition = machine.send(&MediaEvent::Pause { seeked_to: Some(42.0) }).unwrap();
        assert_eq!(transition.to, MachineState::Paused);

        let state = machine.store().snapshot();
        assert!(state.paused);
        assert_eq!(state.current_time, 42.0);
        assert!(!state.playing);
        assert!(!state.seeking);
    }

    #[test]
    fn test_src_change_soft_resets() {
        let mut machine = loaded_machine();
        machine.send(&MediaEvent::VolumeChange { volume: 0.4, muted: true });
        machine.send(&MediaEvent::AutoplayChange { autoplay: true });
        machine.send(&MediaEvent::LoopChange { looping: true });

        machine.send(&MediaEvent::SrcChange { src: "next.mp4".into() });
        assert_eq!(machine.state(), MachineState::Idle);

        let state = machine.store().snapshot();
        assert_eq!(state.current_src, "next.mp4");
        assert!(state.duration.is_nan());
        assert!(!state.can_play);
        assert!(!state.muted);
        // Preserved set
        assert_eq!(state.volume, 0.4);
        assert!(state.autoplay);
        assert!(state.looping);
        assert_eq!(state.view_type, ViewType::Video);
        assert_eq!(state.current_poster, "poster.jpg");
    }

    #[test]
    fn test_invalid_event_leaves_store_untouched() {
        let mut machine = PlaybackMachine::new();
        let seen = Arc::new(Mutex::new(0));
        let counter = seen.clone();
        let _sub = machine.reader().subscribe_changes(MediaField::Playing, move |_| {
            *counter.lock().unwrap() += 1;
        });

        assert!(machine.send(&MediaEvent::Playing).is_none());
        assert_eq!(machine.state(), MachineState::Idle);
        assert_eq!(machine.store().get(MediaField::Playing), FieldValue::Bool(false));
        assert_eq!(*seen.lock().unwrap(), 0);
    }

    #[test]
    fn test_abort_then_only_src_change_recovers() {
        let mut machine = loaded_machine();
        let error = MediaError::new(MediaErrorKind::Aborted, "user aborted");
        machine.send(&MediaEvent::Abort { error: error.clone() });
        assert_eq!(machine.state(), MachineState::Aborted);
        assert_eq!(machine.store().snapshot().error, Some(error));

        assert!(machine.send(&MediaEvent::Play).is_none());
        assert!(machine.send(&MediaEvent::SrcChange { src: "retry.mp4".into() }).is_some());
        assert_eq!(machine.state(), MachineState::Idle);
    }

    #[test]
    fn test_autoplay_fail_records_error_and_recovers() {
        let mut machine = loaded_machine();
        machine.send(&MediaEvent::Autoplay);
        machine.send(&MediaEvent::AutoplayFail {
            error: MediaError::autoplay("blocked"),
        });
        assert_eq!(machine.state(), MachineState::AutoplayFail);
        assert!(machine.store().snapshot().autoplay_error.is_some());

        machine.send(&MediaEvent::Play);
        machine.send(&MediaEvent::Playing);
        assert_eq!(machine.state(), MachineState::Playing);
    }

    #[test]
    fn test_time_update_in_paused_keeps_phase() {
        let mut machine = loaded_machine();
        let transition = machine.send(&MediaEvent::TimeUpdate { current_time: 3.0 }).unwrap();
        assert!(!transition.changed_phase());
        assert_eq!(transition.changed, vec![MediaField::CurrentTime]);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut machine = loaded_machine();
        machine.send(&MediaEvent::Play);
        let changed = machine.reset();
        assert!(changed.contains(&MediaField::CanPlay));
        assert_eq!(machine.state(), MachineState::Idle);
        assert!(machine.store().snapshot().diff(&Default::default()).is_empty());
    }

    #[test]
    fn test_state_display_and_serde() {
        assert_eq!(MachineState::AutoplayFail.to_string(), "autoplay-fail");
        let json = serde_json::to_string(&MachineState::AutoplayFail).unwrap();
        assert_eq!(json, "\"autoplay-fail\"");
    }
}
