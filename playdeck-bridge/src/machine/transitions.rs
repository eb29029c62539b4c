//! Transition table
//!
//! Two pure functions: [`next_state`] decides whether an event is accepted in
//! a phase and where it leads, [`apply`] writes the event's effect into the
//! playback record. Neither touches the store.

use playdeck_common::events::MediaEvent;
use playdeck_common::state::clamp_volume;
use playdeck_common::PlaybackState;

use super::MachineState;
use MachineState::*;

/// Target phase for `event` in `state`, or `None` when the event is not valid there
pub fn next_state(state: MachineState, event: &MediaEvent) -> Option<MachineState> {
    let valid_from = |from: &[MachineState]| from.contains(&state);

    match event {
        MediaEvent::Loading { .. } => valid_from(&[Idle, Loading]).then_some(Loading),
        MediaEvent::Loaded { .. } => valid_from(&[Loading]).then_some(Loaded),
        MediaEvent::Abort { .. } => (state != Aborted).then_some(Aborted),
        MediaEvent::CanPlay { .. } => valid_from(&[Loading, Loaded]).then_some(Paused),
        MediaEvent::Autoplay => valid_from(&[Paused, Autoplay, AutoplayFail]).then_some(Autoplay),
        MediaEvent::AutoplayFail { .. } => valid_from(&[Autoplay, Paused]).then_some(AutoplayFail),
        MediaEvent::Play => valid_from(&[Paused, Ended, Autoplay, AutoplayFail]).then_some(Play),
        MediaEvent::PlayFail { .. } => valid_from(&[Play, Autoplay]).then_some(Paused),
        MediaEvent::Playing => {
            valid_from(&[Play, Autoplay, Waiting, Seeking, Paused]).then_some(Playing)
        }
        MediaEvent::TimeUpdate { .. } => {
            valid_from(&[Playing, Play, Paused, Seeking, Waiting, Ended]).then_some(state)
        }
        MediaEvent::Seeking { .. } => {
            valid_from(&[Paused, Play, Playing, Waiting, Ended, Seeking]).then_some(Seeking)
        }
        MediaEvent::Pause { .. } => {
            valid_from(&[Play, Playing, Seeking, Waiting, Autoplay, AutoplayFail]).then_some(Paused)
        }
        MediaEvent::Ended => valid_from(&[Play, Playing, Seeking, Waiting]).then_some(Ended),
        MediaEvent::Waiting => {
            valid_from(&[Paused, Autoplay, Play, Playing, Seeking]).then_some(Waiting)
        }
        MediaEvent::SrcChange { .. } => Some(Idle),
        MediaEvent::Progress { .. } => Some(state),
        _ if event.is_property_change() => Some(state),
        _ => None,
    }
}

/// Write the effect of an accepted `event` into `record`
pub fn apply(record: &mut PlaybackState, event: &MediaEvent) {
    match event {
        MediaEvent::Loading {
            src,
            poster,
            media_type,
            view_type,
        } => {
            record.current_src = src.clone();
            record.current_poster = poster.clone();
            record.media_type = *media_type;
            record.view_type = *view_type;
        }
        MediaEvent::Loaded { src } => record.current_src = src.clone(),
        MediaEvent::Abort { error } => record.error = Some(error.clone()),
        MediaEvent::CanPlay { duration } => {
            record.can_play = true;
            record.duration = *duration;
            record.autoplay_error = None;
        }
        MediaEvent::Autoplay => record.autoplay_error = None,
        MediaEvent::AutoplayFail { error } => record.autoplay_error = Some(error.clone()),
        MediaEvent::Play => {
            record.paused = false;
            record.ended = false;
        }
        MediaEvent::PlayFail { error } => {
            record.paused = true;
            record.error = Some(error.clone());
        }
        MediaEvent::Playing => {
            record.paused = false;
            record.playing = true;
            record.waiting = false;
            record.seeking = false;
            record.ended = false;
            record.started = true;
        }
        MediaEvent::TimeUpdate { current_time } => record.current_time = current_time.max(0.0),
        MediaEvent::Seeking { time } => {
            record.current_time = time.max(0.0);
            record.seeking = true;
        }
        MediaEvent::Pause { seeked_to } => {
            record.paused = true;
            record.playing = false;
            record.seeking = false;
            record.waiting = false;
            if let Some(time) = seeked_to {
                record.current_time = time.max(0.0);
            }
        }
        MediaEvent::Ended => {
            record.paused = true;
            record.playing = false;
            record.ended = true;
            record.seeking = false;
            record.waiting = false;
        }
        MediaEvent::Waiting => record.waiting = true,
        MediaEvent::SrcChange { src } => {
            *record = record.soft_reset();
            record.current_src = src.clone();
        }
        MediaEvent::Progress { buffered, seekable } => {
            record.buffered = buffered.clone();
            record.seekable = seekable.clone();
        }
        MediaEvent::VolumeChange { volume, muted } => {
            record.volume = clamp_volume(*volume);
            record.muted = *muted;
        }
        MediaEvent::Error { error } => record.error = Some(error.clone()),
        MediaEvent::FullscreenSupportChange { supported } => {
            record.can_request_fullscreen = *supported
        }
        MediaEvent::FullscreenChange { fullscreen } => record.fullscreen = *fullscreen,
        MediaEvent::PosterChange { poster } => record.current_poster = poster.clone(),
        MediaEvent::LoopChange { looping } => record.looping = *looping,
        MediaEvent::PlaysinlineChange { playsinline } => record.playsinline = *playsinline,
        MediaEvent::ControlsChange { controls } => record.controls = *controls,
        MediaEvent::AutoplayChange { autoplay } => record.autoplay = *autoplay,
        MediaEvent::IdleChange { idle } => record.idle = *idle,
        MediaEvent::DurationChange { duration } => record.duration = *duration,
        MediaEvent::CanPlayThrough => record.can_play_through = true,
    }
}
