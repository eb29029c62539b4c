//! End-to-end sessions against the simulated engine
//!
//! Controls hold only a RemoteControl and a StoreReader, the way leaf UI
//! components would.

mod helpers;

use std::sync::{Arc, Mutex};

use helpers::{scope, NotificationLog};
use playdeck_bridge::sim::SimulatedAdapter;
use playdeck_bridge::{Error, MachineState, RemoteControl};
use playdeck_common::{FieldValue, MediaField};

#[tokio::test]
async fn test_buffered_remote_calls_survive_until_engine_connects() {
    let remote = RemoteControl::new();
    let volume = remote.change_volume(0.3);
    let mute = remote.mute();
    assert_eq!(remote.buffered(), 2);

    let scope = scope();
    remote.attach(scope.clone());
    assert_eq!(remote.buffered(), 0);
    scope.settle().await.unwrap();

    let adapter = Arc::new(SimulatedAdapter::new("sim"));
    let _connection = scope.connect(adapter.clone()).unwrap();

    assert_eq!(volume.wait().await, Ok(()));
    assert_eq!(mute.wait().await, Ok(()));
    scope.settle().await.unwrap();

    assert_eq!(adapter.volume(), 0.3);
    assert!(adapter.is_muted());
    let state = scope.store().snapshot();
    assert_eq!(state.volume, 0.3);
    assert!(state.muted);
}

#[tokio::test]
async fn test_full_playback_session() {
    let scope = scope();
    let mut log = NotificationLog::new(&scope);
    let remote = RemoteControl::with_scope(scope.clone());
    let adapter = Arc::new(SimulatedAdapter::new("sim"));
    let connection = scope.connect(adapter.clone()).unwrap();

    adapter.load("movie.mp4", 4.0);
    scope.settle().await.unwrap();
    assert_eq!(scope.machine_state(), MachineState::Paused);
    assert_eq!(scope.store().snapshot().buffered_amount(), 4.0);

    remote.play().wait().await.unwrap();
    scope.settle().await.unwrap();
    assert_eq!(scope.machine_state(), MachineState::Playing);

    adapter.tick(1.0);
    adapter.tick(1.0);
    scope.settle().await.unwrap();
    assert_eq!(scope.store().snapshot().current_time, 2.0);

    remote.seek(3.0).wait().await.unwrap();
    scope.settle().await.unwrap();
    assert_eq!(scope.machine_state(), MachineState::Playing);
    assert_eq!(scope.store().snapshot().current_time, 3.0);

    adapter.tick(2.0);
    scope.settle().await.unwrap();
    assert_eq!(scope.machine_state(), MachineState::Ended);
    let state = scope.store().snapshot();
    assert!(state.ended);
    assert!(state.paused);
    assert_eq!(state.current_time, 4.0);

    // Replay from the end
    remote.play().wait().await.unwrap();
    scope.settle().await.unwrap();
    assert_eq!(scope.machine_state(), MachineState::Playing);
    assert!(!scope.store().snapshot().ended);

    remote.pause().wait().await.unwrap();
    scope.settle().await.unwrap();
    assert_eq!(scope.machine_state(), MachineState::Paused);

    assert!(log.changes_of(MediaField::CurrentTime) >= 3);
    assert!(log.changes_of(MediaField::Ended) >= 2);

    connection.disconnect();
    scope.settle().await.unwrap();
    assert_eq!(scope.machine_state(), MachineState::Idle);
    assert_eq!(log.count("adapter-disconnected"), 1);
}

#[tokio::test]
async fn test_store_subscriber_sees_changes_in_order() {
    let scope = scope();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _subscription = scope.store().subscribe(MediaField::Paused, move |value| {
        if let FieldValue::Bool(paused) = value {
            sink.lock().unwrap().push(*paused);
        }
    });

    let adapter = Arc::new(SimulatedAdapter::new("sim"));
    let _connection = scope.connect(adapter.clone()).unwrap();
    adapter.load("a.mp4", 10.0);
    scope.settle().await.unwrap();

    let remote = RemoteControl::with_scope(scope.clone());
    remote.play().wait().await.unwrap();
    remote.pause().wait().await.unwrap();
    scope.settle().await.unwrap();

    // Hot subscription: initial value first
    assert_eq!(*seen.lock().unwrap(), vec![true, false, true]);
}

#[tokio::test]
async fn test_fullscreen_round_trip() {
    let scope = scope();
    let remote = RemoteControl::with_scope(scope.clone());
    let adapter = Arc::new(SimulatedAdapter::new("sim"));
    let _connection = scope.connect(adapter.clone()).unwrap();
    scope.settle().await.unwrap();
    assert!(scope.store().snapshot().can_request_fullscreen);

    remote.enter_fullscreen().wait().await.unwrap();
    scope.settle().await.unwrap();
    assert!(scope.store().snapshot().fullscreen);

    remote.exit_fullscreen().wait().await.unwrap();
    scope.settle().await.unwrap();
    assert!(!scope.store().snapshot().fullscreen);
}

#[tokio::test]
async fn test_play_without_source_fails_to_caller() {
    let scope = scope();
    let remote = RemoteControl::with_scope(scope.clone());
    let adapter = Arc::new(SimulatedAdapter::new("sim"));
    let _connection = scope.connect(adapter.clone()).unwrap();

    let result = remote.play().wait().await;
    assert!(matches!(result, Err(Error::ProviderOperation { .. })));
    scope.settle().await.unwrap();
    assert!(scope.store().snapshot().error.is_some());
}

#[tokio::test]
async fn test_detached_remote_buffers_again() {
    let scope = scope();
    let remote = RemoteControl::with_scope(scope.clone());
    assert!(remote.detach().is_some());

    let pending = remote.show_controls();
    assert_eq!(remote.buffered(), 1);

    remote.attach(scope.clone());
    assert_eq!(pending.wait().await, Ok(()));
}
