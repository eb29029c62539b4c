//! Remote-control facade
//!
//! What leaf controls hold: one verb per request. Verbs carry no logic
//! (clamping happens in the controller). Calls made before the facade is
//! attached to a scope are buffered and sent, in order, on `attach`.

use std::sync::Mutex;

use playdeck_common::events::{MediaRequest, RequestOrigin};
use tokio::sync::oneshot;
use tracing::debug;

use crate::controller::RequestEnvelope;
use crate::scope::{PendingRequest, PlayerScope};

#[derive(Default)]
struct RemoteInner {
    scope: Option<PlayerScope>,
    buffered: Vec<RequestEnvelope>,
}

/// Request emitter for a control
#[derive(Default)]
pub struct RemoteControl {
    inner: Mutex<RemoteInner>,
}

impl RemoteControl {
    /// Detached facade; calls are buffered until [`attach`](Self::attach)
    pub fn new() -> Self {
        Self::default()
    }

    /// Facade already bound to `scope`
    pub fn with_scope(scope: PlayerScope) -> Self {
        let remote = Self::new();
        remote.attach(scope);
        remote
    }

    fn inner(&self) -> std::sync::MutexGuard<'_, RemoteInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Bind to a scope and flush buffered calls
    pub fn attach(&self, scope: PlayerScope) {
        let mut inner = self.inner();
        let buffered = std::mem::take(&mut inner.buffered);
        if !buffered.is_empty() {
            debug!(count = buffered.len(), "Flushing buffered remote requests");
        }
        for envelope in buffered {
            forward(&scope, envelope);
        }
        inner.scope = Some(scope);
    }

    /// Unbind; later calls are buffered again
    pub fn detach(&self) -> Option<PlayerScope> {
        self.inner().scope.take()
    }

    pub fn is_attached(&self) -> bool {
        self.inner().scope.is_some()
    }

    /// Number of calls waiting for a scope
    pub fn buffered(&self) -> usize {
        self.inner().buffered.len()
    }

    /// Send any request with optional provenance
    pub fn dispatch(&self, request: MediaRequest, origin: Option<RequestOrigin>) -> PendingRequest {
        let (responder, rx) = oneshot::channel();
        let envelope = RequestEnvelope {
            request,
            origin,
            responder: Some(responder),
        };

        let mut guard = self.inner();
        let inner = &mut *guard;
        match &inner.scope {
            Some(scope) => forward(scope, envelope),
            None => inner.buffered.push(envelope),
        }
        PendingRequest::new(rx)
    }

    pub fn play(&self) -> PendingRequest {
        self.dispatch(MediaRequest::Play, None)
    }

    pub fn pause(&self) -> PendingRequest {
        self.dispatch(MediaRequest::Pause, None)
    }

    pub fn mute(&self) -> PendingRequest {
        self.dispatch(MediaRequest::Mute, None)
    }

    pub fn unmute(&self) -> PendingRequest {
        self.dispatch(MediaRequest::Unmute, None)
    }

    pub fn seek(&self, time: f64) -> PendingRequest {
        self.dispatch(MediaRequest::Seek(time), None)
    }

    /// Scrubbing preview; the engine is not seeked
    pub fn seeking(&self, time: f64) -> PendingRequest {
        self.dispatch(MediaRequest::Seeking(time), None)
    }

    pub fn change_volume(&self, volume: f64) -> PendingRequest {
        self.dispatch(MediaRequest::VolumeChange(volume), None)
    }

    pub fn enter_fullscreen(&self) -> PendingRequest {
        self.dispatch(MediaRequest::EnterFullscreen, None)
    }

    pub fn exit_fullscreen(&self) -> PendingRequest {
        self.dispatch(MediaRequest::ExitFullscreen, None)
    }

    pub fn show_controls(&self) -> PendingRequest {
        self.dispatch(MediaRequest::ShowControls, None)
    }

    pub fn hide_controls(&self) -> PendingRequest {
        self.dispatch(MediaRequest::HideControls, None)
    }

    pub fn resume_idle_tracking(&self) -> PendingRequest {
        self.dispatch(MediaRequest::ResumeIdleTracking, None)
    }

    pub fn pause_idle_tracking(&self) -> PendingRequest {
        self.dispatch(MediaRequest::PauseIdleTracking, None)
    }
}

impl std::fmt::Debug for RemoteControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner();
        f.debug_struct("RemoteControl")
            .field("attached", &inner.scope.is_some())
            .field("buffered", &inner.buffered.len())
            .finish()
    }
}

fn forward(scope: &PlayerScope, envelope: RequestEnvelope) {
    let request = envelope.request.name();
    if let Err(err) = scope.send_envelope(envelope) {
        debug!(request, error = %err, "Remote request not delivered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use crate::error::Error;

    #[test]
    fn test_calls_buffered_until_attached() {
        let remote = RemoteControl::new();
        let _a = remote.play();
        let _b = remote.change_volume(0.5);
        assert_eq!(remote.buffered(), 2);
        assert!(!remote.is_attached());
    }

    #[tokio::test]
    async fn test_attach_flushes_buffer() {
        let remote = RemoteControl::new();
        let pending = remote.show_controls();

        remote.attach(PlayerScope::new(ControllerConfig::default()));
        assert_eq!(remote.buffered(), 0);
        // Controller answers show-controls without an adapter
        assert_eq!(pending.wait().await, Ok(()));
    }

    #[tokio::test]
    async fn test_request_to_closed_controller_fails() {
        let scope = PlayerScope::new(ControllerConfig::default());
        scope.shutdown().await.unwrap();
        let remote = RemoteControl::with_scope(scope);

        let result = remote.hide_controls().wait().await;
        assert_eq!(result, Err(Error::ControllerClosed));
    }
}
