//! Request gateway
//!
//! Turns [`MediaRequest`]s into queued adapter calls keyed by the state field
//! they affect, or handles them inside the controller (controls visibility,
//! idle tracking). Values are sanitised here, not by the caller.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use playdeck_common::events::{MediaEvent, MediaRequest, Notification};
use playdeck_common::state::clamp_volume;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use super::connection::AdapterSlot;
use super::{ControlMsg, MediaController, RequestEnvelope};
use crate::adapter::MediaAdapter;
use crate::error::{Error, Result};

type AdapterCall = Box<dyn FnOnce(Arc<dyn MediaAdapter>) -> BoxFuture<'static, Result<()>> + Send>;

impl MediaController {
    pub(super) async fn handle_request(&mut self, envelope: RequestEnvelope) {
        let RequestEnvelope {
            request,
            origin,
            responder,
        } = envelope;
        debug!(
            request = %request,
            origin = origin.as_ref().map(|o| o.source.as_str()).unwrap_or("-"),
            "Request received"
        );

        let call: AdapterCall = match request {
            MediaRequest::Play => {
                self.cancel_autoplay();
                adapter_call(|adapter| async move { adapter.play().await }.boxed())
            }
            MediaRequest::Pause => {
                self.cancel_autoplay();
                adapter_call(|adapter| async move { adapter.pause().await }.boxed())
            }
            MediaRequest::Mute => {
                adapter_call(|adapter| async move { adapter.set_muted(true).await }.boxed())
            }
            MediaRequest::Unmute => {
                adapter_call(|adapter| async move { adapter.set_muted(false).await }.boxed())
            }
            MediaRequest::Seek(time) => {
                let time = sanitize_time(time);
                adapter_call(move |adapter| {
                    async move { adapter.set_current_time(time).await }.boxed()
                })
            }
            MediaRequest::Seeking(time) => {
                let time = sanitize_time(time);
                let tx = self.tx.clone();
                adapter_call(move |_| {
                    async move {
                        let event = ControlMsg::LocalEvent(MediaEvent::Seeking { time });
                        tx.upgrade()
                            .and_then(|tx| tx.send(event).ok())
                            .ok_or(Error::ControllerClosed)
                    }
                    .boxed()
                })
            }
            MediaRequest::VolumeChange(volume) => {
                let volume = clamp_volume(volume);
                adapter_call(move |adapter| async move { adapter.set_volume(volume).await }.boxed())
            }
            MediaRequest::EnterFullscreen => {
                adapter_call(|adapter| async move { adapter.enter_fullscreen().await }.boxed())
            }
            MediaRequest::ExitFullscreen => {
                adapter_call(|adapter| async move { adapter.exit_fullscreen().await }.boxed())
            }
            MediaRequest::ShowControls | MediaRequest::HideControls => {
                let visible = matches!(request, MediaRequest::ShowControls);
                if let Some(visible) = self.controls.request(visible).await {
                    self.notifier.send(Notification::controls_change(visible));
                }
                respond(responder, Ok(()));
                return;
            }
            MediaRequest::PauseIdleTracking => {
                let idle = self.idle.pause();
                self.apply_local(MediaEvent::IdleChange { idle });
                respond(responder, Ok(()));
                return;
            }
            MediaRequest::ResumeIdleTracking => {
                self.idle.resume();
                respond(responder, Ok(()));
                return;
            }
        };

        let Some(key) = request.queue_key() else {
            respond(responder, Ok(()));
            return;
        };

        let thunk = request_thunk(
            self.adapter.clone(),
            self.tx.clone(),
            request.name(),
            responder,
            call,
        );
        match self.queue.queue(key, thunk).await {
            Ok(dispatch) => trace!(key, ?dispatch, "Request dispatched"),
            // Already reported through RequestFailed
            Err(err) => trace!(key, error = %err, "Request failed"),
        }
    }
}

fn adapter_call<F>(call: F) -> AdapterCall
where
    F: FnOnce(Arc<dyn MediaAdapter>) -> BoxFuture<'static, Result<()>> + Send + 'static,
{
    Box::new(call)
}

/// Queue thunk: resolve the adapter when it runs, report the outcome
fn request_thunk(
    adapter: AdapterSlot,
    tx: mpsc::WeakUnboundedSender<ControlMsg>,
    request: &'static str,
    responder: Option<oneshot::Sender<Result<()>>>,
    call: AdapterCall,
) -> impl FnOnce() -> BoxFuture<'static, Result<()>> + Send + 'static {
    move || {
        async move {
            let result = match adapter.get() {
                Some(adapter) => call(adapter).await,
                None => Err(Error::NotConnected),
            };
            if let Err(err) = &result {
                if let Some(tx) = tx.upgrade() {
                    let _ = tx.send(ControlMsg::RequestFailed {
                        request: request.to_string(),
                        error: err.clone(),
                    });
                }
            }
            respond(responder, result.clone());
            result
        }
        .boxed()
    }
}

pub(super) fn respond(responder: Option<oneshot::Sender<Result<()>>>, result: Result<()>) {
    if let Some(responder) = responder {
        // Caller may have dropped its PendingRequest
        let _ = responder.send(result);
    }
}

fn sanitize_time(time: f64) -> f64 {
    if time.is_nan() {
        0.0
    } else {
        time.max(0.0)
    }
}
