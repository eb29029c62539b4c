//! Media controller
//!
//! The sole intermediary between one connected adapter and the control
//! tree. It runs as a single tokio task draining one FIFO channel of
//! [`ControlMsg`]s; every store mutation happens inside that task, in
//! message order.
//!
//! Connection lifecycle:
//! 1. tear down any previous connection
//! 2. attach the adapter (read-only store view + event sink)
//! 3. forward the adapter's declared fields as `*-change` notifications
//! 4. switch the request queue to serving, flushing deferred requests
//!
//! Disconnect reverses all of it, hard-resets the store and switches the
//! queue back to deferred.

mod autoplay;
pub mod connection;
mod controls;
mod gateway;
mod idle;
pub mod timer;

pub use connection::{AdapterConnection, AdapterSlot, ConnectEvent, DisconnectHook};

use futures::future::FutureExt;
use playdeck_common::events::{MediaEvent, MediaRequest, Notification, RequestOrigin, UserActivity};
use playdeck_common::time;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::adapter::{AdapterContext, MediaEventSink};
use crate::config::ControllerConfig;
use crate::error::{Error, Result};
use crate::machine::{MachineState, PlaybackMachine, Transition};
use crate::notifier::Notifier;
use crate::request_queue::{FlushReport, RequestQueue};

use autoplay::{AttemptOutcome, AutoplayRetry};
use connection::ActiveConnection;
use controls::ControlsVisibility;
use idle::IdleTracker;

/// Request with provenance and an optional reply channel
pub struct RequestEnvelope {
    pub request: MediaRequest,
    pub origin: Option<RequestOrigin>,
    pub responder: Option<oneshot::Sender<Result<()>>>,
}

/// Messages processed by the controller loop
pub(crate) enum ControlMsg {
    Request(RequestEnvelope),
    Connect(ConnectEvent),
    /// Engine event from an adapter connection
    Media { connection_id: Uuid, event: MediaEvent },
    /// Event produced by the controller itself
    LocalEvent(MediaEvent),
    Disconnect { connection_id: Uuid },
    Activity(UserActivity),
    IdleTimeout { generation: u64 },
    AutoplayRetry { run: u64, attempt: u32 },
    AutoplayResult { run: u64, attempt: u32, result: Result<()> },
    RequestFailed { request: String, error: Error },
    /// Replies with the number of messages processed before it
    Barrier { reply: oneshot::Sender<u64> },
    Shutdown { reply: oneshot::Sender<()> },
}

impl ControlMsg {
    fn kind(&self) -> &'static str {
        match self {
            ControlMsg::Request(_) => "request",
            ControlMsg::Connect(_) => "connect",
            ControlMsg::Media { .. } => "media",
            ControlMsg::LocalEvent(_) => "local-event",
            ControlMsg::Disconnect { .. } => "disconnect",
            ControlMsg::Activity(_) => "activity",
            ControlMsg::IdleTimeout { .. } => "idle-timeout",
            ControlMsg::AutoplayRetry { .. } => "autoplay-retry",
            ControlMsg::AutoplayResult { .. } => "autoplay-result",
            ControlMsg::RequestFailed { .. } => "request-failed",
            ControlMsg::Barrier { .. } => "barrier",
            ControlMsg::Shutdown { .. } => "shutdown",
        }
    }
}

impl std::fmt::Debug for ControlMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}

/// Controller state owned by the loop task
pub(crate) struct MediaController {
    rx: mpsc::UnboundedReceiver<ControlMsg>,
    tx: mpsc::WeakUnboundedSender<ControlMsg>,
    machine: PlaybackMachine,
    queue: RequestQueue,
    adapter: AdapterSlot,
    notifier: Notifier,
    connection: Option<ActiveConnection>,
    idle: IdleTracker,
    controls: ControlsVisibility,
    autoplay: AutoplayRetry,
    state_tx: watch::Sender<MachineState>,
    processed: u64,
}

impl MediaController {
    pub fn new(
        config: &ControllerConfig,
        rx: mpsc::UnboundedReceiver<ControlMsg>,
        tx: mpsc::WeakUnboundedSender<ControlMsg>,
        machine: PlaybackMachine,
        adapter: AdapterSlot,
        notifier: Notifier,
        state_tx: watch::Sender<MachineState>,
    ) -> Self {
        Self {
            idle: IdleTracker::new(config.idle_timeout, tx.clone()),
            autoplay: AutoplayRetry::new(
                config.autoplay_max_attempts,
                config.autoplay_retry_delay,
                tx.clone(),
            ),
            controls: ControlsVisibility::new(config.settle_ticks),
            queue: RequestQueue::new(),
            connection: None,
            processed: 0,
            rx,
            tx,
            machine,
            adapter,
            notifier,
            state_tx,
        }
    }

    /// Drain the channel until shutdown or until every sender is gone
    pub async fn run(mut self) {
        info!("Media controller started");

        while let Some(msg) = self.rx.recv().await {
            trace!(kind = msg.kind(), "Controller message");
            let stop = self.handle(msg).await;
            self.processed += 1;

            let state = self.machine.state();
            self.state_tx.send_if_modified(|current| {
                let changed = *current != state;
                *current = state;
                changed
            });

            if stop {
                break;
            }
        }

        self.close();
        info!(processed = self.processed, "Media controller stopped");
    }

    /// Returns true when the loop must stop
    async fn handle(&mut self, msg: ControlMsg) -> bool {
        match msg {
            ControlMsg::Request(envelope) => self.handle_request(envelope).await,
            ControlMsg::Connect(event) => self.handle_connect(event).await,
            ControlMsg::Media { connection_id, event } => {
                if self.is_active(connection_id) {
                    self.handle_media_event(event).await;
                } else {
                    trace!(
                        connection_id = %connection_id,
                        event = %event,
                        "Dropping event from stale connection"
                    );
                }
            }
            ControlMsg::LocalEvent(event) => {
                self.apply_local(event);
            }
            ControlMsg::Disconnect { connection_id } => {
                if self.is_active(connection_id) {
                    self.teardown();
                } else {
                    trace!(
                        connection_id = %connection_id,
                        "Ignoring disconnect of stale connection"
                    );
                }
            }
            ControlMsg::Activity(activity) => {
                if let Some(idle) = self.idle.activity() {
                    trace!(?activity, "User activity");
                    self.apply_local(MediaEvent::IdleChange { idle });
                }
            }
            ControlMsg::IdleTimeout { generation } => {
                if self.idle.on_timeout(generation) {
                    debug!("User idle");
                    self.apply_local(MediaEvent::IdleChange { idle: true });
                }
            }
            ControlMsg::AutoplayRetry { run, attempt } => {
                if self.autoplay.is_current(run) {
                    self.attempt_autoplay(run, attempt).await;
                }
            }
            ControlMsg::AutoplayResult { run, attempt, result } => {
                self.handle_autoplay_result(run, attempt, result);
            }
            ControlMsg::RequestFailed { request, error } => {
                self.report_failure(&request, &error);
            }
            ControlMsg::Barrier { reply } => {
                let _ = reply.send(self.processed);
            }
            ControlMsg::Shutdown { reply } => {
                self.close();
                let _ = reply.send(());
                return true;
            }
        }
        false
    }

    fn is_active(&self, connection_id: Uuid) -> bool {
        self.connection.as_ref().is_some_and(|c| c.id == connection_id)
    }

    /// Feed an event to the machine without any controller side effects
    fn apply_local(&mut self, event: MediaEvent) -> Option<Transition> {
        self.machine.send(&event)
    }

    async fn handle_connect(&mut self, event: ConnectEvent) {
        let ConnectEvent { id, adapter, hook } = event;

        if self.connection.is_some() {
            debug!("Replacing connected adapter");
            self.teardown();
        }

        let context = AdapterContext {
            store: self.machine.reader(),
            events: MediaEventSink::new(id, self.tx.clone()),
        };
        if let Err(err) = adapter.attach(context) {
            warn!(adapter = adapter.name(), error = %err, "Adapter attach failed");
            let media_error = err.to_media_error();
            self.notifier
                .send(Notification::error(media_error.kind, media_error.message, None));
            // The adapter side sees the connection end
            hook.fire();
            return;
        }

        let mut connection = ActiveConnection::new(id, adapter.name());

        self.adapter.set(adapter.clone());
        let slot = self.adapter.clone();
        let attached = adapter.clone();
        connection.bin.add_callback(move || {
            slot.clear();
            attached.detach();
        });

        let reader = self.machine.reader();
        let fields = adapter.forwarded_fields();
        for field in &fields {
            let field = *field;
            let notifier = self.notifier.clone();
            let subscription = reader.subscribe_changes(field, move |value| {
                notifier.send(Notification::state_change(field, value.clone()));
            });
            connection.bin.add_object(subscription);
        }

        let tx = self.tx.clone();
        hook.on_disconnect(move || {
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(ControlMsg::Disconnect { connection_id: id });
            }
        });

        self.connection = Some(connection);
        self.idle.start();

        info!(
            connection_id = %id,
            adapter = adapter.name(),
            forwarded = fields.len(),
            "Adapter connected"
        );
        self.notifier.send(Notification::AdapterConnected {
            connection_id: id,
            adapter: adapter.name().to_string(),
            timestamp: time::now(),
        });

        let report = self.queue.start().await;
        log_flush(&report);
    }

    /// Reverse a connection; no-op without one
    fn teardown(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        let connection_id = connection.id;
        let adapter = connection.adapter_name.clone();

        self.cancel_autoplay();
        self.idle.stop();
        if let Err(err) = connection.close() {
            warn!(connection_id = %connection_id, error = %err, "Connection cleanup failed");
        }
        self.machine.reset();
        self.queue.stop();

        info!(connection_id = %connection_id, adapter = %adapter, "Adapter disconnected");
        self.notifier.send(Notification::AdapterDisconnected {
            connection_id,
            timestamp: time::now(),
        });
    }

    async fn handle_media_event(&mut self, event: MediaEvent) {
        if matches!(event, MediaEvent::SrcChange { .. }) {
            // Intents for the previous source are stale
            self.cancel_autoplay();
            self.queue.stop();
        }

        let transition = self.machine.send(&event);

        // A failed load ends the wait for the new source
        if matches!(event, MediaEvent::Abort { .. } | MediaEvent::Error { .. }) {
            self.resume_queue().await;
            return;
        }

        let Some(transition) = transition else {
            return;
        };

        if matches!(event, MediaEvent::CanPlay { .. }) {
            self.resume_queue().await;
            if transition.to == MachineState::Paused {
                self.maybe_autoplay().await;
            }
        }
    }

    /// Back to serving while an adapter is connected
    async fn resume_queue(&mut self) {
        if self.connection.is_none() || self.queue.is_serving() {
            return;
        }
        let report = self.queue.start().await;
        log_flush(&report);
    }

    async fn maybe_autoplay(&mut self) {
        let state = self.machine.store().snapshot();
        if !state.autoplay || state.started {
            return;
        }
        let run = self.autoplay.begin();
        debug!(run, max_attempts = self.autoplay.max_attempts(), "Autoplay starting");
        self.attempt_autoplay(run, 1).await;
    }

    async fn attempt_autoplay(&mut self, run: u64, attempt: u32) {
        if self.machine.send(&MediaEvent::Autoplay).is_none() {
            debug!(state = %self.machine.state(), "Autoplay no longer applicable");
            self.autoplay.cancel();
            return;
        }

        let force_mute =
            self.autoplay.is_final_attempt(attempt) && !self.machine.store().snapshot().muted;
        let adapter = self.adapter.clone();
        let tx = self.tx.clone();
        debug!(run, attempt, force_mute, "Autoplay attempt");

        let thunk = move || {
            async move {
                let result = match adapter.get() {
                    Some(adapter) => {
                        let muted = if force_mute {
                            adapter.set_muted(true).await
                        } else {
                            Ok(())
                        };
                        match muted {
                            Ok(()) => adapter.play().await,
                            Err(err) => Err(err),
                        }
                    }
                    None => Err(Error::NotConnected),
                };
                if let Some(tx) = tx.upgrade() {
                    let _ = tx.send(ControlMsg::AutoplayResult { run, attempt, result });
                }
                // Outcome is handled through AutoplayResult
                Ok(())
            }
            .boxed()
        };

        if let Err(err) = self.queue.queue("autoplay", thunk).await {
            debug!(error = %err, "Autoplay attempt not queued");
            self.autoplay.cancel();
        }
    }

    fn handle_autoplay_result(&mut self, run: u64, attempt: u32, result: Result<()>) {
        match self.autoplay.record(run, attempt, result.is_ok()) {
            None => trace!(run, attempt, "Ignoring stale autoplay result"),
            Some(AttemptOutcome::Succeeded) => info!(attempt, "Autoplay started"),
            Some(AttemptOutcome::RetryScheduled { attempt: next }) => {
                debug!(attempt, next, "Autoplay attempt failed, retrying");
            }
            Some(AttemptOutcome::Exhausted { attempts }) => {
                let message = result.err().map(|e| e.to_string()).unwrap_or_default();
                let error = Error::Autoplay { attempts, message };
                warn!(error = %error, "Autoplay gave up");
                self.apply_local(MediaEvent::AutoplayFail {
                    error: error.to_media_error(),
                });
            }
        }
    }

    fn cancel_autoplay(&mut self) {
        self.autoplay.cancel();
    }

    fn report_failure(&mut self, request: &str, error: &Error) {
        warn!(request, error = %error, "Request failed");
        let media_error = error.to_media_error();
        self.apply_local(MediaEvent::Error {
            error: media_error.clone(),
        });
        self.notifier
            .send(Notification::error(media_error.kind, media_error.message, Some(request)));
    }

    fn close(&mut self) {
        self.teardown();
        self.queue.destroy();
        self.rx.close();
    }
}

fn log_flush(report: &FlushReport) {
    if report.attempted() == 0 {
        return;
    }
    if report.failures.is_empty() {
        info!(served = report.served, "Flushed deferred requests");
    } else {
        warn!(
            served = report.served,
            failed = report.failures.len(),
            "Flushed deferred requests with failures"
        );
    }
}
