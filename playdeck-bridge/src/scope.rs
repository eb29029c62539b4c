//! Player scope
//!
//! The typed channel a player's descendants talk through. Each scope owns
//! its own controller task, so requests sent on one scope are never seen by
//! another (nested players stay independent). Cloning a scope is cheap and
//! every clone addresses the same controller.

use std::sync::Arc;

use futures::stream::Stream;
use playdeck_common::events::{MediaRequest, Notification, RequestOrigin, UserActivity};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::adapter::{MediaAdapter, PlayTypeSupport};
use crate::config::ControllerConfig;
use crate::controller::{
    AdapterConnection, AdapterSlot, ConnectEvent, ControlMsg, DisconnectHook, MediaController,
    RequestEnvelope,
};
use crate::error::{Error, Result};
use crate::machine::{MachineState, PlaybackMachine};
use crate::notifier::Notifier;
use crate::store::StoreReader;

/// Upper bound on barrier rounds in [`PlayerScope::settle`]
const MAX_SETTLE_ROUNDS: usize = 64;

/// Outcome of a request, resolved once the adapter call ran
#[must_use = "a PendingRequest does nothing unless awaited; drop it to ignore the result"]
#[derive(Debug)]
pub struct PendingRequest {
    rx: oneshot::Receiver<Result<()>>,
}

impl PendingRequest {
    pub(crate) fn new(rx: oneshot::Receiver<Result<()>>) -> Self {
        Self { rx }
    }

    /// Wait for the adapter call
    ///
    /// `RequestDiscarded` when the request was superseded by a newer one of
    /// the same kind or dropped with a stale source.
    pub async fn wait(self) -> Result<()> {
        self.rx.await.unwrap_or(Err(Error::RequestDiscarded))
    }
}

/// Handle to one player's controller
#[derive(Clone)]
pub struct PlayerScope {
    tx: mpsc::UnboundedSender<ControlMsg>,
    store: StoreReader,
    notifier: Notifier,
    adapter: AdapterSlot,
    state_rx: watch::Receiver<MachineState>,
}

impl PlayerScope {
    /// Spawn a controller on the current tokio runtime
    pub fn new(config: ControllerConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(MachineState::Idle);
        let machine = PlaybackMachine::new();
        let store = machine.reader();
        let notifier = Notifier::new(config.notification_capacity);
        let adapter = AdapterSlot::new();

        let controller = MediaController::new(
            &config,
            rx,
            tx.downgrade(),
            machine,
            adapter.clone(),
            notifier.clone(),
            state_tx,
        );
        tokio::spawn(controller.run());
        debug!(?config, "Player scope created");

        Self {
            tx,
            store,
            notifier,
            adapter,
            state_rx,
        }
    }

    /// Read-only view of the playback state
    pub fn store(&self) -> &StoreReader {
        &self.store
    }

    /// Current phase of the playback machine
    pub fn machine_state(&self) -> MachineState {
        *self.state_rx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        !self.adapter.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Announce an adapter to the controller
    ///
    /// Fails with `ConnectionIntegrity` when the adapter lacks `play` or
    /// `pause`. The returned handle disconnects on drop.
    pub fn connect(&self, adapter: Arc<dyn MediaAdapter>) -> Result<AdapterConnection> {
        let missing = adapter.capabilities().missing_required();
        if !missing.is_empty() {
            warn!(
                adapter = adapter.name(),
                ?missing,
                "Refusing adapter without required operations"
            );
            return Err(Error::ConnectionIntegrity(format!(
                "adapter '{}' is missing required operations: {}",
                adapter.name(),
                missing.join(", ")
            )));
        }

        let id = Uuid::new_v4();
        let hook = DisconnectHook::new();
        self.tx
            .send(ControlMsg::Connect(ConnectEvent {
                id,
                adapter,
                hook: hook.clone(),
            }))
            .map_err(|_| Error::ControllerClosed)?;
        Ok(AdapterConnection::new(id, hook))
    }

    /// Send a request with optional provenance
    pub fn request(&self, request: MediaRequest, origin: Option<RequestOrigin>) -> PendingRequest {
        let (responder, rx) = oneshot::channel();
        // On failure the responder already carries ControllerClosed
        let _ = self.send_envelope(RequestEnvelope {
            request,
            origin,
            responder: Some(responder),
        });
        PendingRequest::new(rx)
    }

    /// Hand a request to the controller; a closed controller answers the
    /// responder with `ControllerClosed`
    pub(crate) fn send_envelope(&self, envelope: RequestEnvelope) -> Result<()> {
        match self.tx.send(ControlMsg::Request(envelope)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::SendError(msg)) => {
                if let ControlMsg::Request(RequestEnvelope {
                    responder: Some(responder),
                    ..
                }) = msg
                {
                    let _ = responder.send(Err(Error::ControllerClosed));
                }
                Err(Error::ControllerClosed)
            }
        }
    }

    /// Pointer, keyboard or touch input; resets idle detection
    pub fn report_activity(&self, activity: UserActivity) {
        let _ = self.tx.send(ControlMsg::Activity(activity));
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    pub fn notification_stream(&self) -> impl Stream<Item = Notification> + Send + 'static {
        self.notifier.stream()
    }

    /// Probe the connected adapter; `No` without one
    pub fn can_play_type(&self, mime: &str) -> PlayTypeSupport {
        self.adapter
            .get()
            .map_or(PlayTypeSupport::No, |adapter| adapter.can_play_type(mime))
    }

    /// Wait until the controller has drained every message, including the
    /// ones those messages produced
    pub async fn settle(&self) -> Result<()> {
        for _ in 0..MAX_SETTLE_ROUNDS {
            let before = self.barrier().await?;
            tokio::task::yield_now().await;
            let after = self.barrier().await?;
            if after == before + 1 {
                return Ok(());
            }
        }
        debug!(rounds = MAX_SETTLE_ROUNDS, "Controller still busy after settle");
        Ok(())
    }

    async fn barrier(&self) -> Result<u64> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ControlMsg::Barrier { reply })
            .map_err(|_| Error::ControllerClosed)?;
        rx.await.map_err(|_| Error::ControllerClosed)
    }

    /// Stop the controller: disconnects the adapter and destroys the queue
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ControlMsg::Shutdown { reply })
            .map_err(|_| Error::ControllerClosed)?;
        rx.await.map_err(|_| Error::ControllerClosed)
    }
}

impl std::fmt::Debug for PlayerScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerScope")
            .field("state", &self.machine_state())
            .field("adapter", &self.adapter)
            .finish()
    }
}
