//! Adapter connections
//!
//! A connection pairs the controller with one attached adapter. The adapter
//! side holds an [`AdapterConnection`]; disconnecting it (or dropping it)
//! fires the [`DisconnectHook`], whose callbacks run exactly once.

use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::adapter::MediaAdapter;
use crate::disposal::DisposalBin;

type HookCallback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct HookState {
    fired: bool,
    callbacks: Vec<HookCallback>,
}

/// One-shot disconnect notification shared by both ends of a connection
#[derive(Clone, Default)]
pub struct DisconnectHook {
    state: Arc<Mutex<HookState>>,
}

impl DisconnectHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; runs immediately if the hook already fired
    pub fn on_disconnect<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.fired {
            drop(state);
            callback();
        } else {
            state.callbacks.push(Box::new(callback));
        }
    }

    /// Run every registered callback; later calls do nothing
    pub fn fire(&self) {
        let callbacks = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.fired {
                return;
            }
            state.fired = true;
            std::mem::take(&mut state.callbacks)
        };
        for callback in callbacks {
            callback();
        }
    }

    pub fn is_fired(&self) -> bool {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).fired
    }
}

impl std::fmt::Debug for DisconnectHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisconnectHook")
            .field("fired", &self.is_fired())
            .finish()
    }
}

/// Adapter-side handle of a live connection
///
/// Dropping it disconnects.
#[must_use = "dropping an AdapterConnection disconnects the adapter"]
#[derive(Debug)]
pub struct AdapterConnection {
    id: Uuid,
    hook: DisconnectHook,
}

impl AdapterConnection {
    pub(crate) fn new(id: Uuid, hook: DisconnectHook) -> Self {
        Self { id, hook }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_disconnected(&self) -> bool {
        self.hook.is_fired()
    }

    pub fn disconnect(self) {
        self.hook.fire();
    }
}

impl Drop for AdapterConnection {
    fn drop(&mut self) {
        self.hook.fire();
    }
}

/// Payload of the one-shot connect message
pub struct ConnectEvent {
    pub id: Uuid,
    pub adapter: Arc<dyn MediaAdapter>,
    pub hook: DisconnectHook,
}

impl std::fmt::Debug for ConnectEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectEvent")
            .field("id", &self.id)
            .field("adapter", &self.adapter.name())
            .finish()
    }
}

/// Currently attached adapter, read by queued commands when they run
#[derive(Clone, Default)]
pub struct AdapterSlot {
    inner: Arc<RwLock<Option<Arc<dyn MediaAdapter>>>>,
}

impl AdapterSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<dyn MediaAdapter>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set(&self, adapter: Arc<dyn MediaAdapter>) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = Some(adapter);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn is_empty(&self) -> bool {
        self.get().is_none()
    }
}

impl std::fmt::Debug for AdapterSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterSlot")
            .field("adapter", &self.get().map(|a| a.name().to_string()))
            .finish()
    }
}

/// Controller-side record of the attached adapter
#[derive(Debug)]
pub(crate) struct ActiveConnection {
    pub id: Uuid,
    pub adapter_name: String,
    pub bin: DisposalBin,
}

impl ActiveConnection {
    pub fn new(id: Uuid, adapter_name: impl Into<String>) -> Self {
        Self {
            id,
            adapter_name: adapter_name.into(),
            bin: DisposalBin::new(),
        }
    }

    /// Run every per-connection cleanup
    pub fn close(mut self) -> crate::error::Result<()> {
        debug!(connection_id = %self.id, items = self.bin.len(), "Closing connection");
        self.bin.dispose()
    }
}
