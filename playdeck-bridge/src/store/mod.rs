//! Reactive playback-state store
//!
//! One subscribable cell per [`PlaybackState`] field. A commit applies its
//! whole patch to a copy of the record, diffs every field (derived fields
//! included) against the previous record, swaps the copy in and then calls
//! the subscribers of each changed field synchronously, before returning.
//! Base and derived values are therefore always observed together.
//!
//! Every commit bumps a record version. A subscriber never receives a
//! value older than one it has already been given, so the initial call of a
//! hot subscription racing a commit cannot leave it holding stale state.
//!
//! [`MediaStore`] is the writer and is owned by the playback machine.
//! Everything else gets a [`StoreReader`].

mod subscription;

pub use subscription::Subscription;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use playdeck_common::{FieldValue, MediaField, PlaybackState, StateError};
use tracing::trace;

/// Callback invoked with a field's new value
pub type FieldCallback = Arc<dyn Fn(&FieldValue) + Send + Sync>;

struct Versioned {
    record: PlaybackState,
    /// Starts at 1; bumped by every non-empty commit
    version: u64,
}

struct Subscriber {
    id: u64,
    callback: FieldCallback,
    /// Newest version delivered so far, 0 before the first call
    delivered: Mutex<u64>,
}

impl Subscriber {
    /// Invoke the callback unless this or a newer version was already delivered
    fn deliver(&self, version: u64, value: &FieldValue) {
        let mut delivered = self.delivered.lock().unwrap_or_else(|e| e.into_inner());
        if version <= *delivered {
            trace!(id = self.id, version, delivered = *delivered, "Skipping stale delivery");
            return;
        }
        *delivered = version;
        (self.callback)(value);
    }
}

type SubscriberMap = HashMap<MediaField, Vec<Arc<Subscriber>>>;

pub(crate) struct Shared {
    state: Mutex<Versioned>,
    subscribers: Mutex<SubscriberMap>,
    next_id: AtomicU64,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, Versioned> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn subscribers(&self) -> MutexGuard<'_, SubscriberMap> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn remove_subscriber(&self, field: MediaField, id: u64) {
        let mut subscribers = self.subscribers();
        if let Some(list) = subscribers.get_mut(&field) {
            list.retain(|subscriber| subscriber.id != id);
            if list.is_empty() {
                subscribers.remove(&field);
            }
        }
    }

    fn subscribe(
        self: &Arc<Self>,
        field: MediaField,
        callback: FieldCallback,
        hot: bool,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let subscriber = Arc::new(Subscriber {
            id,
            callback,
            delivered: Mutex::new(0),
        });

        // Holding the state lock while registering means a concurrent commit
        // either sees this subscriber or happened entirely before.
        let current = {
            let state = self.state();
            self.subscribers().entry(field).or_default().push(subscriber.clone());
            hot.then(|| (state.version, state.record.get(field)))
        };

        if let Some((version, value)) = current {
            subscriber.deliver(version, &value);
        }
        Subscription::new(Arc::downgrade(self), field, id)
    }
}

/// Read-only view of the store
#[derive(Clone)]
pub struct StoreReader {
    shared: Arc<Shared>,
}

impl StoreReader {
    /// Current value of one field
    pub fn get(&self, field: MediaField) -> FieldValue {
        self.shared.state().record.get(field)
    }

    /// Copy of the whole record as of now
    pub fn snapshot(&self) -> PlaybackState {
        self.shared.state().record.clone()
    }

    /// Call `callback` with the current value now and on every change
    pub fn subscribe<F>(&self, field: MediaField, callback: F) -> Subscription
    where
        F: Fn(&FieldValue) + Send + Sync + 'static,
    {
        self.shared.subscribe(field, Arc::new(callback), true)
    }

    /// Like [`subscribe`](Self::subscribe) but without the initial call
    pub fn subscribe_changes<F>(&self, field: MediaField, callback: F) -> Subscription
    where
        F: Fn(&FieldValue) + Send + Sync + 'static,
    {
        self.shared.subscribe(field, Arc::new(callback), false)
    }

    pub fn subscriber_count(&self, field: MediaField) -> usize {
        self.shared.subscribers().get(&field).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for StoreReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreReader").finish_non_exhaustive()
    }
}

/// Writable store; the single writer of the playback record
pub struct MediaStore {
    reader: StoreReader,
}

impl MediaStore {
    /// Store holding the default record
    pub fn new() -> Self {
        Self {
            reader: StoreReader {
                shared: Arc::new(Shared {
                    state: Mutex::new(Versioned {
                        record: PlaybackState::default(),
                        version: 1,
                    }),
                    subscribers: Mutex::new(HashMap::new()),
                    next_id: AtomicU64::new(0),
                }),
            },
        }
    }

    pub fn reader(&self) -> StoreReader {
        self.reader.clone()
    }

    pub fn get(&self, field: MediaField) -> FieldValue {
        self.reader.get(field)
    }

    pub fn snapshot(&self) -> PlaybackState {
        self.reader.snapshot()
    }

    pub fn subscribe<F>(&self, field: MediaField, callback: F) -> Subscription
    where
        F: Fn(&FieldValue) + Send + Sync + 'static,
    {
        self.reader.subscribe(field, callback)
    }

    /// Apply `patch` atomically and notify subscribers of changed fields
    ///
    /// Returns the fields that changed, in [`MediaField::ALL`] order.
    pub fn commit<F>(&mut self, patch: F) -> Vec<MediaField>
    where
        F: FnOnce(&mut PlaybackState),
    {
        let shared = &self.reader.shared;
        let (version, changes, targets) = {
            let mut state = shared.state();
            let mut next = state.record.clone();
            patch(&mut next);

            let changes = state.record.diff(&next);
            if changes.is_empty() {
                return Vec::new();
            }
            state.record = next;
            state.version += 1;

            let subscribers = shared.subscribers();
            let targets: Vec<Vec<Arc<Subscriber>>> = changes
                .iter()
                .map(|(field, _)| subscribers.get(field).cloned().unwrap_or_default())
                .collect();
            (state.version, changes, targets)
        };

        for ((field, value), targets) in changes.iter().zip(targets) {
            trace!(field = %field, value = ?value, version, "Store field changed");
            for subscriber in targets {
                subscriber.deliver(version, value);
            }
        }

        changes.into_iter().map(|(field, _)| field).collect()
    }

    /// Write one base field
    pub fn set(&mut self, field: MediaField, value: FieldValue) -> Result<bool, StateError> {
        let mut checked = self.snapshot();
        checked.set(field, value.clone())?;
        Ok(!self.commit(|state| {
            // Validated against the snapshot above
            let _ = state.set(field, value);
        })
        .is_empty())
    }

    /// Source change: back to defaults except the preserved fields
    pub fn soft_reset(&mut self) -> Vec<MediaField> {
        self.commit(|state| *state = state.soft_reset())
    }

    /// Engine gone: every field back to its default
    pub fn hard_reset(&mut self) -> Vec<MediaField> {
        self.commit(|state| *state = PlaybackState::default())
    }
}

impl Default for MediaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MediaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStore").finish_non_exhaustive()
    }
}
