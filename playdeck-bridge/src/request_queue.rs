//! Keyed, deferred command buffer
//!
//! Commands destined for an engine that is not ready yet are parked under a
//! semantic key (`"paused"`, `"volume"`, `"time"`, ...). Re-queuing a key
//! replaces its thunk but keeps its original position, so a burst of volume
//! changes collapses to the last one while still running in the order the
//! first of each kind arrived.
//!
//! Thunks never run concurrently: immediate execution and flushing share one
//! async serial lock. A thunk must therefore not call [`RequestQueue::queue`]
//! on the same queue while serving, or it waits on itself.

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

type Thunk = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

/// How a queued command was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Ran immediately (queue was serving)
    Served,
    /// Parked until the next `start()`
    Deferred,
}

/// Outcome of one flush
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Thunks that completed successfully
    pub served: usize,
    /// Thunks that failed; the flush continued past each of them
    pub failures: Vec<Error>,
}

impl FlushReport {
    pub fn attempted(&self) -> usize {
        self.served + self.failures.len()
    }
}

struct Pending {
    serve_immediately: bool,
    destroyed: bool,
    entries: Vec<(String, Thunk)>,
}

/// Deferred command queue with an immediate/deferred mode switch
pub struct RequestQueue {
    pending: Mutex<Pending>,
    serial: tokio::sync::Mutex<()>,
    flushes: watch::Sender<u64>,
}

impl RequestQueue {
    pub fn new() -> Self {
        let (flushes, _) = watch::channel(0);
        Self {
            pending: Mutex::new(Pending {
                serve_immediately: false,
                destroyed: false,
                entries: Vec::new(),
            }),
            serial: tokio::sync::Mutex::new(()),
            flushes,
        }
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_serving(&self) -> bool {
        self.pending().serve_immediately
    }

    pub fn is_destroyed(&self) -> bool {
        self.pending().destroyed
    }

    /// Number of parked commands
    pub fn len(&self) -> usize {
        self.pending().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of parked commands, in execution order
    pub fn keys(&self) -> Vec<String> {
        self.pending().entries.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Run `thunk` now if serving, otherwise park it under `key`
    ///
    /// When the thunk runs immediately its error is returned to the caller.
    pub async fn queue<F, Fut>(&self, key: impl Into<String>, thunk: F) -> Result<Dispatch>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let key = key.into();
        let thunk: Thunk = Box::new(move || thunk().boxed());

        {
            let mut pending = self.pending();
            if pending.destroyed {
                return Err(Error::QueueDestroyed);
            }
            if !pending.serve_immediately {
                match pending.entries.iter_mut().find(|(k, _)| *k == key) {
                    Some(entry) => {
                        trace!(key = %key, "Replacing queued request");
                        entry.1 = thunk;
                    }
                    None => {
                        trace!(key = %key, "Deferring request");
                        pending.entries.push((key, thunk));
                    }
                }
                return Ok(Dispatch::Deferred);
            }
        }

        let _serial = self.serial.lock().await;
        thunk().await?;
        Ok(Dispatch::Served)
    }

    /// Switch to serving and run every parked command in insertion order
    ///
    /// Failures are logged and collected; remaining commands still run. A
    /// `stop()` issued while flushing discards whatever has not run yet.
    pub async fn start(&self) -> FlushReport {
        let mut report = FlushReport::default();
        let _serial = self.serial.lock().await;

        {
            let mut pending = self.pending();
            if pending.destroyed {
                return report;
            }
            pending.serve_immediately = true;
        }

        loop {
            let next = {
                let mut pending = self.pending();
                if !pending.serve_immediately || pending.entries.is_empty() {
                    break;
                }
                pending.entries.remove(0)
            };

            let (key, thunk) = next;
            match thunk().await {
                Ok(()) => report.served += 1,
                Err(err) => {
                    warn!(
                        key = %key,
                        error = %err,
                        "Queued request failed during flush, continuing"
                    );
                    report.failures.push(Error::QueueReplay {
                        key,
                        message: err.to_string(),
                    });
                }
            }
        }

        debug!(
            served = report.served,
            failed = report.failures.len(),
            "Request queue flushed"
        );
        self.flushes.send_modify(|count| *count += 1);
        report
    }

    /// Switch to deferred mode and discard parked commands without running them
    pub fn stop(&self) {
        let mut pending = self.pending();
        pending.serve_immediately = false;
        let discarded = std::mem::take(&mut pending.entries);
        if !discarded.is_empty() {
            debug!(count = discarded.len(), "Discarded stale queued requests");
        }
    }

    /// Permanently disable the queue
    pub fn destroy(&self) {
        let mut pending = self.pending();
        pending.destroyed = true;
        pending.serve_immediately = false;
        pending.entries.clear();
    }

    /// Resolves after the next `start()` completes
    pub async fn wait_for_flush(&self) {
        let mut flushes = self.flushes.subscribe();
        // Sender lives as long as self, so changed() only fails on drop
        let _ = flushes.changed().await;
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self.pending();
        f.debug_struct("RequestQueue")
            .field("serve_immediately", &pending.serve_immediately)
            .field("destroyed", &pending.destroyed)
            .field(
                "keys",
                &pending.entries.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
