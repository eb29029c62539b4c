//! User-idle detection
//!
//! Activity re-arms a timer; when it fires the controller sets `idle`.
//! Pausing drops the timer and clears `idle` but keeps the timeout, so a
//! later resume behaves exactly like a fresh start.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::trace;

use super::timer::TimerSlot;
use super::ControlMsg;

#[derive(Debug)]
pub(crate) struct IdleTracker {
    timeout: Duration,
    tx: mpsc::WeakUnboundedSender<ControlMsg>,
    timer: TimerSlot,
    tracking: bool,
    paused: bool,
}

impl IdleTracker {
    pub fn new(timeout: Duration, tx: mpsc::WeakUnboundedSender<ControlMsg>) -> Self {
        Self {
            timeout,
            tx,
            timer: TimerSlot::new(),
            tracking: false,
            paused: false,
        }
    }

    /// Begin tracking for a new connection
    pub fn start(&mut self) {
        self.tracking = true;
        if !self.paused {
            self.arm();
        }
    }

    /// Stop tracking entirely
    pub fn stop(&mut self) {
        self.tracking = false;
        self.timer.cancel();
    }

    /// User activity; returns `Some(false)` when `idle` must be cleared
    pub fn activity(&mut self) -> Option<bool> {
        if !self.tracking || self.paused {
            return None;
        }
        self.arm();
        Some(false)
    }

    /// Freeze detection; `idle` is cleared
    pub fn pause(&mut self) -> bool {
        self.paused = true;
        self.timer.cancel();
        false
    }

    /// Unfreeze detection with the original timeout
    pub fn resume(&mut self) {
        self.paused = false;
        if self.tracking {
            self.arm();
        }
    }

    /// Timer fired; true when `idle` must be set
    pub fn on_timeout(&mut self, generation: u64) -> bool {
        self.timer.take_fired(generation) && self.tracking && !self.paused
    }

    fn arm(&mut self) {
        let tx = self.tx.clone();
        let generation = self.timer.arm(self.timeout, move |generation| {
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(ControlMsg::IdleTimeout { generation });
            }
        });
        trace!(generation, timeout_ms = self.timeout.as_millis() as u64, "Idle timer armed");
    }
}
