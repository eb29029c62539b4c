//! Cancelable timers
//!
//! A timer is a spawned tokio task that sleeps and then runs a callback
//! (normally a message send back into the controller loop). Every arm of a
//! [`TimerSlot`] gets a new generation so a message from a timer that was
//! cancelled after it had already fired can be recognised and ignored.

use std::time::Duration;
use tokio::task::JoinHandle;

/// Handle to one pending timer; aborts the task on cancel or drop
#[derive(Debug)]
pub struct TimerHandle {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl TimerHandle {
    /// Run `on_fire` after `delay`
    pub fn spawn_after<F>(delay: Duration, generation: u64, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire();
        });
        Self {
            handle: Some(handle),
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// At most one pending timer, with generation tracking
#[derive(Debug, Default)]
pub struct TimerSlot {
    current: Option<TimerHandle>,
    generation: u64,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending timer; `on_fire` receives the new generation
    pub fn arm<F>(&mut self, delay: Duration, on_fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        let generation = self.bump();
        let timer = TimerHandle::spawn_after(delay, generation, move || on_fire(generation));
        self.current = Some(timer);
        generation
    }

    /// Cancel the pending timer and invalidate its generation
    pub fn cancel(&mut self) {
        self.bump();
    }

    /// Whether `generation` belongs to the most recent arm
    pub fn is_current(&self, generation: u64) -> bool {
        self.current.as_ref().is_some_and(|t| t.generation() == generation)
    }

    /// Forget the fired timer for `generation`; true when it was current
    pub fn take_fired(&mut self, generation: u64) -> bool {
        if self.is_current(generation) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn is_armed(&self) -> bool {
        self.current.as_ref().is_some_and(TimerHandle::is_pending)
    }

    fn bump(&mut self) -> u64 {
        if let Some(mut timer) = self.current.take() {
            timer.cancel();
        }
        self.generation += 1;
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = fired.clone();
        let _timer = TimerHandle::spawn_after(Duration::from_millis(100), 1, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = fired.clone();
        let timer = TimerHandle::spawn_after(Duration::from_millis(100), 1, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(timer);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_invalidates_previous_generation() {
        let mut slot = TimerSlot::new();
        let first = slot.arm(Duration::from_millis(100), |_| {});
        let second = slot.arm(Duration::from_millis(100), |_| {});

        assert_ne!(first, second);
        assert!(!slot.is_current(first));
        assert!(slot.is_current(second));

        slot.cancel();
        assert!(!slot.is_current(second));
        assert!(!slot.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_fired_only_once() {
        let mut slot = TimerSlot::new();
        let generation = slot.arm(Duration::from_millis(10), |_| {});
        assert!(slot.take_fired(generation));
        assert!(!slot.take_fired(generation));
    }
}
