//! Automatic playback retry
//!
//! Bookkeeping for one autoplay run: which attempt is in flight, when to
//! retry and when to give up. The controller performs the attempts; this
//! type only decides. Every run has an id so results and retry timers from a
//! cancelled run are ignored.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use super::timer::TimerSlot;
use super::ControlMsg;

/// What the controller should do after an attempt finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    /// A retry timer was armed for this attempt number
    RetryScheduled { attempt: u32 },
    /// Every attempt failed
    Exhausted { attempts: u32 },
}

#[derive(Debug)]
pub(crate) struct AutoplayRetry {
    max_attempts: u32,
    delay: Duration,
    tx: mpsc::WeakUnboundedSender<ControlMsg>,
    timer: TimerSlot,
    run: Option<u64>,
    runs: u64,
}

impl AutoplayRetry {
    pub fn new(
        max_attempts: u32,
        delay: Duration,
        tx: mpsc::WeakUnboundedSender<ControlMsg>,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            tx,
            timer: TimerSlot::new(),
            run: None,
            runs: 0,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_active(&self) -> bool {
        self.run.is_some()
    }

    pub fn is_current(&self, run: u64) -> bool {
        self.run == Some(run)
    }

    /// The last attempt forces mute before playing
    pub fn is_final_attempt(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }

    /// Start a new run, cancelling any previous one; returns its id
    pub fn begin(&mut self) -> u64 {
        self.cancel();
        self.runs += 1;
        self.run = Some(self.runs);
        self.runs
    }

    /// Cancel the active run; true when one was active
    pub fn cancel(&mut self) -> bool {
        self.timer.cancel();
        match self.run.take() {
            Some(run) => {
                debug!(run, "Autoplay cancelled");
                true
            }
            None => false,
        }
    }

    /// Record the result of `attempt`; `None` when the run is stale
    pub fn record(&mut self, run: u64, attempt: u32, succeeded: bool) -> Option<AttemptOutcome> {
        if !self.is_current(run) {
            return None;
        }

        if succeeded {
            self.run = None;
            return Some(AttemptOutcome::Succeeded);
        }

        if self.is_final_attempt(attempt) {
            self.run = None;
            return Some(AttemptOutcome::Exhausted { attempts: attempt });
        }

        let next = attempt + 1;
        let tx = self.tx.clone();
        self.timer.arm(self.delay, move |_| {
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(ControlMsg::AutoplayRetry { run, attempt: next });
            }
        });
        Some(AttemptOutcome::RetryScheduled { attempt: next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retry(
        max: u32,
    ) -> (AutoplayRetry, mpsc::UnboundedReceiver<ControlMsg>, mpsc::UnboundedSender<ControlMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (AutoplayRetry::new(max, Duration::from_millis(50), tx.downgrade()), rx, tx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_schedules_retry_message() {
        let (mut autoplay, mut rx, _tx) = retry(3);
        let run = autoplay.begin();

        assert_eq!(
            autoplay.record(run, 1, false),
            Some(AttemptOutcome::RetryScheduled { attempt: 2 })
        );
        match rx.recv().await {
            Some(ControlMsg::AutoplayRetry { run: r, attempt }) => {
                assert_eq!(r, run);
                assert_eq!(attempt, 2);
            }
            _ => panic!("Expected autoplay retry"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_max_attempts() {
        let (mut autoplay, _rx, _tx) = retry(2);
        let run = autoplay.begin();
        assert!(!autoplay.is_final_attempt(1));
        assert!(autoplay.is_final_attempt(2));

        assert_eq!(
            autoplay.record(run, 2, false),
            Some(AttemptOutcome::Exhausted { attempts: 2 })
        );
        assert!(!autoplay.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_retry() {
        let (mut autoplay, mut rx, _tx) = retry(3);
        let run = autoplay.begin();
        autoplay.record(run, 1, false);
        assert!(autoplay.cancel());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(autoplay.record(run, 2, true), None);
    }

    #[tokio::test]
    async fn test_new_run_supersedes_old() {
        let (mut autoplay, _rx, _tx) = retry(3);
        let first = autoplay.begin();
        let second = autoplay.begin();
        assert_eq!(autoplay.record(first, 1, true), None);
        assert_eq!(autoplay.record(second, 1, true), Some(AttemptOutcome::Succeeded));
    }
}
