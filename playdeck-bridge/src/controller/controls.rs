//! Custom-controls visibility
//!
//! A single boolean changed only by show/hide requests. The flip is applied
//! after yielding to the scheduler `settle_ticks` times so controls that are
//! reacting to the same user action finish first.

use tracing::debug;

#[derive(Debug)]
pub struct ControlsVisibility {
    visible: bool,
    settle_ticks: u32,
}

impl ControlsVisibility {
    pub fn new(settle_ticks: u32) -> Self {
        Self {
            visible: false,
            settle_ticks,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Request a visibility; `Some(visible)` only on an actual transition
    pub async fn request(&mut self, visible: bool) -> Option<bool> {
        for _ in 0..self.settle_ticks {
            tokio::task::yield_now().await;
        }
        if self.visible == visible {
            return None;
        }
        self.visible = visible;
        debug!(visible, "Custom controls visibility changed");
        Some(visible)
    }
}
