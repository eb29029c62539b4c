//! Collects notifications broadcast by a scope

use playdeck_bridge::PlayerScope;
use playdeck_common::events::Notification;
use playdeck_common::MediaField;
use tokio::sync::broadcast::{self, error::TryRecvError};

pub struct NotificationLog {
    rx: broadcast::Receiver<Notification>,
    seen: Vec<Notification>,
}

impl NotificationLog {
    /// Subscribe now; only later notifications are collected
    pub fn new(scope: &PlayerScope) -> Self {
        Self {
            rx: scope.notifications(),
            seen: Vec::new(),
        }
    }

    /// Everything received so far
    pub fn all(&mut self) -> &[Notification] {
        loop {
            match self.rx.try_recv() {
                Ok(notification) => self.seen.push(notification),
                Err(TryRecvError::Lagged(skipped)) => {
                    panic!("notification log lagged by {}", skipped)
                }
                Err(_) => break,
            }
        }
        &self.seen
    }

    pub fn names(&mut self) -> Vec<String> {
        self.all().iter().map(Notification::event_name).collect()
    }

    pub fn count(&mut self, name: &str) -> usize {
        self.names().iter().filter(|n| n.as_str() == name).count()
    }

    pub fn controls_changes(&mut self) -> Vec<bool> {
        self.all()
            .iter()
            .filter_map(|n| match n {
                Notification::ControlsChange { visible, .. } => Some(*visible),
                _ => None,
            })
            .collect()
    }

    pub fn changes_of(&mut self, field: MediaField) -> usize {
        self.all()
            .iter()
            .filter(|n| matches!(n, Notification::StateChange { field: f, .. } if *f == field))
            .count()
    }

    pub fn clear(&mut self) {
        self.all();
        self.seen.clear();
    }
}
