//! Notification broadcaster
//!
//! Fan-out of controller [`Notification`]s to host listeners over a tokio
//! broadcast channel. Sending never fails: no listener is a normal state.

use futures::stream::{Stream, StreamExt};
use playdeck_common::events::Notification;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    /// # Arguments
    ///
    /// * `capacity` - Notifications buffered per listener before it lags
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Broadcast, ignoring the case of no listeners
    pub fn send(&self, notification: Notification) {
        if let Ok(count) = self.tx.send(notification) {
            debug!(listeners = count, "Notification broadcast");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Notifications as a stream; lagged gaps are logged and skipped
    pub fn stream(&self) -> impl Stream<Item = Notification> + Send + 'static {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|result| async move {
            match result {
                Ok(notification) => Some(notification),
                Err(err) => {
                    warn!(error = %err, "Notification listener lagged");
                    None
                }
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_without_listeners_is_ok() {
        let notifier = Notifier::new(4);
        notifier.send(Notification::controls_change(true));
        assert_eq!(notifier.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_stream_yields_notifications() {
        let notifier = Notifier::new(4);
        let stream = notifier.stream();
        tokio::pin!(stream);

        notifier.send(Notification::controls_change(true));
        let received = stream.next().await.unwrap();
        assert_eq!(received.event_name(), "controls-change");
    }

    #[tokio::test]
    async fn test_lagged_listener_skips_gap() {
        let notifier = Notifier::new(1);
        let stream = notifier.stream();
        tokio::pin!(stream);

        notifier.send(Notification::controls_change(true));
        notifier.send(Notification::controls_change(false));
        match stream.next().await.unwrap() {
            Notification::ControlsChange { visible, .. } => assert!(!visible),
            other => panic!("Unexpected notification {:?}", other),
        }
    }
}
