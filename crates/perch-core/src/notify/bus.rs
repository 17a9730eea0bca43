//! Broadcast bus for distributing engine `Notification`s to handlers.
//!
//! Built on `tokio::sync::broadcast`, the bus supports any number of
//! subscribers. Publishing with no subscriber registered is a no-op.

use perch_types::notification::Notification;
use tokio::sync::broadcast;

/// Multi-consumer notification bus.
///
/// Cloning the bus clones the sender, so every clone publishes into the same
/// channel.
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    /// Create a bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a subscriber that will receive all future notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Publish to all current subscribers. Dropped silently when there are none.
    pub fn publish(&self, notification: Notification) {
        let _ = self.sender.send(notification);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Clone for NotificationBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}
