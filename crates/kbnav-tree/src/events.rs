//! Broadcast channel for tree events.

use tokio::sync::broadcast;
use tracing::trace;

use kbnav_core::events::{TreeEvent, TreeEventKind};

/// Fan-out of [`TreeEvent`]s to any number of subscribers.
///
/// Publishing never blocks and never fails: with no subscribers the event
/// is dropped, and slow subscribers observe `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TreeEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event.
    pub fn publish(&self, kind: TreeEventKind) {
        let event = TreeEvent::new(kind);
        let delivered = self.sender.send(event).unwrap_or(0);
        trace!(subscribers = delivered, "Tree event published");
    }

    /// Subscribes to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
