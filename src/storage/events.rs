//! Change notifications for the alert store.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every insert and
//! every removed document is published as a [`StoreEvent`], so UI layers can
//! react to alerts appearing and disappearing.

use tokio::sync::broadcast;

use crate::data::{DocId, Document};

/// A single change to the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Inserted { id: DocId, document: Document },
    Removed { id: DocId, document: Document },
}

impl StoreEvent {
    pub fn id(&self) -> &DocId {
        match self {
            StoreEvent::Inserted { id, .. } | StoreEvent::Removed { id, .. } => id,
        }
    }

    pub fn document(&self) -> &Document {
        match self {
            StoreEvent::Inserted { document, .. } | StoreEvent::Removed { document, .. } => {
                document
            }
        }
    }
}

/// Broadcast bus for [`StoreEvent`]s.
///
/// When the ring buffer is full, the oldest events are dropped for lagging
/// receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event, returning how many receivers got it.
    /// Without receivers the event is silently dropped.
    pub fn publish(&self, event: StoreEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inserted() -> StoreEvent {
        StoreEvent::Inserted {
            id: DocId::from("abc"),
            document: Document::new().with("type", "info"),
        }
    }

    #[test]
    fn test_publish_without_receivers_returns_zero() {
        let bus = EventBus::new(8);
        assert_eq!(bus.publish(inserted()), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        assert_eq!(bus.publish(inserted()), 1);

        let Ok(event) = rx.recv().await else {
            panic!("expected to receive event");
        };
        assert_eq!(event.id().as_str(), "abc");
        assert_eq!(event.document().get("type").and_then(|v| v.as_str()), Some("info"));
    }

    #[test]
    fn test_receiver_count_tracks_subscribers() {
        let bus = EventBus::new(8);
        assert_eq!(bus.receiver_count(), 0);

        let rx = bus.subscribe();
        assert_eq!(bus.receiver_count(), 1);

        drop(rx);
        assert_eq!(bus.receiver_count(), 0);
    }

    #[test]
    fn test_lagging_subscriber_loses_oldest_events() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();

        for name in ["a", "b", "c"] {
            bus.publish(StoreEvent::Removed {
                id: DocId::from(name),
                document: Document::new(),
            });
        }

        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(1))
        ));
        assert_eq!(rx.try_recv().unwrap().id().as_str(), "b");
        assert_eq!(rx.try_recv().unwrap().id().as_str(), "c");
        assert!(matches!(rx.try_recv(), Err(broadcast::error::TryRecvError::Empty)));
    }
}
