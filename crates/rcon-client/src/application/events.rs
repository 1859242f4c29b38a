//! Subscriber registries for session events.
//!
//! Each registry fans an event out to any number of unbounded channels.
//! Subscribers that dropped their receiver are pruned on the next publish.

use tokio::sync::mpsc;

/// Multi-subscriber fan-out for one kind of event.
#[derive(Debug)]
pub struct EventRegistry<T> {
    subscribers: Vec<mpsc::UnboundedSender<T>>,
}

impl<T: Clone> EventRegistry<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Adds an existing sender as a subscriber.
    pub fn register(&mut self, subscriber: mpsc::UnboundedSender<T>) {
        self.subscribers.push(subscriber);
    }

    /// Creates a new subscription and returns its receiving end.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.register(tx);
        rx
    }

    /// Delivers `event` to every live subscriber and returns how many got it.
    pub fn publish(&mut self, event: T) -> usize {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
        self.subscribers.len()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<T: Clone> Default for EventRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        // Arrange
        let mut registry = EventRegistry::new();
        let mut a = registry.subscribe();
        let mut b = registry.subscribe();

        // Act
        let delivered = registry.publish("hello".to_string());

        // Assert
        assert_eq!(delivered, 2);
        assert_eq!(a.try_recv().unwrap(), "hello");
        assert_eq!(b.try_recv().unwrap(), "hello");
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        // Arrange
        let mut registry = EventRegistry::new();
        let kept = registry.subscribe();
        drop(registry.subscribe());

        // Act
        let delivered = registry.publish(1u32);

        // Assert
        assert_eq!(delivered, 1);
        assert_eq!(registry.len(), 1);
        drop(kept);
    }

    #[test]
    fn test_publish_without_subscribers_is_harmless() {
        let mut registry: EventRegistry<u8> = EventRegistry::default();

        assert_eq!(registry.publish(7), 0);
        assert!(registry.is_empty());
    }
}
