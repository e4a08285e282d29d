//! Event bus for fetchcache using tokio::broadcast
//!
//! Consumers subscribe to re-render when orchestrator state changes.

use crate::metrics::PerformanceMetrics;
use crate::state::LoadingState;
use tokio::sync::broadcast;

/// Events emitted by the orchestrator
#[derive(Debug, Clone)]
pub enum FetchEvent {
    /// Loading state was replaced
    StateChanged(LoadingState),
    /// New data is available
    DataUpdated { len: usize, from_cache: bool },
    /// A new metrics snapshot was computed
    MetricsUpdated(PerformanceMetrics),
    /// An error was surfaced into state
    Error(String),
    /// A create/update/delete succeeded and the cache was invalidated
    DataMutated,
    /// The periodic sweep removed expired entries
    CacheCleaned { removed: usize },
}

/// Event bus for broadcasting orchestrator events
pub struct EventBus {
    sender: broadcast::Sender<FetchEvent>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create with default capacity (256 events)
    pub fn default_capacity() -> Self {
        Self::new(256)
    }

    pub fn publish(&self, event: FetchEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FetchEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::default_capacity()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::default_capacity();
        let mut rx = bus.subscribe();

        bus.publish(FetchEvent::DataMutated);
        bus.publish(FetchEvent::DataUpdated {
            len: 3,
            from_cache: true,
        });

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(event1, FetchEvent::DataMutated));

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(
            event2,
            FetchEvent::DataUpdated {
                len: 3,
                from_cache: true
            }
        ));
    }

    #[test]
    fn test_event_bus_no_subscribers_ok() {
        let bus = EventBus::default_capacity();
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(FetchEvent::CacheCleaned { removed: 1 });
    }
}
