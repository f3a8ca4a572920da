use serde_json::Value;
use tokio::sync::broadcast;

/// Broadcast publisher for service lifecycle and operation events.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<LifecycleEvent>,
}

/// Event that has been published.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub name: String,
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event with the given name and context.
    pub fn publish(&self, event_name: impl Into<String>, context: Value) {
        let event = LifecycleEvent {
            name: event_name.into(),
            context,
            published_at: chrono::Utc::now(),
        };

        // A broadcast send only errors when there are no subscribers, which
        // is an acceptable steady state for lifecycle notifications.
        let _ = self.sender.send(event);
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}
