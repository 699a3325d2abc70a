//! Sync event notifications.
//!
//! Consumers that want more than the latest state (for example a log view,
//! or a UI that flashes on failure) can subscribe to [`SyncEvent`]s. Events
//! are best effort: a lagging receiver loses the oldest ones, and sending
//! with no receivers is not an error.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::resource::Resource;

/// Events emitted by a [`SyncClient`](crate::SyncClient).
///
/// All events are serializable for logging and IPC.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SyncEvent {
    /// A consumer became active.
    Activated,
    /// The consumer went away; in-flight responses will be discarded.
    Deactivated,
    /// The full-refresh `loading` flag changed.
    LoadingChanged { loading: bool },
    /// A resource was replaced with fresh data.
    Updated { resource: Resource },
    /// A fetch failed; the previous value is kept.
    FetchFailed { resource: Resource, reason: String },
    /// A response arrived after a newer one and was dropped.
    Superseded { resource: Resource },
    /// A response arrived after deactivation and was dropped.
    Suppressed { resource: Resource },
    /// A full refresh failed as a whole.
    BatchFailed { message: String },
    /// Periodic polling started.
    PollingStarted {
        #[serde(with = "duration_millis")]
        interval: Duration,
    },
    /// Periodic polling stopped.
    PollingStopped,
    /// A poll tick fired and issued its requests.
    PollTick { tick: u64 },
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Sender for sync events.
pub type EventSender = broadcast::Sender<SyncEvent>;

/// Receiver for sync events.
pub type EventReceiver = broadcast::Receiver<SyncEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    broadcast::channel(capacity)
}

/// Event dispatcher for sending events to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: SyncEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = SyncEvent::FetchFailed {
            resource: Resource::Stats,
            reason: "API error (500): boom".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"fetch_failed""#));
        assert!(json.contains(r#""resource":"stats""#));

        let json = serde_json::to_string(&SyncEvent::PollingStarted {
            interval: Duration::from_millis(5000),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"polling_started","interval":5000}"#);
    }

    #[test]
    fn test_send_without_receivers() {
        let dispatcher = EventDispatcher::default();
        assert_eq!(dispatcher.receiver_count(), 0);
        dispatcher.send(SyncEvent::Activated);
    }

    #[tokio::test]
    async fn test_dispatcher_fan_out() {
        let dispatcher = EventDispatcher::new(8);
        let mut a = dispatcher.subscribe();
        let mut b = dispatcher.subscribe();

        dispatcher.send(SyncEvent::LoadingChanged { loading: true });

        assert_eq!(a.recv().await.unwrap(), SyncEvent::LoadingChanged { loading: true });
        assert_eq!(b.recv().await.unwrap(), SyncEvent::LoadingChanged { loading: true });
    }
}
