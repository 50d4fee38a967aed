//! Event bus for listing activity and user-facing notices
//!
//! The EventBus replaces module-level callback registries: whoever needs to
//! publish or listen is handed the bus explicitly. It uses
//! `tokio::sync::broadcast` to decouple listing engines (and API handlers)
//! from whatever renders their activity.
//!
//! # Architecture
//!
//! ```text
//! ListingEngine ──┐
//!                 ├──▶ EventBus::publish() ──▶ broadcast channel ──▶ Subscription (view A)
//! API handlers ───┘                                              ──▶ Subscription (view B)
//! ```
//!
//! A [`Subscription`] is a scoped guard: it is acquired when a view mounts
//! and releases its slot on the bus when dropped.
//!
//! # Usage
//!
//! ```rust,ignore
//! let bus = EventBus::new(256);
//! let mut subscription = bus.subscribe();
//!
//! bus.publish(AppEvent::Notice(Notice::success("Job posted")));
//!
//! if let Some(envelope) = subscription.recv().await {
//!     println!("Received: {:?}", envelope.event);
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use uuid::Uuid;

/// Events emitted by listing engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ListingEvent {
    /// A `load` committed its first page
    Loaded {
        listing: String,
        generation: u64,
        count: usize,
        strategy: String,
    },
    /// A `load_more` appended items
    PageAppended {
        listing: String,
        generation: u64,
        appended: usize,
        exhausted: bool,
    },
    /// A fetch failed
    Failed {
        listing: String,
        operation: String,
        message: String,
    },
    /// A late result was dropped because a newer generation exists
    Discarded {
        listing: String,
        operation: String,
        generation: u64,
    },
    /// The session was closed by its view
    Closed { listing: String },
}

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
    Warning,
}

/// A short message meant for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// Top-level event carried by the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppEvent {
    Listing(ListingEvent),
    Notice(Notice),
}

impl AppEvent {
    pub fn event_kind(&self) -> &str {
        match self {
            AppEvent::Listing(_) => "listing",
            AppEvent::Notice(_) => "notice",
        }
    }

    /// Name of the listing this event relates to, if any
    pub fn listing(&self) -> Option<&str> {
        match self {
            AppEvent::Listing(e) => match e {
                ListingEvent::Loaded { listing, .. }
                | ListingEvent::PageAppended { listing, .. }
                | ListingEvent::Failed { listing, .. }
                | ListingEvent::Discarded { listing, .. }
                | ListingEvent::Closed { listing } => Some(listing),
            },
            AppEvent::Notice(_) => None,
        }
    }
}

/// Envelope wrapping an event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: AppEvent,
}

impl EventEnvelope {
    pub fn new(event: AppEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// The bus is cheap to clone (Arc internally) and can be shared across threads.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// The capacity determines how many events can be buffered before
    /// slow subscribers start losing events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Non-blocking. Without subscribers the event is dropped. Returns the
    /// number of subscribers that will receive it.
    pub fn publish(&self, event: AppEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        // send() only errs when nobody listens
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Get the current number of live subscriptions
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// A live subscription to an [`EventBus`]
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<EventEnvelope>,
}

impl Subscription {
    /// Wait for the next event
    ///
    /// Events missed because the subscriber lagged are skipped. Returns
    /// `None` once every bus handle is gone.
    pub async fn recv(&mut self) -> Option<EventEnvelope> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next already-published event without waiting
    pub fn try_recv(&mut self) -> Option<EventEnvelope> {
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) => return Some(envelope),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_event_serialization() {
        let event = AppEvent::Listing(ListingEvent::Loaded {
            listing: "jobs".to_string(),
            generation: 2,
            count: 10,
            strategy: "server_query".to_string(),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "listing");
        assert_eq!(json["action"], "loaded");
        assert_eq!(json["listing"], "jobs");
    }

    #[test]
    fn test_app_event_listing_name() {
        let event = AppEvent::Listing(ListingEvent::Closed {
            listing: "workers".to_string(),
        });
        assert_eq!(event.listing(), Some("workers"));
        assert_eq!(event.event_kind(), "listing");

        let notice = AppEvent::Notice(Notice::error("Could not load jobs"));
        assert_eq!(notice.listing(), None);
        assert_eq!(notice.event_kind(), "notice");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(AppEvent::Notice(Notice::success("ok"))), 0);
    }

    #[test]
    fn test_subscription_drop_releases_slot() {
        let bus = EventBus::new(16);
        let first = bus.subscribe();
        let second = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        drop(first);
        assert_eq!(bus.receiver_count(), 1);
        drop(second);
        assert_eq!(bus.receiver_count(), 0);
    }

    #[test]
    fn test_try_recv_returns_published_events_in_order() {
        let bus = EventBus::new(16);
        let mut subscription = bus.subscribe();
        bus.publish(AppEvent::Notice(Notice::success("one")));
        bus.publish(AppEvent::Notice(Notice::success("two")));

        let messages: Vec<String> = std::iter::from_fn(|| subscription.try_recv())
            .filter_map(|env| match env.event {
                AppEvent::Notice(n) => Some(n.message),
                _ => None,
            })
            .collect();
        assert_eq!(messages, vec!["one", "two"]);
    }

    #[test]
    fn test_recv_waits_for_event() {
        let bus = EventBus::new(16);
        let mut subscription = bus.subscribe();
        bus.publish(AppEvent::Notice(Notice::success("posted")));

        let envelope = tokio_test::block_on(subscription.recv()).expect("event should arrive");
        assert!(!envelope.id.is_nil());
        assert!(envelope.timestamp <= Utc::now());
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_bus_dropped() {
        let bus = EventBus::new(4);
        let mut subscription = bus.subscribe();
        drop(bus);
        assert!(subscription.recv().await.is_none());
    }
}
