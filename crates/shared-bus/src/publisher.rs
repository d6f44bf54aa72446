//! # Broadcast Bridge
//!
//! Republishes synchronously observed events to async subscribers.

use crate::events::{BusEvent, EventFilter};
use crate::observer::{Observer, ObserverError};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// Observer that forwards every event into a `tokio::sync::broadcast` channel.
///
/// Register it with an [`ObserverRegistry`](crate::ObserverRegistry) like any
/// other observer. Forwarding never fails: with no receivers the event is
/// dropped, and receivers that lag lose the oldest events.
pub struct BroadcastBridge<E: BusEvent> {
    /// Broadcast sender for events.
    sender: broadcast::Sender<E>,

    /// Total events forwarded.
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl<E: BusEvent> BroadcastBridge<E> {
    /// Create a bridge with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bridge with specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero (a `tokio::sync::broadcast` requirement).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter<E::Topic>) -> Subscription<E> {
        debug!(topics = ?filter.topics, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Get a stream of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter<E::Topic>) -> EventStream<E> {
        EventStream::new(self.subscribe(filter))
    }

    /// Get the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the total number of events forwarded.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl<E: BusEvent> Default for BroadcastBridge<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> Observer<E> for BroadcastBridge<E> {
    fn on_event(&self, event: &E) -> Result<(), ObserverError> {
        // Always increment counter (forward was attempted)
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event.clone()) {
            Ok(receivers) => {
                debug!(topic = ?event.topic(), receivers, "Event forwarded");
            }
            Err(_) => {
                debug!(topic = ?event.topic(), "Event dropped (no receivers)");
            }
        }
        Ok(())
    }
}
