//! # Bus Events
//!
//! Topic-based filtering shared by every event type carried on the bus.

use std::fmt::Debug;

/// An event that can travel over the bus.
///
/// The topic is what async subscribers filter on.
pub trait BusEvent: Clone + Debug + Send + Sync + 'static {
    /// Topic type used by [`EventFilter`].
    type Topic: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// The topic this event belongs to.
    fn topic(&self) -> Self::Topic;
}

/// Filter for subscribing to specific topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter<T> {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<T>,
}

impl<T> Default for EventFilter<T> {
    fn default() -> Self {
        Self { topics: Vec::new() }
    }
}

impl<T: PartialEq> EventFilter<T> {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<T>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches<E>(&self, event: &E) -> bool
    where
        E: BusEvent<Topic = T>,
    {
        self.topics.is_empty() || self.topics.contains(&event.topic())
    }
}
