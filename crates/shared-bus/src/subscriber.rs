//! # Event Subscriber
//!
//! Async receiving side of the broadcast bridge.

use crate::events::{BusEvent, EventFilter};
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bridge was dropped.
    #[error("Event bus closed")]
    Closed,
}

/// A subscription handle for receiving events.
///
/// Dropping it releases the underlying receiver.
pub struct Subscription<E: BusEvent> {
    /// The broadcast receiver.
    receiver: broadcast::Receiver<E>,

    /// Filter for this subscription.
    filter: EventFilter<E::Topic>,
}

impl<E: BusEvent> Subscription<E> {
    pub(crate) fn new(receiver: broadcast::Receiver<E>, filter: EventFilter<E::Topic>) -> Self {
        Self { receiver, filter }
    }

    /// Receive the next event that matches the filter.
    ///
    /// Returns `None` once the bridge is dropped.
    pub async fn recv(&mut self) -> Option<E> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(lagged = count, "Subscriber lagged, some events dropped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Try to receive the next event without waiting.
    ///
    /// - `Ok(Some(event))` - a matching event was available
    /// - `Ok(None)` - nothing available right now
    /// - `Err(SubscriptionError::Closed)` - the bridge was dropped
    pub fn try_recv(&mut self) -> Result<Option<E>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter<E::Topic> {
        &self.filter
    }
}

/// A `tokio_stream::Stream` over a subscription.
pub struct EventStream<E: BusEvent> {
    inner: BroadcastStream<E>,
    filter: EventFilter<E::Topic>,
}

impl<E: BusEvent> EventStream<E> {
    /// Create a new event stream from a subscription.
    #[must_use]
    pub fn new(subscription: Subscription<E>) -> Self {
        Self {
            inner: BroadcastStream::new(subscription.receiver),
            filter: subscription.filter,
        }
    }

    /// Get the filter for this stream.
    #[must_use]
    pub fn event_filter(&self) -> &EventFilter<E::Topic> {
        &self.filter
    }
}

// No field is structurally pinned; `BroadcastStream` boxes its future.
impl<E: BusEvent> Unpin for EventStream<E> {}

impl<E: BusEvent> Stream for EventStream<E> {
    type Item = E;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if self.filter.matches(&event) {
                        return Poll::Ready(Some(event));
                    }
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    debug!(lagged = count, "Stream lagged, some events dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::test_support::{Channel, Ping};
    use crate::observer::Observer;
    use crate::publisher::BroadcastBridge;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_subscription_recv() {
        let bridge = BroadcastBridge::<Ping>::new();
        let mut sub = bridge.subscribe(EventFilter::all());

        bridge.on_event(&Ping::red(1)).unwrap();

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");
        assert_eq!(received, Ping::red(1));
    }

    #[tokio::test]
    async fn test_subscription_filter() {
        let bridge = BroadcastBridge::<Ping>::new();
        let mut sub = bridge.subscribe(EventFilter::topics(vec![Channel::Blue]));

        bridge.on_event(&Ping::red(1)).unwrap();
        bridge.on_event(&Ping::blue(2)).unwrap();

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");
        assert_eq!(received, Ping::blue(2));
    }

    #[test]
    fn test_subscription_drop_cleanup() {
        let bridge = BroadcastBridge::<Ping>::new();
        {
            let _sub1 = bridge.subscribe(EventFilter::all());
            let _sub2 = bridge.subscribe(EventFilter::all());
            assert_eq!(bridge.subscriber_count(), 2);
        }
        assert_eq!(bridge.subscriber_count(), 0);
    }

    #[test]
    fn test_try_recv_empty() {
        let bridge = BroadcastBridge::<Ping>::new();
        let mut sub = bridge.subscribe(EventFilter::all());
        assert_eq!(sub.try_recv(), Ok(None));
    }

    #[test]
    fn test_try_recv_closed() {
        let bridge = BroadcastBridge::<Ping>::new();
        let mut sub = bridge.subscribe(EventFilter::all());
        drop(bridge);
        assert_eq!(sub.try_recv(), Err(SubscriptionError::Closed));
    }

    #[test]
    fn test_try_recv_lagged_keeps_newest() {
        let bridge = BroadcastBridge::<Ping>::with_capacity(2);
        let mut sub = bridge.subscribe(EventFilter::all());

        for seq in 0..5 {
            bridge.on_event(&Ping::red(seq)).unwrap();
        }

        assert_eq!(sub.try_recv(), Ok(Some(Ping::red(3))));
        assert_eq!(sub.try_recv(), Ok(Some(Ping::red(4))));
        assert_eq!(sub.try_recv(), Ok(None));
    }

    #[tokio::test]
    async fn test_event_stream_yields_matching_events() {
        let bridge = BroadcastBridge::<Ping>::new();
        let mut stream = bridge.event_stream(EventFilter::topics(vec![Channel::Red]));
        assert_eq!(stream.event_filter().topics, vec![Channel::Red]);

        bridge.on_event(&Ping::blue(1)).unwrap();
        bridge.on_event(&Ping::red(2)).unwrap();

        let next = timeout(Duration::from_millis(100), stream.next())
            .await
            .expect("timeout");
        assert_eq!(next, Some(Ping::red(2)));

        drop(bridge);
        assert_eq!(stream.next().await, None);
    }
}
