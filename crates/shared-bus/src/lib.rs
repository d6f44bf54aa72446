//! # Shared Bus - Change Notification for Subsystem Collaborators
//!
//! Two delivery paths share one event model:
//!
//! ```text
//!  mutator ──notify()──→ ObserverRegistry ──→ observer 1 ──→ observer 2 ──→ ...
//!                                         │      (synchronous, registration order)
//!                                         └──→ BroadcastBridge ──→ Subscription / EventStream
//!                                                                  (async, lossy on lag)
//! ```
//!
//! ## Delivery Rules
//!
//! - Observers run on the notifying thread, in the order they subscribed.
//! - The first observer that returns an error ends the pass; the error goes
//!   back to whoever called `notify`.
//! - The observer list is copied before delivery, so subscribe/unsubscribe
//!   never wait for a running pass.
//! - The broadcast bridge is an ordinary observer. Async subscribers that fall
//!   behind lose events; nothing is queued or retried on their behalf.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod observer;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{BusEvent, EventFilter};
pub use observer::{observer_fn, Observer, ObserverError, ObserverId, ObserverRegistry};
pub use publisher::BroadcastBridge;
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per async subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
