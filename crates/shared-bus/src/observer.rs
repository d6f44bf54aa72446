//! # Observer Registry
//!
//! Synchronous, ordered fan-out of events to registered callbacks.

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Error reported by an observer while handling an event.
///
/// The registry never swallows it: the delivery pass stops and the error is
/// handed back to the notifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Observer failed: {reason}")]
pub struct ObserverError {
    /// What went wrong, as reported by the observer.
    pub reason: String,
}

impl ObserverError {
    /// Create an observer error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A callback interested in events of type `E`.
///
/// Any `Fn(&E) -> Result<(), ObserverError>` closure is an observer.
pub trait Observer<E>: Send + Sync {
    /// Handle one event. Called on the notifying thread.
    fn on_event(&self, event: &E) -> Result<(), ObserverError>;
}

impl<E, F> Observer<E> for F
where
    F: Fn(&E) -> Result<(), ObserverError> + Send + Sync,
{
    fn on_event(&self, event: &E) -> Result<(), ObserverError> {
        self(event)
    }
}

/// Wrap a closure as a shareable observer.
///
/// ```
/// use shared_bus::{observer_fn, ObserverRegistry};
///
/// let registry = ObserverRegistry::<u32>::new();
/// registry.subscribe(observer_fn(|n: &u32| {
///     println!("got {n}");
///     Ok(())
/// }));
/// assert_eq!(registry.notify(&7), Ok(1));
/// ```
pub fn observer_fn<E, F>(f: F) -> Arc<dyn Observer<E>>
where
    E: 'static,
    F: Fn(&E) -> Result<(), ObserverError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Handle returned by [`ObserverRegistry::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

type Entry<E> = (ObserverId, Arc<dyn Observer<E>>);

/// Ordered list of observers with copy-on-iterate delivery.
pub struct ObserverRegistry<E: 'static> {
    /// Registered observers in subscription order.
    observers: RwLock<Vec<Entry<E>>>,

    /// Next observer id.
    next_id: AtomicU64,

    /// Total notification passes started.
    notifications: AtomicU64,
}

impl<E: 'static> ObserverRegistry<E> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            notifications: AtomicU64::new(0),
        }
    }

    /// Append an observer. It receives every event notified after this call.
    pub fn subscribe(&self, observer: Arc<dyn Observer<E>>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        debug!(observer = %id, "Observer subscribed");
        id
    }

    /// Remove an observer. Returns `false` if the id was not registered.
    ///
    /// A pass already in progress may still deliver to it.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let Some(pos) = observers.iter().position(|(oid, _)| *oid == id) else {
            return false;
        };
        observers.remove(pos);
        debug!(observer = %id, "Observer unsubscribed");
        true
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// Total notification passes started, including ones an observer aborted.
    #[must_use]
    pub fn notifications(&self) -> u64 {
        self.notifications.load(Ordering::Relaxed)
    }

    /// Deliver `event` to every observer in subscription order.
    ///
    /// Returns the number of observers that handled the event. Stops at the
    /// first observer error and returns it; later observers are not called.
    pub fn notify(&self, event: &E) -> Result<usize, ObserverError> {
        self.notifications.fetch_add(1, Ordering::Relaxed);

        // Copy so callbacks may subscribe or unsubscribe without deadlocking.
        let snapshot: Vec<Arc<dyn Observer<E>>> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in &snapshot {
            observer.on_event(event)?;
        }
        Ok(snapshot.len())
    }
}

impl<E: 'static> Default for ObserverRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> fmt::Debug for ObserverRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observer_count())
            .field("notifications", &self.notifications())
            .finish()
    }
}
