//! # Subsystem State Service
//!
//! The mutable, observable container of subsystem configuration.
//!
//! ## Locking
//!
//! One re-entrant *mutation guard* covers properties, capabilities and
//! activation. It is held from the start of a mutation until its observers
//! have returned, so events are delivered in the order the mutations were
//! applied. Each entity also has its own data lock, held only while the value
//! is read or swapped.
//!
//! Observers may therefore read the state from inside a callback, and may
//! call any mutator again on the same thread. Mutations of different entities
//! serialize on the shared guard, so an observer reacting to one entity by
//! mutating another cannot deadlock against a mirror-image observer on
//! another thread. An observer that blocks waiting on another thread that
//! itself mutates the state will deadlock; observers are expected to be quick.
//!
//! Snapshots are `Arc`s over copy-on-write collections: a snapshot taken
//! before a mutation keeps its old contents.

use crate::domain::{Activation, Capability, ChangeEvent, ChangeKind, StateError};
use crate::ports::inbound::{
    CapabilitiesView, PropertiesView, PropertyMap, StateConfigurationApi, StateQueryApi,
};
use crate::ports::outbound::{
    LifecycleError, ManagedService, RegistryError, ServiceName, ServiceRegistry, StartupMode,
};
use async_trait::async_trait;
use parking_lot::{ReentrantMutex, RwLock};
use serde_json::Value;
use shared_bus::{
    BroadcastBridge, EventFilter, EventStream, Observer, ObserverId, ObserverRegistry,
    Subscription,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Snapshot of the state's delivery counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationStats {
    /// Notification passes started, one per emitted event.
    pub notifications: u64,
    /// Events forwarded to the async bridge.
    pub events_published: u64,
    /// Live async subscriptions.
    pub async_subscribers: usize,
    /// Bridge buffer size before slow subscribers lag.
    pub channel_capacity: usize,
}

/// Runtime configuration of the managed subsystem.
pub struct SubsystemState {
    /// Held across mutate + notify for every entity.
    mutation_guard: ReentrantMutex<()>,

    properties: RwLock<PropertiesView>,
    capabilities: RwLock<CapabilitiesView>,
    activation: RwLock<Activation>,

    /// Synchronous observers.
    observers: ObserverRegistry<ChangeEvent>,

    /// Fan-out to async subscribers.
    bridge: BroadcastBridge<ChangeEvent>,
}

impl SubsystemState {
    /// Create an empty state with the given activation policy.
    #[must_use]
    pub fn new(activation: Activation) -> Self {
        Self {
            mutation_guard: ReentrantMutex::new(()),
            properties: RwLock::new(Arc::new(PropertyMap::new())),
            capabilities: RwLock::new(Arc::new(Vec::new())),
            activation: RwLock::new(activation),
            observers: ObserverRegistry::new(),
            bridge: BroadcastBridge::new(),
        }
    }

    /// Build a state and register it under the well-known name with lazy
    /// startup.
    ///
    /// # Errors
    ///
    /// Whatever the registry reports; the state itself cannot fail here.
    pub fn create_and_register(
        registry: &dyn ServiceRegistry,
        activation: Activation,
    ) -> Result<Arc<Self>, RegistryError> {
        let state = Arc::new(Self::new(activation));
        let service: Arc<dyn ManagedService> = Arc::clone(&state) as Arc<dyn ManagedService>;
        registry.register(ServiceName::subsystem_state(), service, StartupMode::Lazy)?;

        info!(
            service = crate::SUBSYSTEM_STATE_SERVICE,
            activation = %activation,
            "Subsystem state registered"
        );
        Ok(state)
    }

    /// Resolve the registered state. `None` if it has not been registered.
    pub async fn lookup(registry: &dyn ServiceRegistry) -> Option<Arc<Self>> {
        let service = registry.lookup(&ServiceName::subsystem_state()).await?;
        service.as_any().downcast::<Self>().ok()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Snapshot of all properties, in insertion order.
    #[must_use]
    pub fn properties(&self) -> PropertiesView {
        Arc::clone(&*self.properties.read())
    }

    /// Snapshot of all capabilities, in insertion order.
    #[must_use]
    pub fn capabilities(&self) -> CapabilitiesView {
        Arc::clone(&*self.capabilities.read())
    }

    /// Current activation policy.
    #[must_use]
    pub fn activation_policy(&self) -> Activation {
        *self.activation.read()
    }

    // -------------------------------------------------------------------------
    // Notification
    // -------------------------------------------------------------------------

    /// Register a synchronous observer.
    pub fn subscribe(&self, observer: Arc<dyn Observer<ChangeEvent>>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Remove an observer.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Number of synchronous observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.observer_count()
    }

    /// Async subscription to change events of the given kinds.
    #[must_use]
    pub fn changes(&self, filter: EventFilter<ChangeKind>) -> Subscription<ChangeEvent> {
        self.bridge.subscribe(filter)
    }

    /// Change events of the given kinds as a `Stream`.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter<ChangeKind>) -> EventStream<ChangeEvent> {
        self.bridge.event_stream(filter)
    }

    /// Delivery counters for the synchronous observers and the async bridge.
    #[must_use]
    pub fn notification_stats(&self) -> NotificationStats {
        NotificationStats {
            notifications: self.observers.notifications(),
            events_published: self.bridge.events_published(),
            async_subscribers: self.bridge.subscriber_count(),
            channel_capacity: self.bridge.capacity(),
        }
    }

    /// Deliver `event` to async subscribers, then to every observer in
    /// registration order. Stops at the first failing observer.
    ///
    /// Callers must hold the mutation guard.
    pub(crate) fn notify_observers(&self, event: ChangeEvent) -> Result<(), StateError> {
        self.bridge.on_event(&event)?;
        let delivered = self.observers.notify(&event)?;
        debug!(event = %event, observers = delivered, "Change notified");
        Ok(())
    }
}

impl Default for SubsystemState {
    fn default() -> Self {
        Self::new(crate::DEFAULT_ACTIVATION)
    }
}

impl fmt::Debug for SubsystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubsystemState")
            .field("properties", &self.properties().len())
            .field("capabilities", &self.capabilities().len())
            .field("activation", &self.activation_policy())
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl StateQueryApi for SubsystemState {
    fn properties(&self) -> PropertiesView {
        Self::properties(self)
    }

    fn capabilities(&self) -> CapabilitiesView {
        Self::capabilities(self)
    }

    fn activation_policy(&self) -> Activation {
        Self::activation_policy(self)
    }

    fn subscribe(&self, observer: Arc<dyn Observer<ChangeEvent>>) -> ObserverId {
        Self::subscribe(self, observer)
    }

    fn unsubscribe(&self, id: ObserverId) -> bool {
        Self::unsubscribe(self, id)
    }

    fn changes(&self, filter: EventFilter<ChangeKind>) -> Subscription<ChangeEvent> {
        Self::changes(self, filter)
    }
}

impl StateConfigurationApi for SubsystemState {
    fn set_property(&self, name: &str, value: Option<Value>) -> Result<Option<Value>, StateError> {
        let value = value.filter(|v| !v.is_null());
        let removed = value.is_none();

        let _guard = self.mutation_guard.lock();
        let previous = {
            let mut properties = self.properties.write();
            let map = Arc::make_mut(&mut *properties);
            match value {
                Some(value) => map.insert(name.to_string(), value),
                None => map.shift_remove(name),
            }
        };
        debug!(property = name, removed, "Property updated");

        // Fires even when nothing changed.
        self.notify_observers(ChangeEvent::property(name, removed))?;
        Ok(previous)
    }

    fn add_capability(&self, capability: Capability) -> Result<(), StateError> {
        let _guard = self.mutation_guard.lock();
        let identifier = capability.identifier().to_string();
        Arc::make_mut(&mut *self.capabilities.write()).push(capability);
        debug!(capability = %identifier, "Capability added");

        self.notify_observers(ChangeEvent::capability(identifier, false))
    }

    fn remove_capability(&self, id: &str) -> Result<Option<Capability>, StateError> {
        let _guard = self.mutation_guard.lock();
        let removed = {
            let mut capabilities = self.capabilities.write();
            let position = capabilities.iter().position(|c| c.identifier() == id);
            position.map(|pos| Arc::make_mut(&mut *capabilities).remove(pos))
        };

        let Some(capability) = removed else {
            debug!(capability = id, "No capability to remove");
            return Ok(None);
        };
        debug!(capability = id, "Capability removed");

        self.notify_observers(ChangeEvent::capability(id, true))?;
        Ok(Some(capability))
    }

    fn set_activation(&self, policy: Activation) -> Result<bool, StateError> {
        let _guard = self.mutation_guard.lock();
        if *self.activation.read() == policy {
            return Ok(false);
        }
        *self.activation.write() = policy;
        debug!(activation = %policy, "Activation policy changed");

        self.notify_observers(ChangeEvent::activation(policy))?;
        Ok(true)
    }
}

#[async_trait]
impl ManagedService for SubsystemState {
    async fn start(&self) -> Result<(), LifecycleError> {
        debug!("Subsystem state started");
        Ok(())
    }

    /// Leaves properties, capabilities and observers in place.
    async fn stop(&self) {
        debug!("Subsystem state stopped");
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
